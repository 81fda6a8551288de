// SPDX-License-Identifier: Apache-2.0
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! JSON/HTTP boundary exposing the supervisor's panel status and arm
//! commands, per §6's wire shapes. Request routing lives in [`route`] and
//! is unit tested directly; [`server`] wires that routing into a real
//! `hyper` + `rustls` listener.

mod config;
mod error;
mod route;
mod server;

pub use config::{HttpConfig, TlsConfig};
pub use error::HttpError;
pub use server::serve;
