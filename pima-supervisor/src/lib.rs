// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Long-running supervisor that keeps a PIMA panel session logged in,
//! polls its status once per second, and fans out changes to subscribers.
//!
//! [`Supervisor`] is the only place that decides between retrying a command,
//! tearing down and rebuilding the [`pima_transport::Transport`], or
//! signalling the caller that the process should restart cleanly — the
//! protocol engine below it never makes that call (§7 of the protocol
//! design: "the Supervisor is the sole place that decides between retry,
//! rebuild, and process interrupt").

mod config;
mod error;
mod supervisor;

pub use config::{SupervisorConfig, DEFAULT_POLL_INTERVAL};
pub use error::{StartError, Unavailable};
pub use supervisor::Supervisor;
