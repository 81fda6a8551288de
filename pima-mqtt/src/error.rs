// SPDX-License-Identifier: Apache-2.0

//! Error types for `pima-mqtt`.

use thiserror::Error;

/// Errors raised while running the MQTT boundary.
#[derive(Debug, Error)]
pub enum MqttBoundaryError {
    /// The MQTT client's event loop returned an unrecoverable error.
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ClientError),
}
