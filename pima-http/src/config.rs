// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// SSL certificate and key paths for TLS termination.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the PEM-encoded certificate chain.
    pub cert_path: PathBuf,
    /// Path to the PEM-encoded private key.
    pub key_path: PathBuf,
}

/// Everything the HTTP boundary needs: which port to listen on, the shared
/// secret callers must present as the `api_key` query parameter, and
/// optional TLS termination.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Shared secret compared against the `api_key` query parameter.
    pub api_key: String,
    /// TLS termination, if configured.
    pub tls: Option<TlsConfig>,
}
