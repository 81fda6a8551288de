// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use pima_supervisor::Supervisor;
use pima_transport::TransportOpener;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

use crate::config::{HttpConfig, TlsConfig};
use crate::error::HttpError;
use crate::route::route;

/// Serves `GET /pima/status` and `POST /pima/arm` until the listener fails.
///
/// Each accepted connection is handled on its own `tokio::spawn`ed task, the
/// same shape as the teacher's `datadog-remote-config` test HTTP server:
/// bind once, `accept()` in a loop, hand each stream to
/// `hyper::server::conn::http1`. TLS termination, if configured, wraps the
/// accepted stream in a [`TlsAcceptor`] before hyper ever sees it.
pub async fn serve<O>(supervisor: Arc<Supervisor<O>>, config: HttpConfig) -> Result<(), HttpError>
where
    O: TransportOpener + 'static,
{
    let acceptor = match &config.tls {
        Some(tls) => Some(build_tls_acceptor(tls)?),
        None => None,
    };
    let api_key: Arc<str> = Arc::from(config.api_key.as_str());

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(HttpError::Bind)?;
    tracing::info!(port = config.port, tls = acceptor.is_some(), "http listening");

    loop {
        let (stream, peer) = listener.accept().await.map_err(HttpError::Accept)?;
        let supervisor = supervisor.clone();
        let api_key = api_key.clone();
        let acceptor = acceptor.clone();
        tokio::spawn(async move {
            tracing::debug!(%peer, "accepted http connection");
            let result = match acceptor {
                Some(acceptor) => serve_tls(acceptor, stream, supervisor, api_key).await,
                None => serve_plain(stream, supervisor, api_key).await,
            };
            if let Err(err) = result {
                tracing::warn!(%peer, error = %err, "http connection error");
            }
        });
    }
}

async fn serve_plain<O>(stream: TcpStream, supervisor: Arc<Supervisor<O>>, api_key: Arc<str>) -> Result<(), hyper::Error>
where
    O: TransportOpener + 'static,
{
    let service = service_fn(move |req: http::Request<Incoming>| {
        handle(req, supervisor.clone(), api_key.clone())
    });
    http1::Builder::new().serve_connection(TokioIo::new(stream), service).await
}

async fn serve_tls<O>(
    acceptor: TlsAcceptor,
    stream: TcpStream,
    supervisor: Arc<Supervisor<O>>,
    api_key: Arc<str>,
) -> Result<(), hyper::Error>
where
    O: TransportOpener + 'static,
{
    let tls_stream = match acceptor.accept(stream).await {
        Ok(tls_stream) => tls_stream,
        Err(err) => {
            tracing::warn!(error = %err, "tls handshake failed");
            return Ok(());
        }
    };
    let service = service_fn(move |req: http::Request<Incoming>| {
        handle(req, supervisor.clone(), api_key.clone())
    });
    http1::Builder::new().serve_connection(TokioIo::new(tls_stream), service).await
}

async fn handle<O>(
    req: http::Request<Incoming>,
    supervisor: Arc<Supervisor<O>>,
    api_key: Arc<str>,
) -> Result<http::Response<http_body_util::Full<Bytes>>, std::convert::Infallible>
where
    O: TransportOpener + 'static,
{
    let (parts, body) = req.into_parts();
    let query = parts.uri.query().unwrap_or("").to_owned();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };
    Ok(route(&parts.method, parts.uri.path(), &query, bytes, &supervisor, &api_key).await)
}

fn build_tls_acceptor(tls: &TlsConfig) -> Result<TlsAcceptor, HttpError> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let certs = load_certs(&tls.cert_path)?;
    let key = load_key(&tls.key_path)?;
    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, HttpError> {
    let file = File::open(path).map_err(HttpError::Io)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(HttpError::Io)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, HttpError> {
    let file = File::open(path).map_err(HttpError::Io)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(HttpError::Io)?
        .ok_or(HttpError::MissingKey)
}
