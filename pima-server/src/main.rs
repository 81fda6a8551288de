// SPDX-License-Identifier: Apache-2.0
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod args;
mod transport_select;

use std::sync::Arc;

use clap::Parser;
use pima_http::{HttpConfig, TlsConfig};
use pima_mqtt::MqttConfig;
use pima_protocol::ZoneCapacity;
use pima_supervisor::{Supervisor, SupervisorConfig};

use args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    if !args::is_valid_login(&args.login) {
        anyhow::bail!("login must be 4-6 digits, got {:?}", args.login);
    }
    let capacity = ZoneCapacity::from_zones(args.zones)
        .ok_or_else(|| anyhow::anyhow!("zones must be one of 32, 96, 144, got {}", args.zones))?;
    let transport = transport_select::select(&args)?;

    tracing::info!(transport = ?transport, zones = args.zones, "starting PIMA supervisor");

    let supervisor_config = SupervisorConfig::new(transport, capacity, args.login.clone());
    let supervisor = Supervisor::start(supervisor_config).await?;

    let poll_task = tokio::spawn(Supervisor::run_poll_loop(supervisor.clone()));

    let http_config = HttpConfig {
        port: args.port,
        api_key: args.key.clone(),
        tls: match (&args.ssl_cert, &args.ssl_key) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            (None, None) => None,
            _ => anyhow::bail!("ssl_cert and ssl_key must be set together"),
        },
    };
    let http_task = tokio::spawn(pima_http::serve(supervisor.clone(), http_config));

    let mqtt_task = match &args.mqtt_host {
        Some(host) => {
            let mqtt_config = MqttConfig {
                host: host.clone(),
                port: args.mqtt_port,
                client_id: args.mqtt_client_id.clone(),
                credentials: args.mqtt_credentials(),
                topic: args.mqtt_topic.clone(),
                discovery_prefix: args.mqtt_discovery_prefix.clone(),
                discovery_max_zone: args.mqtt_discovery_max_zone,
            };
            Some(tokio::spawn(pima_mqtt::run(supervisor.clone(), args.zones, mqtt_config)))
        }
        None => {
            tracing::info!("mqtt_host not set, running without MQTT");
            None
        }
    };

    tokio::select! {
        result = http_task => {
            result??;
        }
        result = poll_task => {
            result?;
        }
        result = async move {
            match mqtt_task {
                Some(task) => task.await,
                None => std::future::pending().await,
            }
        } => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    Ok(())
}
