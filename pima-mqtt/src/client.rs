// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use pima_protocol::ArmMode;
use pima_supervisor::Supervisor;
use pima_transport::TransportOpener;
use rumqttc::{AsyncClient, Event, Incoming, LastWill, MqttOptions, QoS};
use serde::Deserialize;

use crate::config::MqttConfig;
use crate::discovery;
use crate::error::MqttBoundaryError;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Deserialize)]
struct ArmCommand {
    mode: String,
    #[serde(default = "default_partitions")]
    partitions: Vec<u8>,
}

fn default_partitions() -> Vec<u8> {
    vec![1]
}

/// Runs the MQTT boundary until the connection is unrecoverable.
///
/// Publishes `<topic>/status` on every change observed through
/// [`Supervisor::subscribe`], subscribes `<topic>/command` for arm
/// commands, maintains the `<topic>/LWT` availability flag, and
/// (re-)publishes Home Assistant discovery every time the broker
/// connection comes up — matching `mqtt_on_connect` in the original
/// bridge, which re-announces discovery on every reconnect rather than
/// assuming the broker retained it.
pub async fn run<O>(supervisor: Arc<Supervisor<O>>, zones: u32, config: MqttConfig) -> Result<(), MqttBoundaryError>
where
    O: TransportOpener + 'static,
{
    let mut options = MqttOptions::new(config.client_id.clone(), config.host.clone(), config.port);
    options.set_keep_alive(KEEP_ALIVE);
    if let Some((username, password)) = &config.credentials {
        options.set_credentials(username.clone(), password.clone());
    }
    options.set_last_will(LastWill::new(config.lwt_topic(), b"offline".to_vec(), QoS::AtLeastOnce, true));

    let (client, mut event_loop) = AsyncClient::new(options, EVENT_CHANNEL_CAPACITY);
    let mut status_rx = supervisor.subscribe();

    loop {
        tokio::select! {
            biased;

            changed = status_rx.changed() => {
                if changed.is_err() {
                    tracing::warn!("supervisor status channel closed, stopping MQTT bridge");
                    return Ok(());
                }
                let status = status_rx.borrow_and_update().clone();
                publish_status(&client, &config, &status).await;
            }

            event = event_loop.poll() => {
                match event {
                    Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                        tracing::info!(host = %config.host, port = config.port, "connected to MQTT broker");
                        on_connect(&client, &config, zones).await?;
                    }
                    Ok(Event::Incoming(Incoming::Publish(publish))) => {
                        handle_command(&client, &config, &supervisor, &publish.payload).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "MQTT event loop error, reconnecting");
                    }
                }
            }
        }
    }
}

async fn on_connect(client: &AsyncClient, config: &MqttConfig, zones: u32) -> Result<(), MqttBoundaryError> {
    for entity in discovery::entities(config, zones) {
        client.publish(entity.topic, QoS::AtLeastOnce, true, entity.payload.to_string()).await?;
    }
    client.publish(config.lwt_topic(), QoS::AtLeastOnce, true, b"online".to_vec()).await?;
    client.subscribe(config.command_topic(), QoS::AtLeastOnce).await?;
    Ok(())
}

async fn publish_status<T: serde::Serialize>(client: &AsyncClient, config: &MqttConfig, status: &T) {
    let Ok(payload) = serde_json::to_vec(status) else {
        tracing::warn!("failed to serialize status for MQTT publish");
        return;
    };
    if let Err(err) = client.publish(config.status_topic(), QoS::AtLeastOnce, false, payload).await {
        tracing::warn!(error = %err, "failed to publish status to MQTT");
    }
}

async fn handle_command<O>(client: &AsyncClient, config: &MqttConfig, supervisor: &Supervisor<O>, payload: &[u8])
where
    O: TransportOpener + 'static,
{
    let command: ArmCommand = match serde_json::from_slice(payload) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse MQTT arm command");
            return;
        }
    };
    let Some(mode) = ArmMode::from_label(&command.mode.to_lowercase()) else {
        tracing::warn!(mode = %command.mode, "invalid arm mode in MQTT command");
        return;
    };
    let partitions = command.partitions.into_iter().collect();
    match supervisor.arm(mode, &partitions).await {
        Ok(status) => publish_status(client, config, &status).await,
        Err(_unavailable) => tracing::warn!("panel link unavailable while handling MQTT arm command"),
    }
}
