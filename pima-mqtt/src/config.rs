// SPDX-License-Identifier: Apache-2.0

/// Everything the MQTT boundary needs to connect to a broker, publish
/// status/availability, and register Home Assistant discovery.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client id.
    pub client_id: String,
    /// Optional username/password credentials.
    pub credentials: Option<(String, String)>,
    /// Base topic; status is published to `<topic>/status`, commands are
    /// read from `<topic>/command`, and availability from `<topic>/LWT`.
    pub topic: String,
    /// Home Assistant MQTT discovery prefix.
    pub discovery_prefix: String,
    /// Highest zone number to register discovery entities for.
    pub discovery_max_zone: u32,
}

impl MqttConfig {
    /// Topic status updates are published to.
    pub fn status_topic(&self) -> String {
        format!("{}/status", self.topic)
    }

    /// Topic arm commands are read from.
    pub fn command_topic(&self) -> String {
        format!("{}/command", self.topic)
    }

    /// Topic the last-will-and-testament availability flag is published to.
    pub fn lwt_topic(&self) -> String {
        format!("{}/LWT", self.topic)
    }
}
