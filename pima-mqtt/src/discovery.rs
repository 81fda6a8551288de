// SPDX-License-Identifier: Apache-2.0

//! Home Assistant MQTT discovery payloads.
//!
//! Reproduces `mqtt_publish_discovery()` from the original Python bridge:
//! one `alarm_control_panel` entity plus, for each zone up to
//! `min(discovery_max_zone, zones)`, an open-zone and an alarming-zone
//! `binary_sensor`.

use serde_json::{json, Value};

use crate::config::MqttConfig;

/// One discovery config topic/payload pair, ready to publish retained.
pub(crate) struct DiscoveryEntity {
    pub topic: String,
    pub payload: Value,
}

fn device_info(zones: u32) -> Value {
    json!({
        "identifiers": ["pima_alarm"],
        "manufacturer": "PIMA",
        "model": format!("Hunter Pro 8{zones}"),
        "name": "PIMA Alarm",
    })
}

/// Builds the `alarm_control_panel` entity plus one `binary_sensor` pair per
/// discovered zone.
pub(crate) fn entities(config: &MqttConfig, zones: u32) -> Vec<DiscoveryEntity> {
    let device = device_info(zones);
    let status_topic = config.status_topic();
    let command_topic = config.command_topic();
    let lwt_topic = config.lwt_topic();
    let prefix = &config.discovery_prefix;

    let mut entities = vec![DiscoveryEntity {
        topic: format!("{prefix}/alarm_control_panel/pima_alarm/config"),
        payload: json!({
            "name": "PIMA Alarm",
            "unique_id": "pima_alarm",
            "device": device,
            "state_topic": status_topic,
            "command_topic": command_topic,
            "availability_topic": lwt_topic,
            "code_arm_required": false,
            "code_disarm_required": false,
            "value_template":
                "{% if value_json.partitions['1'] == 'home1' %}armed_home\
                 {% elif value_json.partitions['1'] == 'full_arm' %}armed_away\
                 {% else %}disarmed{% endif %}",
            "payload_disarm": r#"{"mode": "disarm"}"#,
            "payload_arm_home": r#"{"mode": "home1"}"#,
            "payload_arm_away": r#"{"mode": "full_arm"}"#,
        }),
    }];

    let max_zone = config.discovery_max_zone.min(zones);
    for zone in 1..=max_zone {
        let zone_device = json!({
            "identifiers": device["identifiers"],
            "manufacturer": device["manufacturer"],
            "model": device["model"],
            "name": device["name"],
            "via_device": "pima_alarm",
        });
        entities.push(DiscoveryEntity {
            topic: format!("{prefix}/binary_sensor/open_zone_{zone}/pima_alarm/config"),
            payload: json!({
                "name": format!("Alarm Zone {zone} Open"),
                "unique_id": format!("pima_alarm_zone_{zone}_open"),
                "device": zone_device,
                "state_topic": status_topic,
                "availability_topic": lwt_topic,
                "payload_on": "on",
                "payload_off": "off",
                "value_template":
                    format!("{{% if {zone} in value_json.open_zones %}}on{{% else %}}off{{% endif %}}"),
            }),
        });
        entities.push(DiscoveryEntity {
            topic: format!("{prefix}/binary_sensor/alarmed_zone_{zone}/pima_alarm/config"),
            payload: json!({
                "name": format!("Alarm Zone {zone} Alarming"),
                "unique_id": format!("pima_alarm_zone_{zone}_alarming"),
                "device": zone_device,
                "state_topic": status_topic,
                "availability_topic": lwt_topic,
                "payload_on": "on",
                "payload_off": "off",
                "value_template":
                    format!("{{% if {zone} in value_json.alarmed_zones %}}on{{% else %}}off{{% endif %}}"),
            }),
        });
    }

    entities
}
