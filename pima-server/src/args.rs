// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use clap::Parser;

/// PIMA Hunter Pro alarm panel HTTP/MQTT adapter.
///
/// Every option is also readable from an environment variable of the same
/// name upper-cased with a `PIMA_` prefix, e.g. `--mqtt-host` /
/// `PIMA_MQTT_HOST`.
#[derive(Debug, Parser)]
#[command(name = "pima-server")]
pub struct Args {
    /// TLS certificate chain (PEM). Requires `ssl_key`.
    #[arg(long, env = "PIMA_SSL_CERT")]
    pub ssl_cert: Option<PathBuf>,

    /// TLS private key (PEM). Requires `ssl_cert`.
    #[arg(long, env = "PIMA_SSL_KEY")]
    pub ssl_key: Option<PathBuf>,

    /// HTTP listen port.
    #[arg(long, env = "PIMA_PORT")]
    pub port: u16,

    /// Shared secret HTTP/MQTT callers must present.
    #[arg(long, env = "PIMA_KEY")]
    pub key: String,

    /// 4-6 digit panel login code.
    #[arg(long, env = "PIMA_LOGIN")]
    pub login: String,

    /// Panel zone capacity: 32, 96, or 144.
    #[arg(long, env = "PIMA_ZONES", default_value_t = 32)]
    pub zones: u32,

    /// Serial device path, e.g. `/dev/ttyUSB0`.
    #[arg(long, env = "PIMA_SERIALPORT")]
    pub serialport: Option<String>,

    /// Panel TCP hostname; set together with `pima_port` to use TCP instead
    /// of serial.
    #[arg(long, env = "PIMA_PIMA_HOST")]
    pub pima_host: Option<String>,

    /// Panel TCP port.
    #[arg(long, env = "PIMA_PIMA_PORT")]
    pub pima_port: Option<u16>,

    /// MQTT broker hostname. Omit to run without MQTT.
    #[arg(long, env = "PIMA_MQTT_HOST")]
    pub mqtt_host: Option<String>,

    /// MQTT broker port.
    #[arg(long, env = "PIMA_MQTT_PORT", default_value_t = 1883)]
    pub mqtt_port: u16,

    /// MQTT client id.
    #[arg(long, env = "PIMA_MQTT_CLIENT_ID", default_value = "pima_alarm")]
    pub mqtt_client_id: String,

    /// MQTT credentials as `user:password`.
    #[arg(long, env = "PIMA_MQTT_USER")]
    pub mqtt_user: Option<String>,

    /// Base MQTT topic.
    #[arg(long, env = "PIMA_MQTT_TOPIC", default_value = "pima_alarm")]
    pub mqtt_topic: String,

    /// Home Assistant MQTT discovery prefix.
    #[arg(long, env = "PIMA_MQTT_DISCOVERY_PREFIX", default_value = "homeassistant")]
    pub mqtt_discovery_prefix: String,

    /// Highest zone number to register Home Assistant discovery entities
    /// for.
    #[arg(long, env = "PIMA_MQTT_DISCOVERY_MAX_ZONE", default_value_t = 8)]
    pub mqtt_discovery_max_zone: u32,

    /// Tracing filter directive, e.g. `info` or `pima_supervisor=debug`.
    #[arg(long, env = "PIMA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Parses `user:password` out of `--mqtt_user`.
    pub fn mqtt_credentials(&self) -> Option<(String, String)> {
        let raw = self.mqtt_user.as_ref()?;
        let (user, password) = raw.split_once(':')?;
        Some((user.to_owned(), password.to_owned()))
    }
}

/// 4-6 ASCII digits, matching the panel's login code format.
pub fn is_valid_login(code: &str) -> bool {
    (4..=6).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_four_to_six_digits() {
        assert!(is_valid_login("1234"));
        assert!(is_valid_login("123456"));
        assert!(!is_valid_login("123"));
        assert!(!is_valid_login("1234567"));
        assert!(!is_valid_login("12a4"));
    }

    #[test]
    fn splits_mqtt_user_on_colon() {
        let mut args = sample_args();
        args.mqtt_user = Some("alice:secret".to_owned());
        assert_eq!(args.mqtt_credentials(), Some(("alice".to_owned(), "secret".to_owned())));
    }

    #[test]
    fn missing_mqtt_user_has_no_credentials() {
        assert_eq!(sample_args().mqtt_credentials(), None);
    }

    fn sample_args() -> Args {
        Args {
            ssl_cert: None,
            ssl_key: None,
            port: 8080,
            key: "secret".to_owned(),
            login: "1234".to_owned(),
            zones: 32,
            serialport: None,
            pima_host: None,
            pima_port: None,
            mqtt_host: None,
            mqtt_port: 1883,
            mqtt_client_id: "pima_alarm".to_owned(),
            mqtt_user: None,
            mqtt_topic: "pima_alarm".to_owned(),
            mqtt_discovery_prefix: "homeassistant".to_owned(),
            mqtt_discovery_max_zone: 8,
            log_level: "info".to_owned(),
        }
    }
}
