// SPDX-License-Identifier: Apache-2.0

use pima_transport::TransportConfig;

use crate::args::Args;

/// Picks the panel link the way `AlarmServer.__init__` does in the original
/// bridge: TCP if both `pima_host`/`pima_port` are set, else the configured
/// serial path, else the first entry under `/dev/serial/by-path`, else a
/// fatal error.
pub fn select(args: &Args) -> anyhow::Result<TransportConfig> {
    if let (Some(host), Some(port)) = (&args.pima_host, args.pima_port) {
        return Ok(TransportConfig::Tcp { host: host.clone(), port });
    }
    if let Some(path) = &args.serialport {
        return Ok(TransportConfig::Serial { path: path.clone() });
    }
    if let Some(path) = first_serial_by_path()? {
        return Ok(TransportConfig::Serial { path });
    }
    anyhow::bail!("no panel link configured: set pima_host+pima_port, serialport, or plug in a USB serial adapter")
}

fn first_serial_by_path() -> anyhow::Result<Option<String>> {
    let dir = std::path::Path::new("/dev/serial/by-path");
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(Result::ok).collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);
    Ok(entries.into_iter().next().map(|entry| entry.path().to_string_lossy().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
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

    #[test]
    fn prefers_tcp_when_host_and_port_set() {
        let mut args = base_args();
        args.pima_host = Some("panel.local".to_owned());
        args.pima_port = Some(3109);
        args.serialport = Some("/dev/ttyUSB0".to_owned());
        let config = select(&args).unwrap();
        assert_eq!(config, TransportConfig::Tcp { host: "panel.local".to_owned(), port: 3109 });
    }

    #[test]
    fn falls_back_to_serialport_when_no_tcp_host() {
        let mut args = base_args();
        args.serialport = Some("/dev/ttyUSB0".to_owned());
        let config = select(&args).unwrap();
        assert_eq!(config, TransportConfig::Serial { path: "/dev/ttyUSB0".to_owned() });
    }

    #[test]
    fn incomplete_tcp_config_falls_back_to_serialport() {
        let mut args = base_args();
        args.pima_host = Some("panel.local".to_owned());
        args.serialport = Some("/dev/ttyUSB0".to_owned());
        let config = select(&args).unwrap();
        assert_eq!(config, TransportConfig::Serial { path: "/dev/ttyUSB0".to_owned() });
    }
}
