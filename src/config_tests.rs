use crate::config::Config;
use crate::domain::target::TargetSet;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(&|key| vars.get(key).cloned())
}

#[test]
fn test_config_defaults() {
    let config = load(&[]).unwrap();

    assert_eq!(config.speedtest.cache_ttl, Duration::ZERO);
    assert_eq!(config.speedtest.timeout, Duration::from_secs(90));
    assert_eq!(config.speedtest.targets, TargetSet::Auto);
    assert_eq!(config.speedtest.binary, PathBuf::from("speedtest"));
    assert_eq!(config.server.port, 9798);
    assert_eq!(config.server.listen_addr(), "0.0.0.0:9798");
}

#[test]
fn test_config_overrides() {
    let config = load(&[
        ("SPEEDTEST_CACHE_FOR", "300"),
        ("SPEEDTEST_TIMEOUT", "45"),
        ("SPEEDTEST_SERVER", "1234,5678"),
        ("SPEEDTEST_PORT", "9100"),
        ("SPEEDTEST_BIND_ADDRESS", "127.0.0.1"),
        ("SPEEDTEST_BINARY", "/opt/ookla/speedtest"),
    ])
    .unwrap();

    assert_eq!(config.speedtest.cache_ttl, Duration::from_secs(300));
    assert_eq!(config.speedtest.timeout, Duration::from_secs(45));
    assert_eq!(config.speedtest.targets, TargetSet::Servers(vec![1234, 5678]));
    assert_eq!(config.speedtest.binary, PathBuf::from("/opt/ookla/speedtest"));
    assert_eq!(config.server.listen_addr(), "127.0.0.1:9100");
}

#[test]
fn test_empty_server_list_is_auto() {
    let config = load(&[("SPEEDTEST_SERVER", "")]).unwrap();
    assert_eq!(config.speedtest.targets, TargetSet::Auto);
}

#[test]
fn test_invalid_values_are_rejected() {
    let err = load(&[("SPEEDTEST_CACHE_FOR", "soon")]).unwrap_err();
    assert!(format!("{:#}", err).contains("SPEEDTEST_CACHE_FOR"));

    let err = load(&[("SPEEDTEST_SERVER", "12,abc")]).unwrap_err();
    assert!(format!("{:#}", err).contains("abc"));

    let err = load(&[("SPEEDTEST_SERVER", "0")]).unwrap_err();
    assert!(format!("{:#}", err).contains("SPEEDTEST_SERVER"));

    let err = load(&[("SPEEDTEST_TIMEOUT", "0")]).unwrap_err();
    assert!(format!("{:#}", err).contains("SPEEDTEST_TIMEOUT"));

    assert!(load(&[("SPEEDTEST_PORT", "70000")]).is_err());
}
