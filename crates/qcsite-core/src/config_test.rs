use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "QCSITE_ENV"));
}

#[test]
fn build_app_config_uses_defaults_for_empty_env() {
    let map = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults are valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:5000");
    assert_eq!(cfg.log_level, "info");
    assert!(cfg.locations_path.is_none());
    assert!(cfg.scraping_enabled);
    assert_eq!(cfg.scraping_interval_ms, 10_000);
    assert_eq!(cfg.scraping_delay_ms, 1_000);
    assert_eq!(cfg.provider, ProviderKind::Simulated);
    assert_eq!(cfg.provider_timeout_secs, 10);
    assert_eq!(cfg.provider_user_agent, "qcsite/0.1 (market-intelligence)");
    assert_eq!(cfg.provider_max_retries, 2);
    assert_eq!(cfg.provider_retry_backoff_base_secs, 1);
    assert!(cfg.simulation_seed.is_none());
    assert!(cfg.llm.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("QCSITE_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "QCSITE_BIND_ADDR"),
        "expected InvalidEnvVar(QCSITE_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn scraping_interval_override() {
    let mut map = HashMap::new();
    map.insert("QCSITE_SCRAPING_INTERVAL_MS", "2500");
    map.insert("QCSITE_SCRAPING_DELAY_MS", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.scraping_interval_ms, 2_500);
    assert_eq!(cfg.scraping_delay_ms, 0);
}

#[test]
fn negative_scraping_interval_is_rejected() {
    let mut map = HashMap::new();
    map.insert("QCSITE_SCRAPING_INTERVAL_MS", "-10");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "QCSITE_SCRAPING_INTERVAL_MS"),
        "expected InvalidEnvVar(QCSITE_SCRAPING_INTERVAL_MS), got: {result:?}"
    );
}

#[test]
fn negative_scraping_delay_is_rejected() {
    let mut map = HashMap::new();
    map.insert("QCSITE_SCRAPING_DELAY_MS", "-1");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "QCSITE_SCRAPING_DELAY_MS"),
        "expected InvalidEnvVar(QCSITE_SCRAPING_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn scraping_enabled_accepts_false() {
    let mut map = HashMap::new();
    map.insert("QCSITE_SCRAPING_ENABLED", "false");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.scraping_enabled);
}

#[test]
fn scraping_enabled_rejects_garbage() {
    let mut map = HashMap::new();
    map.insert("QCSITE_SCRAPING_ENABLED", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "QCSITE_SCRAPING_ENABLED"
    ));
}

#[test]
fn http_provider_requires_base_url() {
    let mut map = HashMap::new();
    map.insert("QCSITE_PROVIDER", "http");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "QCSITE_PROVIDER_BASE_URL"),
        "expected MissingEnvVar(QCSITE_PROVIDER_BASE_URL), got: {result:?}"
    );
}

#[test]
fn http_provider_with_base_url() {
    let mut map = HashMap::new();
    map.insert("QCSITE_PROVIDER", "http");
    map.insert("QCSITE_PROVIDER_BASE_URL", "http://metrics.internal:8080");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.provider,
        ProviderKind::Http {
            base_url: "http://metrics.internal:8080".to_string()
        }
    );
}

#[test]
fn unknown_provider_is_rejected() {
    let mut map = HashMap::new();
    map.insert("QCSITE_PROVIDER", "puppeteer");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "QCSITE_PROVIDER"
    ));
}

#[test]
fn zero_provider_timeout_is_rejected() {
    let mut map = HashMap::new();
    map.insert("QCSITE_PROVIDER_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "QCSITE_PROVIDER_TIMEOUT_SECS"
    ));
}

#[test]
fn simulation_seed_parses() {
    let mut map = HashMap::new();
    map.insert("QCSITE_SIMULATION_SEED", "42");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.simulation_seed, Some(42));
}

#[test]
fn llm_config_present_only_with_key() {
    let mut map = HashMap::new();
    map.insert("QCSITE_LLM_API_KEY", "sk-test");
    map.insert("QCSITE_LLM_MODEL", "gpt-4o-mini");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let llm = cfg.llm.expect("llm config");
    assert_eq!(llm.api_key, "sk-test");
    assert_eq!(llm.model, "gpt-4o-mini");
    assert_eq!(llm.url, "https://api.openai.com/v1/chat/completions");
}

#[test]
fn llm_api_key_is_redacted_in_debug() {
    let mut map = HashMap::new();
    map.insert("QCSITE_LLM_API_KEY", "sk-very-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("sk-very-secret"), "api key leaked: {debug}");
    assert!(debug.contains("[redacted]"));
}
