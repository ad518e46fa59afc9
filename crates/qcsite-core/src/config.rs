use crate::app_config::{AppConfig, Environment, LlmConfig, ProviderKind};
use crate::ConfigError;

const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("QCSITE_ENV", "development"))?;

    let bind_addr = or_default("QCSITE_BIND_ADDR", "0.0.0.0:5000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("QCSITE_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("QCSITE_LOG_LEVEL", "info");
    let locations_path = lookup("QCSITE_LOCATIONS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let scraping_enabled = parse_bool(
        "QCSITE_SCRAPING_ENABLED",
        &or_default("QCSITE_SCRAPING_ENABLED", "true"),
    )?;
    let scraping_interval_ms = parse_u64("QCSITE_SCRAPING_INTERVAL_MS", "10000")?;
    let scraping_delay_ms = parse_u64("QCSITE_SCRAPING_DELAY_MS", "1000")?;

    let provider = match or_default("QCSITE_PROVIDER", "simulated").as_str() {
        "simulated" => ProviderKind::Simulated,
        "http" => {
            let base_url = lookup("QCSITE_PROVIDER_BASE_URL")
                .map_err(|_| ConfigError::MissingEnvVar("QCSITE_PROVIDER_BASE_URL".to_string()))?;
            ProviderKind::Http { base_url }
        }
        other => {
            return Err(invalid(
                "QCSITE_PROVIDER",
                format!("expected \"simulated\" or \"http\", got \"{other}\""),
            ))
        }
    };
    let provider_timeout_secs = parse_u64("QCSITE_PROVIDER_TIMEOUT_SECS", "10")?;
    if provider_timeout_secs == 0 {
        return Err(invalid(
            "QCSITE_PROVIDER_TIMEOUT_SECS",
            "provider calls need a non-zero timeout".to_string(),
        ));
    }
    let provider_user_agent = or_default(
        "QCSITE_PROVIDER_USER_AGENT",
        "qcsite/0.1 (market-intelligence)",
    );
    let provider_max_retries = parse_u32("QCSITE_PROVIDER_MAX_RETRIES", "2")?;
    let provider_retry_backoff_base_secs =
        parse_u64("QCSITE_PROVIDER_RETRY_BACKOFF_BASE_SECS", "1")?;

    let simulation_seed = match lookup("QCSITE_SIMULATION_SEED") {
        Ok(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map_err(|e| invalid("QCSITE_SIMULATION_SEED", e.to_string()))?,
        ),
        Err(_) => None,
    };

    let llm = lookup("QCSITE_LLM_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(|api_key| LlmConfig {
            api_key,
            url: or_default("QCSITE_LLM_URL", DEFAULT_LLM_URL),
            model: or_default("QCSITE_LLM_MODEL", DEFAULT_LLM_MODEL),
        });

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        locations_path,
        scraping_enabled,
        scraping_interval_ms,
        scraping_delay_ms,
        provider,
        provider_timeout_secs,
        provider_user_agent,
        provider_max_retries,
        provider_retry_backoff_base_secs,
        simulation_seed,
        llm,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "QCSITE_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
