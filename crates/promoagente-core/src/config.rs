use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let api_base_url = or_default("PROMOAGENTE_API_BASE_URL", "http://localhost:7000")
        .trim()
        .to_string();
    if api_base_url.is_empty() {
        return Err(ConfigError::Validation(
            "PROMOAGENTE_API_BASE_URL must be non-empty".to_string(),
        ));
    }

    let env = parse_environment(&or_default("PROMOAGENTE_ENV", "development"));
    let log_level = or_default("PROMOAGENTE_LOG_LEVEL", "info");
    let session_file = PathBuf::from(or_default(
        "PROMOAGENTE_SESSION_FILE",
        "./.promoagente-session",
    ));
    let export_dir = PathBuf::from(or_default("PROMOAGENTE_EXPORT_DIR", "."));

    let request_timeout_secs = parse_u64("PROMOAGENTE_REQUEST_TIMEOUT_SECS", "60")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "PROMOAGENTE_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("PROMOAGENTE_USER_AGENT", "promoagente/0.1 (chat-client)");

    Ok(AppConfig {
        api_base_url,
        env,
        log_level,
        session_file,
        export_dir,
        request_timeout_secs,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
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
    fn parse_environment_known_values() {
        assert_eq!(parse_environment("development"), Environment::Development);
        assert_eq!(parse_environment("test"), Environment::Test);
        assert_eq!(parse_environment("production"), Environment::Production);
    }

    #[test]
    fn parse_environment_unknown_defaults_to_development() {
        assert_eq!(parse_environment("staging"), Environment::Development);
    }

    #[test]
    fn build_app_config_uses_defaults() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
        assert_eq!(cfg.api_base_url, "http://localhost:7000");
        assert_eq!(cfg.env, Environment::Development);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.session_file.to_str(), Some("./.promoagente-session"));
        assert_eq!(cfg.export_dir.to_str(), Some("."));
        assert_eq!(cfg.request_timeout_secs, 60);
        assert_eq!(cfg.user_agent, "promoagente/0.1 (chat-client)");
    }

    #[test]
    fn build_app_config_reads_overrides() {
        let mut map = HashMap::new();
        map.insert("PROMOAGENTE_API_BASE_URL", " https://promo.example.com ");
        map.insert("PROMOAGENTE_ENV", "production");
        map.insert("PROMOAGENTE_EXPORT_DIR", "/tmp/exports");
        map.insert("PROMOAGENTE_REQUEST_TIMEOUT_SECS", "15");
        let cfg = build_app_config(lookup_from_map(&map)).expect("overrides should be valid");
        assert_eq!(cfg.api_base_url, "https://promo.example.com");
        assert_eq!(cfg.env, Environment::Production);
        assert_eq!(cfg.export_dir.to_str(), Some("/tmp/exports"));
        assert_eq!(cfg.request_timeout_secs, 15);
    }

    #[test]
    fn build_app_config_rejects_invalid_timeout() {
        let mut map = HashMap::new();
        map.insert("PROMOAGENTE_REQUEST_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PROMOAGENTE_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(PROMOAGENTE_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn build_app_config_rejects_zero_timeout() {
        let mut map = HashMap::new();
        map.insert("PROMOAGENTE_REQUEST_TIMEOUT_SECS", "0");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn build_app_config_rejects_blank_base_url() {
        let mut map = HashMap::new();
        map.insert("PROMOAGENTE_API_BASE_URL", "   ");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "expected Validation error, got: {result:?}"
        );
    }

    #[test]
    fn with_api_base_url_overrides_only_url() {
        let map = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map))
            .expect("defaults should be valid")
            .with_api_base_url("http://127.0.0.1:9000");
        assert_eq!(cfg.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.request_timeout_secs, 60);
    }
}
