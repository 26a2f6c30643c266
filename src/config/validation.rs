use super::{AppConfig, ConfigError};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_storage(config)?;
    validate_provider(config)?;
    validate_features(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.host.trim().is_empty() {
        return Err(validation_err("server.host cannot be empty"));
    }
    if server.http_pool_max_idle_per_host == 0 {
        return Err(validation_err(
            "server.http_pool_max_idle_per_host must be greater than 0",
        ));
    }
    if server.connect_timeout == 0 {
        return Err(validation_err(
            "server.connect_timeout must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_storage(config: &AppConfig) -> Result<(), ConfigError> {
    if config.storage.path.trim().is_empty() {
        return Err(validation_err("storage.path cannot be empty"));
    }
    Ok(())
}

fn validate_provider(config: &AppConfig) -> Result<(), ConfigError> {
    let Some(provider) = &config.provider else {
        return Ok(());
    };
    let base = provider.endpoint_base.trim();
    if !base.starts_with("http://") && !base.starts_with("https://") {
        return Err(validation_err(
            "provider.base_url must start with http:// or https://",
        ));
    }
    if provider.model.trim().is_empty() {
        return Err(validation_err("provider.model cannot be empty"));
    }
    Ok(())
}

const VALID_LOG_LEVELS: &[&str] = &[
    "DISABLED", "TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL",
];

fn validate_features(config: &AppConfig) -> Result<(), ConfigError> {
    let features = &config.features;
    if features.max_output_tokens == 0 {
        return Err(validation_err(
            "features.max_output_tokens must be greater than 0",
        ));
    }
    let level = features.log_level.to_uppercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "features.log_level '{}' is invalid. Must be one of: {}",
            features.log_level,
            VALID_LOG_LEVELS.join(", ")
        )));
    }
    Ok(())
}
