pub mod token_counter;

use tracing_subscriber::EnvFilter;

use crate::config::{FeaturesConfig, LogFormat};

/// Map a configured log level to a tracing filter directive.
///
/// - "DISABLED" -> `None` (no subscriber installed)
/// - "WARNING" -> WARN
/// - "CRITICAL" -> ERROR
/// - Others map directly (TRACE, DEBUG, INFO, WARN, ERROR)
#[must_use]
pub fn filter_directive(log_level: &str) -> Option<String> {
    let level = log_level.to_uppercase();
    match level.as_str() {
        "DISABLED" => None,
        "WARNING" => Some("WARN".to_string()),
        "CRITICAL" => Some("ERROR".to_string()),
        _ => Some(level),
    }
}

/// Initialize the tracing subscriber with the configured log level and format.
pub fn init_tracing(features: &FeaturesConfig) {
    let Some(directive) = filter_directive(&features.log_level) else {
        return;
    };

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("INFO"));

    match features.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(false)
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_mapping() {
        assert_eq!(filter_directive("disabled"), None);
        assert_eq!(filter_directive("warning").as_deref(), Some("WARN"));
        assert_eq!(filter_directive("CRITICAL").as_deref(), Some("ERROR"));
        assert_eq!(filter_directive("debug").as_deref(), Some("DEBUG"));
    }
}
