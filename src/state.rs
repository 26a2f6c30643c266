use crate::config::AppConfig;
use crate::error::ArchitectError;
use crate::generate::{Generator, ProviderConfig};
use crate::storage::Store;
use crate::transport::HttpTransport;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub generator: Generator,
    pub store: Store,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, store: Store) -> Self {
        let transport = HttpTransport::new(&config.server);
        let generator = Generator::new(transport, config.features.max_output_tokens);
        Self {
            config,
            generator,
            store,
        }
    }

    /// Provider to use when a request carries none: stored settings first,
    /// then the config file.
    ///
    /// # Errors
    ///
    /// Returns [`ArchitectError::InvalidRequest`] when neither source has a
    /// provider, or a storage error.
    pub fn default_provider(&self) -> Result<ProviderConfig, ArchitectError> {
        if let Some(settings) = self.store.get_settings()? {
            return Ok(settings.into());
        }
        self.config.provider.clone().ok_or_else(|| {
            ArchitectError::InvalidRequest(
                "No provider configured: save settings or pass config".to_string(),
            )
        })
    }
}
