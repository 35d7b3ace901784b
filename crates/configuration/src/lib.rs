use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{ApiConfig, ApiKeys, CacheSettings, HttpSettings, RetrySettings, Settings};

/// Loads the application configuration.
///
/// Reads `meridian.toml` if present, then overlays environment variables
/// prefixed with `MERIDIAN` (e.g. `MERIDIAN__API__PRODUCTION__KEY`), and
/// deserializes the result into the strongly-typed `Settings` struct.
/// Every field has a default, so an empty environment yields a usable
/// configuration pointed at UTC with 300-second cache windows.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("meridian").required(false))
        .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;

    Ok(settings)
}
