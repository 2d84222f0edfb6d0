use super::Config;
use crate::error::RelvaultError;
use config::Config as ConfigBuilder;

pub fn load_config(config_path: &str) -> Result<Config, RelvaultError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        // RELVAULT_TOKEN overrides the file so tokens stay out of checked-in
        // configs; nested keys use __ (RELVAULT_RETRY__MAX_ATTEMPTS).
        .add_source(config::Environment::with_prefix("RELVAULT").separator("__"))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}
