/// TOML configuration loading, validation and reload.
pub mod toml_config;
