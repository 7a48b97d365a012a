//! Configuration file parsing for opsdeck
//!
//! Supports:
//! - `<config_dir>/opsdeck/config.toml` (or `--config <path>`) - Global settings
//! - `OPSDECK_BACKEND_URL` - Backend URL override

pub mod settings;
pub mod types;

pub use settings::{
    apply_env_overrides, default_config_path, init_config_file, load_settings,
    BACKEND_URL_ENV_VAR, CONFIG_FILENAME,
};
pub use types::*;
