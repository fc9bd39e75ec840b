use config::{Config, ConfigError, Environment, File};
use rota_engine::EngineConfig;
use serde::Deserialize;

/// CLI settings: the database location plus the engine configuration.
///
/// Sources, lowest precedence first: built-in defaults, `rota.toml` in the
/// working directory (or the `--config` file), then `ROTA__*` environment
/// variables such as `ROTA__DATABASE` or `ROTA__ENGINE__APPLY_STRICTNESS`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: String,
    pub engine: EngineConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: "rota.db".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(p) => File::with_name(p).required(true),
        None => File::with_name("rota").required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("ROTA")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Settings>()
}
