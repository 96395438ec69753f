use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering the given TOML file and `BINOPT_`
    /// environment variables over the built-in defaults. A missing file is
    /// not an error; every value has a documented default.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or environment value cannot be
    /// parsed into the config schema.
    pub fn load(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("BINOPT_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = ConfigLoader::load("does/not/exist.toml").unwrap();
        assert_eq!(cfg.feed.tick_interval_ms, 1000);
        assert_eq!(cfg.trading.daily_trade_limit, 50);
    }
}
