//! INI file configuration adapter.

use crate::domain::error::TradelogError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradelogError> {
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|e| TradelogError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_f64(&self, section: &str, key: &str) -> Option<f64> {
        self.config.getfloat(section, key).ok().flatten()
    }

    fn get_i64(&self, section: &str, key: &str) -> Option<i64> {
        self.config.getint(section, key).ok().flatten()
    }

    fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
    }
}
