//! INI file configuration adapter.

use crate::domain::error::SepaError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SepaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_string(content: &str) -> Result<Self, SepaError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, source: &str) -> Result<Self, SepaError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SepaError::ConfigParse {
                file: source.to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }

    fn invalid(section: &str, key: &str, expected: &str, raw: &str) -> SepaError {
        SepaError::config_invalid(section, key, format!("expected {}, got '{}'", expected, raw))
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SepaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| Self::invalid(section, key, "an integer", &raw)),
        }
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SepaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(Self::invalid(section, key, "a finite number", &raw)),
            },
        }
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SepaError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => Self::parse_bool(&raw)
                .ok_or_else(|| Self::invalid(section, key, "true or false", &raw)),
        }
    }

    fn sections(&self) -> Vec<String> {
        self.config.sections()
    }
}
