//! Key/value lookups for secrets the fetch task needs at call time.

use std::{collections::HashMap, fmt::Debug, path::PathBuf};

use crate::config::Config;

pub const OPEN_WEATHER_API_KEY: &str = "OPEN_WEATHER_API_KEY";

/// A source of named variables. Implementations are queried on every task
/// run and must not cache.
pub trait VariableStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvVariables;

impl VariableStore for EnvVariables {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().and_then(non_blank)
    }
}

/// Re-reads the config file on each lookup.
#[derive(Debug, Clone)]
pub struct ConfigFileVariables {
    path: PathBuf,
}

impl ConfigFileVariables {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VariableStore for ConfigFileVariables {
    fn get(&self, key: &str) -> Option<String> {
        let config = match Config::load_from(&self.path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config for variable lookup: {e}");
                return None;
            }
        };

        match key {
            OPEN_WEATHER_API_KEY => config.api_key().map(str::to_string),
            _ => None,
        }
    }
}

/// Returns the first hit across several stores, in order.
#[derive(Debug, Default)]
pub struct LayeredVariables {
    layers: Vec<Box<dyn VariableStore>>,
}

impl LayeredVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, store: impl VariableStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }
}

impl VariableStore for LayeredVariables {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|s| s.get(key))
    }
}

impl VariableStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned().and_then(non_blank)
    }
}
