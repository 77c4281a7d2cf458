use std::{fs, path::Path};

use serde::Deserialize;
use shared::domain::STORE_CATALOG;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_filter: String,
    pub stores: Vec<String>,
    pub seed_demo_items: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: "info".into(),
            stores: STORE_CATALOG.iter().map(|store| store.to_string()).collect(),
            seed_demo_items: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    log_filter: Option<String>,
    stores: Option<Vec<String>>,
    seed_demo_items: Option<bool>,
}

/// Defaults, then the optional TOML file, then env vars. Env wins.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = path.unwrap_or_else(|| Path::new("grocery.toml"));
    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.log_filter {
                    settings.log_filter = v;
                }
                if let Some(v) = file_cfg.stores {
                    settings.stores = v;
                }
                if let Some(v) = file_cfg.seed_demo_items {
                    settings.seed_demo_items = v;
                }
            }
            Err(err) => {
                eprintln!("ignoring malformed {}: {err}", path.display());
            }
        }
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

fn apply_env_overrides<F>(settings: &mut Settings, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = var("GROCERY_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = var("GROCERY_STORES") {
        settings.stores = parse_stores(&v);
    }
    if let Some(v) = var("GROCERY_SEED") {
        settings.seed_demo_items = parse_bool(&v);
    }
}

fn parse_stores(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|store| !store.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "yes")
}
