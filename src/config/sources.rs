use serde::Deserialize;
use std::collections::HashMap;

use crate::config::settings::SettingsConfig;
use crate::resolvers::descriptor::SourceDescriptor;
use crate::utils::constants::CREDENTIALS_DB_SEARCH_PLACES;


/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    /// named credential sources, resolved on startup
    #[serde(default)]
    pub sources: HashMap<String, SourceDescriptor>,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// ================================
/// Credential database discovery
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub enabled: bool,
    /// directories scanned for per-user gcloud configuration
    #[serde(default = "default_search_places")]
    pub search_places: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            search_places: default_search_places(),
        }
    }
}

fn default_search_places() -> Vec<String> {
    CREDENTIALS_DB_SEARCH_PLACES.iter().map(|p| p.to_string()).collect()
}
