//! App settings: defaults, optional `geofix.toml`, `APP__*` env overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Settings {
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    /// When false, the built-in simulated geocoder answers lookups and the
    /// app runs fully offline.
    pub use_network_geocoder: bool,
    pub simulated_latitude: f64,
    pub simulated_longitude: f64,
    pub consent_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geocoder_url: "https://nominatim.openstreetmap.org/reverse".into(),
            geocoder_user_agent: "geofix/0.1 (desktop location finder)".into(),
            use_network_geocoder: true,
            simulated_latitude: 47.6205,
            simulated_longitude: -122.3493,
            consent_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    geocoder_url: Option<String>,
    geocoder_user_agent: Option<String>,
    use_network_geocoder: Option<bool>,
    simulated_latitude: Option<f64>,
    simulated_longitude: Option<f64>,
    consent_path: Option<PathBuf>,
}

pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let file = path.unwrap_or_else(|| Path::new("geofix.toml"));
    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => tracing::warn!("ignoring malformed '{}': {err}", file.display()),
        }
    }

    apply_env(&mut settings);
    settings
}

impl Settings {
    /// The consent file location: configured path, or the per-user data
    /// directory, or the working directory as a last resort.
    pub fn resolved_consent_path(&self) -> PathBuf {
        if let Some(path) = &self.consent_path {
            return path.clone();
        }
        match dirs::data_local_dir() {
            Some(base) => base.join("geofix").join("consent.json"),
            None => PathBuf::from("geofix-consent.json"),
        }
    }
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.geocoder_url {
        settings.geocoder_url = v;
    }
    if let Some(v) = file_cfg.geocoder_user_agent {
        settings.geocoder_user_agent = v;
    }
    if let Some(v) = file_cfg.use_network_geocoder {
        settings.use_network_geocoder = v;
    }
    if let Some(v) = file_cfg.simulated_latitude {
        settings.simulated_latitude = v;
    }
    if let Some(v) = file_cfg.simulated_longitude {
        settings.simulated_longitude = v;
    }
    if let Some(v) = file_cfg.consent_path {
        settings.consent_path = Some(v);
    }
}

fn apply_env(settings: &mut Settings) {
    if let Ok(v) = std::env::var("APP__GEOCODER_URL") {
        settings.geocoder_url = v;
    }
    if let Ok(v) = std::env::var("APP__GEOCODER_USER_AGENT") {
        settings.geocoder_user_agent = v;
    }
    if let Ok(v) = std::env::var("APP__USE_NETWORK_GEOCODER") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.use_network_geocoder = parsed;
        }
    }
    if let Ok(v) = std::env::var("APP__SIMULATED_LATITUDE") {
        if let Ok(parsed) = v.parse::<f64>() {
            settings.simulated_latitude = parsed;
        }
    }
    if let Ok(v) = std::env::var("APP__SIMULATED_LONGITUDE") {
        if let Ok(parsed) = v.parse::<f64>() {
            settings.simulated_longitude = parsed;
        }
    }
    if let Ok(v) = std::env::var("APP__CONSENT_PATH") {
        settings.consent_path = Some(PathBuf::from(v));
    }
}
