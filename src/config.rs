use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedCipher";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the medicine-name lookup service when nothing overrides it.
pub const DEFAULT_LOOKUP_URL: &str = "http://127.0.0.1:5000";

/// Edit-distance budget sent with every lookup request.
pub const DEFAULT_MAX_EDIT_DISTANCE: u32 = 3;

/// Per-request timeout for the lookup service.
pub const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 30;

/// Env var overriding the lookup base URL.
pub const LOOKUP_URL_ENV: &str = "MEDCIPHER_LOOKUP_URL";

/// Env var enabling diagnostic dumps in any build.
pub const DUMP_DIR_ENV: &str = "MEDCIPHER_DUMP_DIR";

/// Debug builds count as development.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "medcipher=debug,medcipher_lib=debug"
    } else {
        "medcipher=info,medcipher_lib=info"
    }
}

/// Get the application data directory.
/// ~/MedCipher/ (or ~/MedCipher-dev/ in debug builds). Falls back to the
/// current directory when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if is_dev() {
        home.join(format!("{APP_NAME}-dev"))
    } else {
        home.join(APP_NAME)
    }
}

/// Settings for the name-correction lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub base_url: String,
    pub max_edit_distance: u32,
    pub timeout_secs: u64,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOOKUP_URL.to_string(),
            max_edit_distance: DEFAULT_MAX_EDIT_DISTANCE,
            timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
        }
    }
}

impl LookupSettings {
    /// Defaults, with the base URL taken from `MEDCIPHER_LOOKUP_URL` when set.
    pub fn from_env() -> Self {
        Self::from_lookup_url(std::env::var(LOOKUP_URL_ENV).ok())
    }

    fn from_lookup_url(url: Option<String>) -> Self {
        match url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            Some(base_url) => Self {
                base_url,
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        if let Some(home) = dirs::home_dir() {
            assert!(dir.starts_with(home));
        }
        assert!(dir.to_string_lossy().contains("MedCipher"));
    }

    #[test]
    fn app_name_is_medcipher() {
        assert_eq!(APP_NAME, "MedCipher");
    }

    #[test]
    fn default_settings_point_at_local_service() {
        let settings = LookupSettings::default();
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
        assert_eq!(settings.max_edit_distance, 3);
        assert_eq!(settings.timeout_secs, 30);
    }

    #[test]
    fn lookup_url_override() {
        let settings = LookupSettings::from_lookup_url(Some("http://lookup:8080".into()));
        assert_eq!(settings.base_url, "http://lookup:8080");
        assert_eq!(settings.max_edit_distance, DEFAULT_MAX_EDIT_DISTANCE);
    }

    #[test]
    fn blank_lookup_url_keeps_default() {
        let settings = LookupSettings::from_lookup_url(Some("   ".into()));
        assert_eq!(settings, LookupSettings::default());
        assert_eq!(LookupSettings::from_lookup_url(None), LookupSettings::default());
    }

    #[test]
    fn log_filter_targets_crate() {
        assert!(default_log_filter().contains("medcipher"));
    }
}
