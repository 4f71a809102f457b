use std::path::Path;

use crate::install::InstallPolicy;

pub const ENV_FILE: &str = ".printer_installer_env";
pub const DEFAULT_CONFIG_URL: &str = "http://10.245.93.86/printer/printer-config.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_url: String,
    pub http_timeout_secs: u64,
    pub policy: InstallPolicy,
    pub font_path: Option<String>,
    pub lpstat_bin: String,
    pub lpadmin_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_url: DEFAULT_CONFIG_URL.to_string(),
            http_timeout_secs: 30,
            policy: InstallPolicy::Sequential,
            font_path: None,
            lpstat_bin: "lpstat".to_string(),
            lpadmin_bin: "lpadmin".to_string(),
        }
    }
}

/// Settings from the process environment, falling back to `.printer_installer_env`.
pub fn load_settings() -> Result<Settings, String> {
    let entries = read_env_file(Path::new(ENV_FILE))?;

    settings_from(|key| {
        std::env::var(key).ok().or_else(|| {
            entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    })
}

fn read_env_file(path: &Path) -> Result<Vec<(String, String)>, String> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    Ok(dotenvy::from_path_iter(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?
        .filter_map(|item| item.ok())
        .collect())
}

pub fn settings_from(get: impl Fn(&str) -> Option<String>) -> Result<Settings, String> {
    let defaults = Settings::default();
    let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let config_url = get("PRINTER_CONFIG_URL").unwrap_or(defaults.config_url);

    let http_timeout_secs = match get("HTTP_TIMEOUT") {
        Some(v) => match v.parse::<u64>() {
            Ok(0) => return Err("Invalid HTTP_TIMEOUT: must be at least 1".into()),
            Ok(n) => n,
            Err(e) => return Err(format!("Invalid HTTP_TIMEOUT: {e}")),
        },
        None => defaults.http_timeout_secs,
    };

    // INSTALL_CONCURRENCY only matters in parallel mode.
    let policy = match get("INSTALL_MODE").as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("sequential") => InstallPolicy::Sequential,
        Some("parallel") => InstallPolicy::Parallel {
            max_in_flight: max_in_flight(get("INSTALL_CONCURRENCY"))?,
        },
        Some(other) => {
            return Err(format!(
                "Invalid INSTALL_MODE '{other}': expected 'sequential' or 'parallel'"
            ))
        }
    };

    Ok(Settings {
        config_url,
        http_timeout_secs,
        policy,
        font_path: get("PRINTER_INSTALLER_FONT"),
        lpstat_bin: get("LPSTAT_BIN").unwrap_or(defaults.lpstat_bin),
        lpadmin_bin: get("LPADMIN_BIN").unwrap_or(defaults.lpadmin_bin),
    })
}

fn max_in_flight(value: Option<String>) -> Result<usize, String> {
    match value {
        Some(v) => match v.parse::<usize>() {
            Ok(0) => Err("Invalid INSTALL_CONCURRENCY: must be at least 1".into()),
            Ok(n) => Ok(n),
            Err(e) => Err(format!("Invalid INSTALL_CONCURRENCY: {e}")),
        },
        None => Ok(4),
    }
}
