use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    #[serde(alias = "url")]
    pub base_url: Option<String>,
    pub timeout: Option<u64>,
    pub page_size: Option<u32>,
    pub debounce_ms: Option<u64>,
    pub prefs_path: Option<String>,
    pub export_path: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    pub departments: Option<Vec<String>>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

fn app_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".employee-desk"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(app_dir()?.join("config.yml"))
}

pub fn default_prefs_path() -> PathBuf {
    app_dir()
        .map(|dir| dir.join("prefs.json"))
        .unwrap_or_else(|| PathBuf::from(".employee-desk-prefs.json"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

/// An empty or all-comment file is an empty config.
pub fn parse_config(contents: &str) -> Result<ConfigFile, serde_yaml::Error> {
    let value: Option<ConfigFile> = serde_yaml::from_str(contents)?;
    Ok(value.unwrap_or_default())
}

pub fn default_config_yaml() -> String {
    r#"# employee-desk config
#
# Location (default):
#   ~/.employee-desk/config.yml

# Service
base_url: http://localhost:5000
timeout: 10

# Query
page_size: 5
debounce_ms: 300
departments:
  - Engineering
  - HR
  - Sales
  - Marketing

# Files
# prefs_path: ~/.employee-desk/prefs.json
# export_path: ./employees.csv

# Output styling
output_format: text
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}
