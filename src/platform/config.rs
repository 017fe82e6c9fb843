use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "config.json";
pub const CONFIG_ENV: &str = "DAILY_REPORT_CONFIG";

pub const DEFAULT_EXCEL_DIR: &str =
    r"\\Asahipack02\社内書類ｎｅｗ\01：部署別　営業部\02：営業日報\2025年度";
pub const DEFAULT_DESIGN_DIR: &str =
    r"\\Asahipack02\社内書類ｎｅｗ\01：部署別　営業部\03：デザインデータ";

/// `config.json` as written by hand next to the executable. Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub excel_dir: PathBuf,
    pub design_dir: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    /// Workbook file name -> design folder name, for owners whose folder
    /// cannot be found by name.
    pub folder_mapping: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            excel_dir: PathBuf::from(DEFAULT_EXCEL_DIR),
            design_dir: PathBuf::from(DEFAULT_DESIGN_DIR),
            static_dir: None,
            data_dir: None,
            cache_dir: None,
            host: "0.0.0.0".to_string(),
            port: 8001,
            folder_mapping: HashMap::from([(
                "本社006　2025年度用日報【木村（拓）MGR】.xlsm".to_string(),
                "大阪本社　05：木村（拓）".to_string(),
            )]),
        }
    }
}

/// Fully resolved paths and listen address.
#[derive(Debug, Clone)]
pub struct Settings {
    pub excel_dir: PathBuf,
    pub design_dir: PathBuf,
    pub static_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub folder_mapping: HashMap<String, String>,
}

/// Directory of the running executable, or the working directory.
pub fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path(base_dir: &Path) -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| base_dir.join(CONFIG_FILE))
}

/// Never fails: a missing or broken config file falls back to defaults.
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        log::info!("{} not found. using defaults", path.display());
        return AppConfig::default();
    }
    match read_config(path) {
        Ok(config) => {
            log::info!(
                "loaded config {}. excel dir: {}",
                path.display(),
                config.excel_dir.display()
            );
            config
        }
        Err(err) => {
            log::warn!("failed to load {}: {err:#}. using defaults", path.display());
            AppConfig::default()
        }
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    serde_json::from_str(text.trim_start_matches('\u{feff}')).context("failed to parse config json")
}

impl AppConfig {
    pub fn resolve(self, base_dir: &Path) -> Settings {
        let project_dirs = ProjectDirs::from("jp", "asahipack", "daily-report");
        let data_dir = self.data_dir.unwrap_or_else(|| match &project_dirs {
            Some(dirs) => dirs.data_local_dir().to_path_buf(),
            None => base_dir.join("data"),
        });
        let cache_dir = self.cache_dir.unwrap_or_else(|| match &project_dirs {
            Some(dirs) => dirs.cache_dir().to_path_buf(),
            None => base_dir.join(".cache"),
        });

        Settings {
            excel_dir: self.excel_dir,
            design_dir: self.design_dir,
            static_dir: self.static_dir.unwrap_or_else(|| base_dir.join("static")),
            data_dir,
            cache_dir,
            host: self.host,
            port: self.port,
            folder_mapping: self.folder_mapping,
        }
    }
}
