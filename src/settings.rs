use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cleaner::DEFAULT_ACCEPTED_COLUMNS;
use crate::error::{ComptesError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the spreadsheet exports land.
    pub desktop_dir: String,
    pub staging_dir: String,
    /// One CSV per converted workbook.
    pub extract_dir: String,
    pub db_path: String,
    pub accounts_sheet: String,
    pub salary_sheet: String,
    pub header_anchor: String,
    pub accepted_columns: Vec<String>,
    pub reject_timestamped_dates: bool,
    pub null_zero_provisions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            desktop_dir: home_join(&["Bureau"]),
            staging_dir: home_join(&["Comptes"]),
            extract_dir: home_join(&["Extracts"]),
            db_path: home_join(&["Documents", "comptes", "finance.db"]),
            accounts_sheet: "Mouvements".to_string(),
            salary_sheet: "Salaires".to_string(),
            header_anchor: "Date".to_string(),
            accepted_columns: DEFAULT_ACCEPTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            reject_timestamped_dates: true,
            null_zero_provisions: false,
        }
    }
}

impl Settings {
    pub fn desktop_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.desktop_dir))
    }

    pub fn staging_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.staging_dir))
    }

    pub fn extract_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.extract_dir))
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.db_path))
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn home_join(parts: &[&str]) -> String {
    parts
        .iter()
        .fold(home(), |p, part| p.join(part))
        .to_string_lossy()
        .to_string()
}

fn config_dir() -> PathBuf {
    home().join(".config").join("comptes")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "unreadable settings, using defaults");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ComptesError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
