use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path};

pub fn run(
    desktop_dir: Option<String>,
    staging_dir: Option<String>,
    extract_dir: Option<String>,
    db_path: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = desktop_dir {
        settings.desktop_dir = dir;
    }
    if let Some(dir) = staging_dir {
        settings.staging_dir = dir;
    }
    if let Some(dir) = extract_dir {
        settings.extract_dir = dir;
    }
    if let Some(path) = db_path {
        settings.db_path = path;
    }

    for dir in [settings.desktop_dir(), settings.staging_dir(), settings.extract_dir()] {
        std::fs::create_dir_all(&dir)?;
    }
    if let Some(parent) = settings.db_path().parent() {
        std::fs::create_dir_all(parent)?;
    }
    save_settings(&settings)?;

    println!("{} {}", "Settings written to".green(), settings_path().display());
    println!("Desktop:   {}", settings.desktop_dir().display());
    println!("Staging:   {}", settings.staging_dir().display());
    println!("Extracts:  {}", settings.extract_dir().display());
    println!("Database:  {}", settings.db_path().display());
    Ok(())
}
