use colored::Colorize;

use crate::error::Result;
use crate::pipeline::stage;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let count = stage(&settings)?;
    println!(
        "{} staged into {}",
        format!("{count} file(s)").green(),
        settings.staging_dir().display()
    );
    Ok(())
}
