use colored::Colorize;

use crate::cli::load::print_summary;
use crate::error::Result;
use crate::pipeline::refresh;
use crate::settings::load_settings;
use crate::watcher::watch;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let dir = settings.staging_dir();
    std::fs::create_dir_all(&dir)?;
    println!("{} {} (Ctrl-C to stop)", "Watching".cyan().bold(), dir.display());

    watch(&dir, || {
        let (extracted, loaded) = refresh(&settings)?;
        println!("{} {} workbook(s) converted", "Refreshed:".cyan(), extracted.len());
        print_summary(loaded.as_ref());
        Ok(())
    })
}
