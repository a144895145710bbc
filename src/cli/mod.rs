pub mod convert;
pub mod init;
pub mod load;
pub mod run;
pub mod salaries;
pub mod stage;
pub mod status;
pub mod watch;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "comptes",
    version,
    about = "Stage, convert and load spreadsheet account exports into SQLite."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the settings file and create the working folders.
    Init {
        /// Folder where spreadsheet exports land (default: ~/Bureau)
        #[arg(long = "desktop-dir")]
        desktop_dir: Option<String>,
        /// Staging folder (default: ~/Comptes)
        #[arg(long = "staging-dir")]
        staging_dir: Option<String>,
        /// Folder for CSV extracts (default: ~/Extracts)
        #[arg(long = "extract-dir")]
        extract_dir: Option<String>,
        /// SQLite database path (default: ~/Documents/comptes/finance.db)
        #[arg(long = "db-path")]
        db_path: Option<String>,
    },
    /// Copy Comptes*.ods exports from the desktop folder into staging.
    Stage,
    /// Extract the account table of every staged workbook to CSV.
    Convert,
    /// Clean all CSV extracts and load them into the `comptes` table.
    Load,
    /// Unpivot the salary sheet and load it into the `salaires` table.
    Salaries {
        /// Workbook to read (default: last .ods in the staging folder)
        file: Option<String>,
    },
    /// Stage, convert and load in sequence.
    Run,
    /// Watch the staging folder and convert + load on every change.
    Watch,
    /// Show settings, database size and table totals.
    Status,
}
