use crate::db::{column_total, get_connection, row_count, ACCOUNTS_TABLE, SALARIES_TABLE};
use crate::error::Result;
use crate::fmt::{euros, format_bytes};
use crate::settings::{load_settings, settings_file_exists, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    let config = if settings_file_exists() {
        settings_path().display().to_string()
    } else {
        "(defaults, run `comptes init`)".to_string()
    };
    println!("Settings:   {config}");
    println!("Desktop:    {}", settings.desktop_dir().display());
    println!("Staging:    {}", settings.staging_dir().display());
    println!("Extracts:   {}", settings.extract_dir().display());
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `comptes load` to create it.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));
    let conn = get_connection(&db_path)?;

    println!();
    match row_count(&conn, ACCOUNTS_TABLE)? {
        Some(rows) => {
            println!("Comptes:    {rows} rows");
            if let Some(total) = column_total(&conn, ACCOUNTS_TABLE, "Dépense")? {
                println!("  Dépenses: {}", euros(total));
            }
            if let Some(total) = column_total(&conn, ACCOUNTS_TABLE, "Recette")? {
                println!("  Recettes: {}", euros(total));
            }
        }
        None => println!("Comptes:    (not loaded)"),
    }
    match row_count(&conn, SALARIES_TABLE)? {
        Some(rows) => {
            println!("Salaires:   {rows} rows");
            if let Some(total) = column_total(&conn, SALARIES_TABLE, "Valeur Numérique")? {
                println!("  Total:    {}", euros(total));
            }
        }
        None => println!("Salaires:   (not loaded)"),
    }
    Ok(())
}
