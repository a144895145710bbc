use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::cleaner::{timestamped_rows, TableCleaner};
use crate::db::{get_connection, load_to_table, ACCOUNTS_TABLE, SALARIES_TABLE};
use crate::error::{ComptesError, Result};
use crate::locator::find_header_row;
use crate::models::DataQualityWarning;
use crate::salary::{parse_salary_sheet, salary_frame, PivotLayout};
use crate::settings::Settings;
use crate::sheet::open_document;
use crate::staging::{extract_files, salary_source, source_files, sweep_and_push};
use crate::table::{extract_table, file_year, RectangularTable};

/// One workbook converted to CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub source: PathBuf,
    pub csv: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub files: usize,
    pub rows_loaded: usize,
    pub out_of_bound: usize,
    pub sentinel_rows: usize,
    pub warnings: Vec<DataQualityWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub staged: usize,
    pub extracted: Vec<Extracted>,
    pub loaded: Option<LoadSummary>,
}

pub fn open_db(settings: &Settings) -> Result<Connection> {
    let path = settings.db_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    get_connection(&path)
}

pub fn stage(settings: &Settings) -> Result<usize> {
    let copied = sweep_and_push(&settings.desktop_dir(), &settings.staging_dir())?;
    tracing::info!(count = copied.len(), "files staged");
    Ok(copied.len())
}

/// Extract the account table of one workbook into `<extract_dir>/<stem>.csv`.
pub fn convert_file(path: &Path, settings: &Settings) -> Result<Extracted> {
    tracing::info!(file = %path.display(), "file found");
    let document = open_document(path)?;
    let sheet = document.sheet(&settings.accounts_sheet)?;
    let header = find_header_row(sheet, 0, &settings.header_anchor)?;
    tracing::info!(sheet = %sheet.name, header_row = header, "sheet located");

    let table = extract_table(sheet, header);
    tracing::info!(rows = table.len(), columns = table.header.len(), "table extracted");

    let extract_dir = settings.extract_dir();
    std::fs::create_dir_all(&extract_dir)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| ComptesError::FileNaming(path.display().to_string()))?;
    let csv = extract_dir.join(format!("{stem}.csv"));
    table.write_csv(&csv)?;

    Ok(Extracted {
        source: path.to_path_buf(),
        csv,
        rows: table.len(),
    })
}

pub fn convert(settings: &Settings) -> Result<Vec<Extracted>> {
    let staging = settings.staging_dir();
    if !staging.exists() {
        tracing::info!(dir = %staging.display(), "staging folder missing, nothing to convert");
        return Ok(Vec::new());
    }
    source_files(&staging)?
        .iter()
        .map(|path| convert_file(path, settings))
        .collect()
}

/// Read every extract, tagged with the year taken from its file name.
pub fn read_extracts(settings: &Settings) -> Result<Vec<RectangularTable>> {
    let mut tables = Vec::new();
    for path in extract_files(&settings.extract_dir())? {
        let year = file_year(&path)?;
        let mut table = RectangularTable::read_csv(&path)?;
        table.tag_file_year(year);
        tracing::debug!(file = %path.display(), year, rows = table.len(), "extract read");
        tables.push(table);
    }
    Ok(tables)
}

/// Clean all extracts and replace the `comptes` table with the result.
/// Returns `None` when there is nothing to load.
pub fn load(settings: &Settings) -> Result<Option<LoadSummary>> {
    let tables = read_extracts(settings)?;
    if tables.is_empty() {
        tracing::info!(dir = %settings.extract_dir().display(), "no extracts to load");
        return Ok(None);
    }
    let files = tables.len();
    let table = RectangularTable::concat(tables);

    let stamped = timestamped_rows(&table);
    if !stamped.is_empty() {
        for (row, date, year) in &stamped {
            tracing::warn!(row, date = %date, file_year = %year, "date carries a timestamp");
        }
        if settings.reject_timestamped_dates {
            return Err(ComptesError::TimestampedDates { count: stamped.len() });
        }
    }

    let rows_in = table.len();
    let cleaned = TableCleaner::new(settings.accepted_columns.iter().cloned())
        .null_zero_provisions(settings.null_zero_provisions)
        .clean(table)?;
    tracing::info!(rows_in, rows_out = cleaned.frame.len(), "table cleaned");

    let out_of_bound = cleaned
        .frame
        .account_rows()
        .iter()
        .filter(|r| r.date_out_of_bound)
        .count();

    let mut conn = open_db(settings)?;
    let rows_loaded = load_to_table(&mut conn, ACCOUNTS_TABLE, &cleaned.frame)?;
    tracing::info!(table = ACCOUNTS_TABLE, rows = rows_loaded, out_of_bound, "rows loaded");

    Ok(Some(LoadSummary {
        files,
        rows_loaded,
        out_of_bound,
        sentinel_rows: cleaned.sentinel_rows,
        warnings: cleaned.warnings,
    }))
}

/// Unpivot the salary sheet and replace the `salaires` table. Without an
/// explicit file, the workbook is picked from the staging folder.
pub fn load_salaries(settings: &Settings, file: Option<&Path>) -> Result<usize> {
    let path = match file {
        Some(p) => p.to_path_buf(),
        None => salary_source(&settings.staging_dir())?,
    };
    tracing::info!(file = %path.display(), "file found");
    let document = open_document(&path)?;
    let sheet = document.sheet(&settings.salary_sheet)?;
    tracing::info!(sheet = %sheet.name, rows = sheet.row_count(), "sheet located");

    let records = parse_salary_sheet(sheet, &PivotLayout::default())?;
    tracing::info!(records = records.len(), "salary records extracted");
    let frame = salary_frame(&records)?;

    let mut conn = open_db(settings)?;
    let rows = load_to_table(&mut conn, SALARIES_TABLE, &frame)?;
    tracing::info!(table = SALARIES_TABLE, rows, "rows loaded");
    Ok(rows)
}

/// Convert then load: what a change in the staging folder triggers.
pub fn refresh(settings: &Settings) -> Result<(Vec<Extracted>, Option<LoadSummary>)> {
    let extracted = convert(settings)?;
    let loaded = load(settings)?;
    Ok((extracted, loaded))
}

pub fn run(settings: &Settings) -> Result<RunSummary> {
    let staged = stage(settings)?;
    let (extracted, loaded) = refresh(settings)?;
    Ok(RunSummary {
        staged,
        extracted,
        loaded,
    })
}
