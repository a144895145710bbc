use std::collections::HashSet;

use chrono::Datelike;

use crate::error::{ComptesError, Result};
use crate::frame::{Frame, Value};
use crate::models::DataQualityWarning;
use crate::normalize::{
    clean_boolean, currency_to_number, is_timestamped_date, parse_date, parse_rate, title_case, zero_to_null,
    Flag,
};
use crate::table::{RectangularTable, FILE_YEAR_COLUMN};

pub const DATE: &str = "Date";
pub const MONTH: &str = "Mois";
pub const EXPENSE: &str = "Dépense";
pub const INCOME: &str = "Recette";
pub const TO_PAY: &str = "Provision à payer";
pub const TO_RECOVER: &str = "Provision à récupérer";
pub const SAVING: &str = "Economie";
pub const SETTLED: &str = "Réglé";
pub const CATEGORY: &str = "Catégorie";
pub const RATE: &str = "Taux de remboursement";
pub const OUT_OF_BOUND: &str = "Date Out of Bound";

/// Rows dated with this placeholder are excluded on purpose.
pub const SENTINEL_DATE: &str = "9999-12-31";

const CURRENCY_COLUMNS: [&str; 4] = [EXPENSE, INCOME, TO_PAY, TO_RECOVER];
const PROVISION_COLUMNS: [&str; 2] = [TO_PAY, TO_RECOVER];
const BOOLEAN_COLUMNS: [&str; 2] = [SAVING, SETTLED];

/// Source label → persisted column name.
pub const RENAMES: &[(&str, &str)] = &[
    ("N°", "No"),
    ("N° de référence", "no_de_reference"),
    ("Fait Marquant", "fait_marquant"),
    (RATE, "taux_remboursement"),
];

pub const DEFAULT_ACCEPTED_COLUMNS: &[&str] = &[
    "Date",
    "N°",
    "Description",
    "Dépense",
    "N° de référence",
    "Recette",
    "Taux de remboursement",
    "Compte",
    "Catégorie",
    "Economie",
    "Réglé",
    "Mois",
    "Date d'insertion",
    "Provision à payer",
    "Provision à récupérer",
    "Date remboursement",
    "Organisme",
    "Fait Marquant",
    "File Year",
];

#[derive(Debug)]
pub struct Cleaned {
    pub frame: Frame,
    pub warnings: Vec<DataQualityWarning>,
    pub sentinel_rows: usize,
}

/// Turns raw account tables into the typed `comptes` layout. Only columns in
/// the allow-list survive; the `File Year` tag is always kept. Placeholder
/// rows are dropped before any value is parsed.
pub struct TableCleaner {
    accepted: HashSet<String>,
    null_zero_provisions: bool,
}

impl TableCleaner {
    pub fn new<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
            null_zero_provisions: false,
        }
    }

    /// Read a zero provision as "not applicable" rather than "explicitly zero".
    pub fn null_zero_provisions(mut self, enabled: bool) -> Self {
        self.null_zero_provisions = enabled;
        self
    }

    pub fn clean(&self, table: RectangularTable) -> Result<Cleaned> {
        let rows_in = table.len();
        let mut frame = Frame::from(table);
        // Input row index of each frame row, for error context after filtering.
        let mut origin: Vec<usize> = (0..rows_in).collect();
        let mut warnings = Vec::new();

        frame.retain_columns(|c| c == FILE_YEAR_COLUMN || self.accepted.contains(c));
        tracing::debug!(columns = ?frame.columns, "columns kept");

        convert_file_year(&mut frame)?;

        let sentinel_rows = drop_sentinel_rows(&mut frame, &mut origin);
        if sentinel_rows > 0 {
            tracing::debug!(sentinel_rows, "placeholder rows removed");
        }

        for column in CURRENCY_COLUMNS {
            let nullify = self.null_zero_provisions && PROVISION_COLUMNS.contains(&column);
            map_column(&mut frame, &origin, column, |raw| {
                let amount = currency_to_number(raw)?;
                let amount = if nullify { zero_to_null(amount) } else { amount };
                Ok(amount.map_or(Value::Null, Value::Number))
            })
            .map_err(|(row, value)| ComptesError::NumericParse {
                row,
                column: column.to_string(),
                value,
            })?;
        }

        for column in BOOLEAN_COLUMNS {
            let Some(idx) = frame.column_index(column) else { continue };
            for (i, row) in frame.rows.iter_mut().enumerate() {
                let raw = row[idx].as_str().unwrap_or("").to_string();
                let flag = clean_boolean(&raw);
                if let Flag::Unmapped(value) = &flag {
                    tracing::warn!(row = origin[i], column, value = %value, "unmapped boolean kept as-is");
                    warnings.push(DataQualityWarning {
                        row: origin[i],
                        column: column.to_string(),
                        value: value.clone(),
                    });
                }
                row[idx] = Value::Text(flag.as_text().to_string());
            }
        }

        for column in [DATE, MONTH] {
            map_column(&mut frame, &origin, column, |raw| {
                parse_date(raw).map(|v| v.map_or(Value::Null, Value::Date))
            })
            .map_err(|(row, value)| ComptesError::DateParse {
                row,
                column: column.to_string(),
                value,
            })?;
        }

        if let Some(idx) = frame.column_index(CATEGORY) {
            for row in &mut frame.rows {
                if let Value::Text(s) = &row[idx] {
                    row[idx] = Value::Text(title_case(s));
                }
            }
        }

        flag_out_of_bound(&mut frame);
        recompute_provision(&mut frame, &origin)?;

        for (from, to) in RENAMES {
            frame.rename(from, to);
        }

        Ok(Cleaned {
            frame,
            warnings,
            sentinel_rows,
        })
    }
}

impl Default for TableCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_ACCEPTED_COLUMNS.iter().copied())
    }
}

/// Rows whose date still carries a time or annotation suffix, as
/// `(row, date, file year)`.
pub fn timestamped_rows(table: &RectangularTable) -> Vec<(usize, String, String)> {
    let Some(date_idx) = table.column_index(DATE) else {
        return Vec::new();
    };
    let year_idx = table.column_index(FILE_YEAR_COLUMN);
    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let date = row.get(date_idx)?;
            if !is_timestamped_date(date) {
                return None;
            }
            let year = year_idx.and_then(|y| row.get(y)).cloned().unwrap_or_default();
            Some((i, date.clone(), year))
        })
        .collect()
}

// Apply `f` to every text cell of `column`; nulls stay null. On failure,
// returns the input row index and the raw value.
fn map_column<F>(frame: &mut Frame, origin: &[usize], column: &str, f: F) -> std::result::Result<(), (usize, String)>
where
    F: Fn(&str) -> std::result::Result<Value, crate::normalize::Malformed>,
{
    let Some(idx) = frame.column_index(column) else {
        return Ok(());
    };
    for (i, row) in frame.rows.iter_mut().enumerate() {
        let Value::Text(raw) = &row[idx] else { continue };
        row[idx] = f(raw).map_err(|m| (origin[i], m.0))?;
    }
    Ok(())
}

fn convert_file_year(frame: &mut Frame) -> Result<()> {
    let Some(idx) = frame.column_index(FILE_YEAR_COLUMN) else {
        return Ok(());
    };
    for (i, row) in frame.rows.iter_mut().enumerate() {
        if let Value::Text(raw) = &row[idx] {
            let year = raw.trim().parse::<i64>().map_err(|_| ComptesError::NumericParse {
                row: i,
                column: FILE_YEAR_COLUMN.to_string(),
                value: raw.clone(),
            })?;
            row[idx] = Value::Integer(year);
        }
    }
    Ok(())
}

fn drop_sentinel_rows(frame: &mut Frame, origin: &mut Vec<usize>) -> usize {
    let Some(idx) = frame.column_index(DATE) else {
        return 0;
    };
    let before = frame.rows.len();
    let keep: Vec<bool> = frame
        .rows
        .iter()
        .map(|row| row[idx].as_str().map(str::trim) != Some(SENTINEL_DATE))
        .collect();
    let mut flags = keep.iter();
    frame.rows.retain(|_| *flags.next().unwrap_or(&true));
    let mut flags = keep.iter();
    origin.retain(|_| *flags.next().unwrap_or(&true));
    before - frame.rows.len()
}

fn flag_out_of_bound(frame: &mut Frame) {
    let date_idx = frame.column_index(DATE);
    let year_idx = frame.column_index(FILE_YEAR_COLUMN);
    let flag_idx = frame.ensure_column(OUT_OF_BOUND);
    for row in &mut frame.rows {
        let date = date_idx.and_then(|i| row[i].as_date());
        let year = year_idx.and_then(|i| row[i].as_i64());
        let out = matches!((date, year), (Some(d), Some(y)) if i64::from(d.year()) > y);
        row[flag_idx] = Value::Bool(out);
    }
}

// Where a reimbursement rate is set, the amount to recover is expense × rate.
fn recompute_provision(frame: &mut Frame, origin: &[usize]) -> Result<()> {
    let Some(rate_idx) = frame.column_index(RATE) else {
        return Ok(());
    };
    map_column(frame, origin, RATE, |raw| {
        parse_rate(raw).map(|v| v.map_or(Value::Null, Value::Number))
    })
    .map_err(|(row, value)| ComptesError::NumericParse {
        row,
        column: RATE.to_string(),
        value,
    })?;

    let expense_idx = frame.column_index(EXPENSE);
    let recover_idx = frame.ensure_column(TO_RECOVER);
    for row in &mut frame.rows {
        let Some(rate) = row[rate_idx].as_f64() else { continue };
        let expense = expense_idx.and_then(|i| row[i].as_f64());
        row[recover_idx] = expense.map_or(Value::Null, |e| Value::Number(e * rate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(header: &[&str], rows: &[&[&str]]) -> RectangularTable {
        RectangularTable::new(
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        )
    }

    fn full_table() -> RectangularTable {
        let mut t = table(
            &[
                "Date", "N°", "Description", "Dépense", "Recette", "Taux de remboursement", "Compte",
                "Catégorie", "Economie", "Réglé", "Mois", "Provision à payer", "Provision à récupérer",
                "Fait Marquant", "Solde",
            ],
            &[
                &[
                    "2023-01-05", "1", "Pharmacie", "20 EUR", "0 EUR", "0.7", "Courant", "santé", "False",
                    "True", "2023-01-01", "0 EUR", "5 EUR", "", "100 EUR",
                ],
                &[
                    "9999-12-31", "2", "Modèle", "", "", "", "Courant", "", "", "", "", "", "", "", "",
                ],
                &[
                    "2024-01-02", "3", "Loyer", "800 EUR", "0 EUR", "", "Courant", "LOGEMENT", "0", "1",
                    "2024-01-01", "0 EUR", "12 EUR", "oui", "",
                ],
            ],
        );
        t.tag_file_year(2023);
        t
    }

    #[test]
    fn test_round_trip_minimal_allow_list() {
        let mut t = table(&["Date", "Dépense", "Recette"], &[&["2023-05-01 12:00", "10 EUR", "0 EUR"]]);
        t.tag_file_year(2023);
        let cleaned = TableCleaner::new(["Date", "Dépense", "Recette"]).clean(t).unwrap();
        let f = &cleaned.frame;
        assert_eq!(f.len(), 1);
        assert_eq!(f.get(0, "Dépense"), Some(&Value::Number(10.0)));
        assert_eq!(f.get(0, "Recette"), Some(&Value::Number(0.0)));
        assert_eq!(f.get(0, "Date"), Some(&Value::Date(NaiveDate::from_ymd_opt(2023, 5, 1).unwrap())));
        assert_eq!(f.get(0, "File Year"), Some(&Value::Integer(2023)));
        assert_eq!(f.get(0, "Date Out of Bound"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_full_clean() {
        crate::logging::init_test();
        let cleaned = TableCleaner::default().clean(full_table()).unwrap();
        let f = &cleaned.frame;

        assert_eq!(cleaned.sentinel_rows, 1);
        assert_eq!(f.len(), 2);
        assert!(!f.has_column("Solde"));
        assert!(f.has_column("No"));
        assert!(f.has_column("taux_remboursement"));
        assert!(f.has_column("fait_marquant"));
        assert!(!f.has_column("N°"));

        let rows = f.account_rows();
        assert_eq!(rows[0].category.as_deref(), Some("Santé"));
        assert_eq!(rows[1].category.as_deref(), Some("Logement"));
        assert_eq!(rows[0].is_saving.as_deref(), Some("false"));
        assert_eq!(rows[0].is_settled.as_deref(), Some("true"));
        assert_eq!(rows[1].is_settled.as_deref(), Some("true"));
        assert_eq!(rows[0].expense, Some(20.0));
        assert_eq!(rows[1].file_year, Some(2023));
        assert!(!rows[0].date_out_of_bound);
        assert!(rows[1].date_out_of_bound);
        assert_eq!(f.get(1, "Mois"), Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())));
    }

    #[test]
    fn test_provision_recomputed_only_where_rate_set() {
        let cleaned = TableCleaner::default().clean(full_table()).unwrap();
        let rows = cleaned.frame.account_rows();
        assert!((rows[0].provision_to_recover.unwrap() - 14.0).abs() < 1e-9);
        assert_eq!(rows[1].provision_to_recover, Some(12.0));
    }

    #[test]
    fn test_sentinel_row_always_excluded() {
        let mut t = table(&["Date", "Dépense"], &[&["9999-12-31", "10 EUR"], &["2023-01-01", "1 EUR"]]);
        t.tag_file_year(2023);
        let cleaned = TableCleaner::new(["Date", "Dépense"]).clean(t).unwrap();
        assert_eq!(cleaned.frame.len(), 1);
        assert_eq!(cleaned.frame.get(0, "Dépense"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_sentinel_row_ignores_placeholder_values() {
        let t = table(
            &["Date", "Dépense", "Economie"],
            &[&["9999-12-31", "à définir", "Oui"], &["2023-01-01", "1 EUR", "False"]],
        );
        let cleaned = TableCleaner::new(["Date", "Dépense", "Economie"]).clean(t).unwrap();
        assert_eq!(cleaned.sentinel_rows, 1);
        assert!(cleaned.warnings.is_empty());
        assert_eq!(cleaned.frame.len(), 1);
        assert_eq!(cleaned.frame.get(0, "Dépense"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_warning_row_counts_dropped_placeholders() {
        let t = table(&["Date", "Economie"], &[&["9999-12-31", ""], &["2023-01-01", "Oui"]]);
        let cleaned = TableCleaner::new(["Date", "Economie"]).clean(t).unwrap();
        assert_eq!(cleaned.warnings.len(), 1);
        assert_eq!(cleaned.warnings[0].row, 1);
    }

    #[test]
    fn test_output_never_grows() {
        let t = full_table();
        let rows_in = t.len();
        let cleaned = TableCleaner::default().clean(t).unwrap();
        assert!(cleaned.frame.len() <= rows_in);
    }

    #[test]
    fn test_unparsable_currency_reports_cell() {
        let t = table(&["Date", "Dépense"], &[&["2023-01-01", "1 EUR"], &["2023-01-02", "douze EUR"]]);
        let err = TableCleaner::new(["Date", "Dépense"]).clean(t).unwrap_err();
        match err {
            ComptesError::NumericParse { row, column, value } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Dépense");
                assert_eq!(value, "douze EUR");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_date_reports_original_row() {
        let t = table(
            &["Date", "Dépense"],
            &[&["9999-12-31", ""], &["2023-01-01", ""], &["01/02/2023", ""]],
        );
        let err = TableCleaner::new(["Date"]).clean(t).unwrap_err();
        assert!(matches!(err, ComptesError::DateParse { row: 2, .. }));
    }

    #[test]
    fn test_unmapped_boolean_is_warning() {
        let t = table(&["Date", "Economie"], &[&["2023-01-01", "Oui"]]);
        let cleaned = TableCleaner::new(["Date", "Economie"]).clean(t).unwrap();
        assert_eq!(cleaned.frame.get(0, "Economie"), Some(&Value::Text("Oui".into())));
        assert_eq!(
            cleaned.warnings,
            vec![DataQualityWarning {
                row: 0,
                column: "Economie".into(),
                value: "Oui".into(),
            }]
        );
    }

    #[test]
    fn test_zero_provisions_kept_by_default() {
        let t = table(&["Date", "Dépense", "Provision à payer"], &[&["2023-01-01", "0 EUR", "0 EUR"]]);
        let cols = ["Date", "Dépense", "Provision à payer"];
        let kept = TableCleaner::new(cols).clean(t.clone()).unwrap();
        assert_eq!(kept.frame.get(0, "Provision à payer"), Some(&Value::Number(0.0)));

        let nulled = TableCleaner::new(cols).null_zero_provisions(true).clean(t).unwrap();
        assert_eq!(nulled.frame.get(0, "Provision à payer"), Some(&Value::Null));
        assert_eq!(nulled.frame.get(0, "Dépense"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn test_timestamped_rows() {
        let mut t = table(&["Date"], &[&["2023-01-01"], &["2023-01-02 08:00"], &[""]]);
        t.tag_file_year(2023);
        assert_eq!(timestamped_rows(&t), vec![(1, "2023-01-02 08:00".to_string(), "2023".to_string())]);
    }
}
