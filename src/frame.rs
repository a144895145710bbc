use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput};

use crate::models::NormalizedAccountRow;
use crate::table::RectangularTable;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Integer(i64),
    Bool(bool),
    Date(NaiveDate),
}

impl Value {
    /// Empty strings become `Null`.
    pub fn text(raw: &str) -> Self {
        if raw.is_empty() {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// SQLite column affinity for this value.
    pub fn sql_type(&self) -> Option<&'static str> {
        match self {
            Value::Null => None,
            Value::Text(_) | Value::Date(_) => Some("TEXT"),
            Value::Number(_) => Some("REAL"),
            Value::Integer(_) | Value::Bool(_) => Some("INTEGER"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Number(n) => ToSqlOutput::from(*n),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::Date(d) => ToSqlOutput::from(d.format("%Y-%m-%d").to_string()),
        })
    }
}

/// Row-oriented typed table, ready for the bulk load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    #[cfg(test)]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    #[cfg(test)]
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row)?.get(idx)
    }

    /// Index of `name`, appending a null-filled column when it is missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Null);
        }
        self.columns.len() - 1
    }

    pub fn retain_columns(&mut self, keep: impl Fn(&str) -> bool) {
        let kept: Vec<bool> = self.columns.iter().map(|c| keep(c.as_str())).collect();
        let mut flags = kept.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&false));
        for row in &mut self.rows {
            let mut flags = kept.iter();
            row.retain(|_| *flags.next().unwrap_or(&false));
        }
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        for c in &mut self.columns {
            if c == from {
                *c = to.to_string();
            }
        }
    }

    /// Typed view over the account columns, by their persisted names.
    pub fn account_rows(&self) -> Vec<NormalizedAccountRow> {
        let col = |name: &str| self.column_index(name);
        let (date, description, expense, income) =
            (col("Date"), col("Description"), col("Dépense"), col("Recette"));
        let (category, account, saving, settled) =
            (col("Catégorie"), col("Compte"), col("Economie"), col("Réglé"));
        let (to_pay, to_recover, file_year, out_of_bound) = (
            col("Provision à payer"),
            col("Provision à récupérer"),
            col("File Year"),
            col("Date Out of Bound"),
        );

        self.rows
            .iter()
            .map(|row| {
                let at = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or(&NULL);
                let text = |idx: Option<usize>| at(idx).as_str().map(str::to_string);
                NormalizedAccountRow {
                    date: at(date).as_date(),
                    description: text(description),
                    expense: at(expense).as_f64(),
                    income: at(income).as_f64(),
                    category: text(category),
                    account: text(account),
                    is_saving: text(saving),
                    is_settled: text(settled),
                    provision_to_pay: at(to_pay).as_f64(),
                    provision_to_recover: at(to_recover).as_f64(),
                    file_year: at(file_year).as_i64(),
                    date_out_of_bound: at(out_of_bound).as_bool().unwrap_or(false),
                }
            })
            .collect()
    }
}

impl From<RectangularTable> for Frame {
    fn from(table: RectangularTable) -> Self {
        let width = table.header.len();
        Frame {
            columns: table.header,
            rows: table
                .rows
                .into_iter()
                .map(|r| {
                    let mut values: Vec<Value> = r.iter().map(|s| Value::text(s)).collect();
                    values.resize(width, Value::Null);
                    values
                })
                .collect(),
        }
    }
}
