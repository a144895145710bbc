use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

/// Raw text that does not fit the format its column expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed(pub String);

fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s == "NaT"
}

pub fn strip_currency(raw: &str) -> &str {
    let s = raw.trim();
    let s = s
        .strip_suffix("EUR")
        .or_else(|| s.strip_suffix('€'))
        .unwrap_or(s);
    s.trim()
}

/// `"10 EUR"` → `Some(10.0)`; empty → `None`.
pub fn currency_to_number(raw: &str) -> Result<Option<f64>, Malformed> {
    let s = strip_currency(raw);
    if is_missing(s) {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| Malformed(raw.to_string()))
}

/// Reimbursement rate: plain number, or a percentage such as `70 %`.
pub fn parse_rate(raw: &str) -> Result<Option<f64>, Malformed> {
    let s = raw.trim();
    if is_missing(s) {
        return Ok(None);
    }
    let (s, scale) = match s.strip_suffix('%') {
        Some(rest) => (rest.trim(), 100.0),
        None => (s, 1.0),
    };
    s.replace(',', ".")
        .parse::<f64>()
        .map(|v| Some(v / scale))
        .map_err(|_| Malformed(raw.to_string()))
}

/// French-formatted number: `"1.234,56"` → `1234.56`.
pub fn locale_number(raw: &str) -> Result<Option<f64>, Malformed> {
    let s: String = strip_currency(raw)
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if is_missing(&s) {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| Malformed(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    True,
    False,
    /// Literal outside the mapped set, kept verbatim.
    Unmapped(String),
}

impl Flag {
    pub fn as_text(&self) -> &str {
        match self {
            Flag::True => "true",
            Flag::False => "false",
            Flag::Unmapped(s) => s,
        }
    }
}

pub fn clean_boolean(raw: &str) -> Flag {
    match raw.trim() {
        "" | "nan" | "False" | "false" | "0" => Flag::False,
        "True" | "true" | "1" => Flag::True,
        other => Flag::Unmapped(other.to_string()),
    }
}

/// Upper-case each letter that follows a non-letter, lower-case the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_letter = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if prev_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(c);
            prev_letter = false;
        }
    }
    out
}

fn timestamped_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\s.+").expect("static regex"))
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static regex"))
}

/// True for `YYYY-MM-DD` followed by whitespace and a trailing token,
/// e.g. `2023-05-01 12:00`.
pub fn is_timestamped_date(raw: &str) -> bool {
    timestamped_re().is_match(raw)
}

/// Parse the leading `YYYY-MM-DD` token; anything after whitespace or `T` is ignored.
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, Malformed> {
    let s = raw.trim();
    if is_missing(s) {
        return Ok(None);
    }
    let token = s
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or(s);
    if !date_re().is_match(token) {
        return Err(Malformed(raw.to_string()));
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| Malformed(raw.to_string()))
}

/// Tells "explicitly zero" apart from "not applicable". Not part of the
/// default cleaning sequence.
pub fn zero_to_null(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_to_number() {
        assert_eq!(currency_to_number("10 EUR"), Ok(Some(10.0)));
        assert_eq!(currency_to_number("0 EUR"), Ok(Some(0.0)));
        assert_eq!(currency_to_number("-12.5 EUR"), Ok(Some(-12.5)));
        assert_eq!(currency_to_number("800 €"), Ok(Some(800.0)));
        assert_eq!(currency_to_number("42"), Ok(Some(42.0)));
        assert_eq!(currency_to_number(""), Ok(None));
        assert_eq!(currency_to_number("  "), Ok(None));
    }

    #[test]
    fn test_currency_to_number_rejects_garbage() {
        assert_eq!(currency_to_number("dix EUR"), Err(Malformed("dix EUR".into())));
        assert!(currency_to_number("10,5 EUR").is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("0.7"), Ok(Some(0.7)));
        assert_eq!(parse_rate("70 %"), Ok(Some(0.7)));
        assert_eq!(parse_rate(""), Ok(None));
        assert!(parse_rate("beaucoup").is_err());
    }

    #[test]
    fn test_locale_number() {
        assert_eq!(locale_number("1.234,56"), Ok(Some(1234.56)));
        assert_eq!(locale_number("800"), Ok(Some(800.0)));
        assert_eq!(locale_number("-45,5"), Ok(Some(-45.5)));
        assert_eq!(locale_number("1.234,56 €"), Ok(Some(1234.56)));
        assert_eq!(locale_number(""), Ok(None));
        assert!(locale_number("n/a").is_err());
    }

    #[test]
    fn test_clean_boolean_mapping() {
        assert_eq!(clean_boolean(""), Flag::False);
        assert_eq!(clean_boolean("nan"), Flag::False);
        assert_eq!(clean_boolean("True"), Flag::True);
        assert_eq!(clean_boolean("1"), Flag::True);
        assert_eq!(clean_boolean("False"), Flag::False);
        assert_eq!(clean_boolean("0"), Flag::False);
        assert_eq!(clean_boolean("Oui"), Flag::Unmapped("Oui".into()));
    }

    #[test]
    fn test_clean_boolean_is_idempotent() {
        for raw in ["", "True", "False", "1", "0", "Oui"] {
            let once = clean_boolean(raw);
            assert_eq!(clean_boolean(once.as_text()), once, "{raw}");
        }
        assert_eq!(clean_boolean("true").as_text(), "true");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("good Bye"), "Good Bye");
        assert_eq!(title_case("ÉPICERIE"), "Épicerie");
        assert_eq!(title_case("santé/mutuelle"), "Santé/Mutuelle");
        assert_eq!(title_case("l'épicerie"), "L'Épicerie");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_title_case_is_idempotent() {
        for raw in ["Épicerie", "good Bye", "frais de port", "EDF-GDF"] {
            let once = title_case(raw);
            assert_eq!(title_case(&once), once);
        }
    }

    #[test]
    fn test_is_timestamped_date() {
        assert!(is_timestamped_date("2023-05-01 12:00"));
        assert!(is_timestamped_date("2023-05-01 00:00:00"));
        assert!(!is_timestamped_date("2023-05-01"));
        assert!(!is_timestamped_date("2023-05-01 "));
        assert!(!is_timestamped_date("01/05/2023 12:00"));
    }

    #[test]
    fn test_parse_date() {
        let d = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert_eq!(parse_date("2023-05-01"), Ok(Some(d)));
        assert_eq!(parse_date("2023-05-01 12:00"), Ok(Some(d)));
        assert_eq!(parse_date("2023-05-01T12:00:00"), Ok(Some(d)));
        assert_eq!(parse_date(""), Ok(None));
    }

    #[test]
    fn test_parse_date_is_exact() {
        assert!(parse_date("01/05/2023").is_err());
        assert!(parse_date("2023-5-1").is_err());
        assert!(parse_date("2023-02-30").is_err());
        assert!(parse_date("9999-99-99").is_err());
    }

    #[test]
    fn test_zero_to_null() {
        assert_eq!(zero_to_null(Some(0.0)), None);
        assert_eq!(zero_to_null(Some(-0.0)), None);
        assert_eq!(zero_to_null(Some(3.5)), Some(3.5));
        assert_eq!(zero_to_null(None), None);
    }
}
