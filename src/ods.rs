use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{ComptesError, Result};
use crate::models::{Cell, CellKind, Row};
use crate::sheet::Sheet;

const CONTENT_PART: &str = "content.xml";

pub fn read_ods(path: &Path) -> Result<Vec<Sheet>> {
    let load_err = |reason: String| ComptesError::DocumentLoad {
        path: path.display().to_string(),
        reason,
    };
    let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| load_err(e.to_string()))?;
    read_content(&mut archive).map_err(load_err)
}

fn read_content<R: Read + Seek>(archive: &mut ZipArchive<R>) -> std::result::Result<Vec<Sheet>, String> {
    let mut part = archive
        .by_name(CONTENT_PART)
        .map_err(|e| format!("missing {CONTENT_PART}: {e}"))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    parse_content_xml(&xml).map_err(|e| e.to_string())
}

// Parser state for the cell currently open. Paragraph text is collected while
// `in_cell` and outside any annotation.
#[derive(Default)]
struct CellBuilder {
    cell: Option<Cell>,
    paragraphs: Vec<String>,
    annotation_depth: usize,
    in_paragraph: bool,
}

impl CellBuilder {
    fn finish(&mut self) -> Option<Cell> {
        let mut cell = self.cell.take()?;
        cell.text = self.paragraphs.join("\n");
        self.paragraphs.clear();
        self.annotation_depth = 0;
        self.in_paragraph = false;
        if cell.kind == CellKind::Text && cell.text.is_empty() {
            cell.kind = CellKind::Empty;
        }
        Some(cell)
    }

    fn push_text(&mut self, text: &str) {
        if self.cell.is_none() || self.annotation_depth > 0 || !self.in_paragraph {
            return;
        }
        if let Some(last) = self.paragraphs.last_mut() {
            last.push_str(text);
        }
    }
}

struct RowBuilder {
    cells: Vec<Cell>,
    repeat: usize,
}

pub fn parse_content_xml(xml: &str) -> std::result::Result<Vec<Sheet>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut sheets: Vec<Sheet> = Vec::new();
    let mut current: Option<Sheet> = None;
    let mut row: Option<RowBuilder> = None;
    let mut cell = CellBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"table:table" => current = Some(Sheet::new(&attr(&e, b"table:name")?.unwrap_or_default())),
                b"table:table-row" => row = Some(start_row(&e)?),
                b"table:table-cell" | b"table:covered-table-cell" => cell.cell = Some(start_cell(&e)?),
                b"office:annotation" => cell.annotation_depth += 1,
                b"text:p" | b"text:h" if cell.cell.is_some() && cell.annotation_depth == 0 => {
                    cell.paragraphs.push(String::new());
                    cell.in_paragraph = true;
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"table:table-row" => {
                    let builder = start_row(&e)?;
                    if let Some(sheet) = current.as_mut() {
                        push_row(sheet, builder);
                    }
                }
                b"table:table-cell" | b"table:covered-table-cell" => {
                    let empty = start_cell(&e)?;
                    if let Some(r) = row.as_mut() {
                        r.cells.push(empty);
                    }
                }
                b"text:s" => {
                    let count = attr(&e, b"text:c")?
                        .and_then(|c| c.parse::<usize>().ok())
                        .unwrap_or(1);
                    cell.push_text(&" ".repeat(count));
                }
                b"text:tab" => cell.push_text("\t"),
                b"text:line-break" => cell.push_text("\n"),
                b"text:p" if cell.cell.is_some() && cell.annotation_depth == 0 => {
                    cell.paragraphs.push(String::new());
                }
                _ => {}
            },
            Event::Text(t) => {
                let text = t.unescape()?;
                cell.push_text(&text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t).into_owned();
                cell.push_text(&text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"table:table" => {
                    if let Some(sheet) = current.take() {
                        sheets.push(sheet);
                    }
                }
                b"table:table-row" => {
                    if let (Some(sheet), Some(builder)) = (current.as_mut(), row.take()) {
                        push_row(sheet, builder);
                    }
                }
                b"table:table-cell" | b"table:covered-table-cell" => {
                    if let (Some(finished), Some(r)) = (cell.finish(), row.as_mut()) {
                        r.cells.push(finished);
                    }
                }
                b"office:annotation" => cell.annotation_depth = cell.annotation_depth.saturating_sub(1),
                b"text:p" | b"text:h" => cell.in_paragraph = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets)
}

// Repeated rows are only expanded when they carry data; a blank row repeated
// a million times is sheet padding.
fn push_row(sheet: &mut Sheet, builder: RowBuilder) {
    let row = Row::new(builder.cells);
    let copies = if row.is_blank() { 1 } else { builder.repeat };
    for _ in 1..copies {
        sheet.rows.push(row.clone());
    }
    sheet.rows.push(row);
}

fn start_row(e: &BytesStart) -> std::result::Result<RowBuilder, quick_xml::Error> {
    let repeat = attr(e, b"table:number-rows-repeated")?
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    Ok(RowBuilder {
        cells: Vec::new(),
        repeat,
    })
}

fn start_cell(e: &BytesStart) -> std::result::Result<Cell, quick_xml::Error> {
    let repeat = attr(e, b"table:number-columns-repeated")?
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1);
    let value_type = attr(e, b"office:value-type")?.unwrap_or_default();

    let (kind, value) = match value_type.as_str() {
        "float" | "percentage" => (CellKind::Numeric, attr(e, b"office:value")?),
        "currency" => {
            let amount = attr(e, b"office:value")?;
            let currency = attr(e, b"office:currency")?;
            let value = match (amount, currency) {
                (Some(a), Some(c)) => Some(format!("{a} {c}")),
                (a, _) => a,
            };
            (CellKind::Numeric, value)
        }
        "date" => (
            CellKind::Date,
            attr(e, b"office:date-value")?.map(|d| d.replacen('T', " ", 1)),
        ),
        "time" => (CellKind::Date, attr(e, b"office:time-value")?),
        "boolean" => {
            let value = attr(e, b"office:boolean-value")?.map(|b| {
                if b == "true" { "True".to_string() } else { "False".to_string() }
            });
            (CellKind::Text, value)
        }
        "string" => (CellKind::Text, None),
        _ => (CellKind::Empty, None),
    };

    let mut cell = Cell::new(kind, "").repeated(repeat);
    if let Some(v) = value {
        cell = cell.with_value(v);
    }
    cell.style = attr(e, b"table:style-name")?;
    cell.validation = attr(e, b"table:content-validation-name")?;
    Ok(cell)
}

fn attr(e: &BytesStart, name: &[u8]) -> std::result::Result<Option<String>, quick_xml::Error> {
    match e.try_get_attribute(name)? {
        Some(a) => Ok(Some(a.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}
