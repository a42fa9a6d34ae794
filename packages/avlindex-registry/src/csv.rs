//! Flat-file interchange for citizens.
//!
//! Layout is one header line, `ID,Name,Sex,BirthDate`, followed by one citizen per
//! record with the birth date as `yyyy-mm-dd`. Fields holding a comma, a double
//! quote or a line break are wrapped in quotes, with inner quotes doubled.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::citizen::Citizen;
use crate::error::Result;

pub const HEADER: &str = "ID,Name,Sex,BirthDate";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A row that could not be turned into a citizen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedRow {
    /// 1-based line number in the file.
    pub line: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default)]
pub struct ImportReport {
    pub citizens: Vec<Citizen>,
    pub malformed: Vec<MalformedRow>,
}

impl ImportReport {
    pub fn skipped(&self) -> usize {
        self.malformed.len()
    }
}

pub fn export(path: impl AsRef<Path>, citizens: &[Citizen]) -> Result<()> {
    let mut out = String::with_capacity(HEADER.len() + 1 + citizens.len() * 48);
    out.push_str(HEADER);
    out.push('\n');
    for c in citizens {
        let date = c.birth_date.format(DATE_FORMAT).to_string();
        let fields = [c.id.as_str(), c.name.as_str(), c.sex.as_str(), date.as_str()];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_field(&mut out, field);
        }
        out.push('\n');
    }
    fs::write(path.as_ref(), out)?;
    tracing::debug!(path = %path.as_ref().display(), rows = citizens.len(), "csv exported");
    Ok(())
}

/// Reads citizens from `path`. A missing file yields an empty report; rows that do
/// not parse are skipped and listed in [`ImportReport::malformed`].
pub fn import(path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(ImportReport::default());
    }
    let content = fs::read_to_string(path)?;
    let report = parse(&content);
    tracing::debug!(
        path = %path.display(),
        rows = report.citizens.len(),
        skipped = report.skipped(),
        "csv imported"
    );
    Ok(report)
}

/// Parses CSV text; the first record is taken as the header and ignored. A quoted
/// field may span line breaks.
pub fn parse(content: &str) -> ImportReport {
    let mut report = ImportReport::default();
    let mut pending: Option<(usize, String)> = None;
    for (idx, raw) in content.split('\n').enumerate() {
        let (line, record) = match pending.take() {
            Some((line, mut record)) => {
                record.push('\n');
                record.push_str(raw);
                (line, record)
            }
            None => (idx + 1, raw.to_string()),
        };
        if inside_quotes(&record) {
            pending = Some((line, record));
            continue;
        }
        let record = record.trim_end_matches('\r');
        if line == 1 || record.trim().is_empty() {
            continue;
        }
        match parse_row(record) {
            Ok(citizen) => report.citizens.push(citizen),
            Err(reason) => report.malformed.push(MalformedRow { line, reason }),
        }
    }
    if let Some((line, _)) = pending {
        report.malformed.push(MalformedRow {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    report
}

/// Doubled quotes count twice, so an odd total means a quoted field is still open.
fn inside_quotes(record: &str) -> bool {
    record.matches('"').count() % 2 == 1
}

fn parse_row(line: &str) -> std::result::Result<Citizen, String> {
    let fields = split_fields(line)?;
    let [id, name, sex, date] = <[String; 4]>::try_from(fields)
        .map_err(|fields| format!("expected 4 fields, found {}", fields.len()))?;
    let birth_date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|e| format!("bad birth date '{date}': {e}"))?;
    Ok(Citizen::new(id.trim(), name, sex.trim(), birth_date))
}

fn push_field(out: &mut String, field: &str) {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\r' | '\n')) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn split_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        match (quoted, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            (true, '"') => {
                quoted = false;
                if !matches!(chars.peek(), None | Some(',')) {
                    return Err("text after closing quote".to_string());
                }
            }
            (false, '"') if current.is_empty() => quoted = true,
            (false, ',') => fields.push(std::mem::take(&mut current)),
            (_, ch) => current.push(ch),
        }
    }
    if quoted {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(current);
    Ok(fields)
}
