// crates/citysearch-core/src/parse.rs

//! # Dataset Parser
//!
//! Reads the flat city file: one record per line,
//!
//! ```text
//! id,state_code,state_name,city,county,latitude,longitude[,population]
//! ```
//!
//! Fields may be double-quoted so they can contain the delimiter; `""`
//! inside a quoted field is a literal quote. Bad lines are skipped and
//! counted, never fatal.

use crate::model::{CityRecord, CitySet};
use crate::states;
use crate::text::parse_opt;
use tracing::debug;

/// Minimum number of fields a line needs to become a record.
pub const REQUIRED_FIELDS: usize = 7;

pub const DEFAULT_DELIMITER: char = ',';

/// Outcome of parsing a whole dataset.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    pub set: CitySet,
    /// Non-blank lines that could not become a record (including a header).
    pub skipped: usize,
    /// Well-formed lines dropped because their `(name, state_code)` was seen.
    pub duplicates: usize,
}

/// Splits one line into fields, honouring double quotes.
///
/// Fields are trimmed; quotes are removed.
///
/// ```rust
/// use citysearch_core::parse::split_fields;
///
/// let f = split_fields(r#"1,TX,Texas,"Austin, City of",Travis"#, ',');
/// assert_eq!(f, ["1", "TX", "Texas", "Austin, City of", "Travis"]);
/// ```
pub fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            // Only a leading quote opens a quoted field; elsewhere it is text.
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Turns one line into a record, or `None` when it is malformed.
pub fn parse_line(line: &str, delimiter: char) -> Option<CityRecord> {
    let fields = split_fields(line, delimiter);
    if fields.len() < REQUIRED_FIELDS {
        return None;
    }
    // The id is not kept, but a non-numeric one marks a header or junk row.
    fields[0].parse::<u64>().ok()?;

    let state_code = fields[1].to_ascii_uppercase();
    let name = fields[3].clone();
    if state_code.is_empty() || name.is_empty() {
        return None;
    }

    let state_name = if fields[2].is_empty() {
        states::state_name(&state_code)
            .unwrap_or_default()
            .to_string()
    } else {
        fields[2].clone()
    };

    Some(CityRecord {
        name,
        state_code,
        state_name,
        county: Some(fields[4].clone()).filter(|c| !c.is_empty()),
        population: fields.get(7).and_then(|p| parse_opt(p)),
        latitude: parse_opt(&fields[5]),
        longitude: parse_opt(&fields[6]),
    })
}

/// Parses a whole dataset, deduplicating as it goes.
pub fn parse_dataset(text: &str, delimiter: char) -> ParseReport {
    let mut report = ParseReport::default();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, delimiter) {
            Some(record) => {
                if !report.set.insert(record) {
                    report.duplicates += 1;
                }
            }
            None => {
                report.skipped += 1;
                debug!(line = line_no + 1, "skipping malformed city line");
            }
        }
    }
    report
}
