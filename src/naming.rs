//! Output filename templating.
//!
//! A template is a base name with optional tokens, matched case-insensitively
//! and replaced everywhere they occur:
//!
//! - `<YYMMDD>` → the date as two-digit year, month, and day: `251204`
//! - `<NO>` → the 1-based slice number, unpadded: `3`
//!
//! A template without `<NO>` gets `_NN` appended (two digits minimum) so names
//! stay unique within a batch:
//! - `img-<YYMMDD>-<NO>` → `img-251204-3.jpg`
//! - `slice` → `slice_01.png`

use crate::imaging::OutputFormat;
use chrono::{Datelike, NaiveDate};

const DATE_TOKEN: &str = "<yymmdd>";
const NUMBER_TOKEN: &str = "<no>";

/// Two-digit year, month, and day, zero-padded.
pub fn date_stamp(date: NaiveDate) -> String {
    format!(
        "{:02}{:02}{:02}",
        date.year().rem_euclid(100),
        date.month(),
        date.day()
    )
}

/// Replace every ASCII-case-insensitive occurrence of `token` (given in lowercase).
///
/// Returns `None` when the token does not occur.
fn replace_token(haystack: &str, token: &str, replacement: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `haystack`.
    let lower = haystack.to_ascii_lowercase();
    let mut matches = lower.match_indices(token).map(|(i, _)| i).peekable();
    matches.peek()?;

    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for start in matches {
        out.push_str(&haystack[last..start]);
        out.push_str(replacement);
        last = start + token.len();
    }
    out.push_str(&haystack[last..]);
    Some(out)
}

/// Expand a template for the slice at 1-based `index`, without extension.
pub fn expand_template(template: &str, index: usize, date: NaiveDate) -> String {
    let dated = replace_token(template, DATE_TOKEN, &date_stamp(date))
        .unwrap_or_else(|| template.to_string());

    match replace_token(&dated, NUMBER_TOKEN, &index.to_string()) {
        Some(numbered) => numbered,
        None => format!("{dated}_{index:02}"),
    }
}

/// Full output filename: expanded template plus the format's extension.
pub fn slice_filename(
    template: &str,
    index: usize,
    date: NaiveDate,
    format: OutputFormat,
) -> String {
    format!(
        "{}.{}",
        expand_template(template, index, date),
        format.extension()
    )
}
