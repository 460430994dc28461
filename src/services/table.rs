// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Delimited table parsing for export CSV files.
//!
//! Strava exports put free-text activity descriptions in their own column,
//! so quoted fields routinely contain commas, doubled quotes and raw
//! newlines. The parser walks the input once, character by character.

const QUOTE: char = '"';
const DELIMITER: char = ',';

/// Parse delimited text into rows of trimmed fields.
///
/// Rows whose fields are all empty are dropped. Columns carry no meaning
/// here; callers index fields by position.
pub fn parse_table(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                field.push(QUOTE);
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => {
                row.push(field.trim().to_string());
                field.clear();
            }
            '\r' | '\n' if !in_quotes => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_row(&mut rows, &mut row, &mut field);
            }
            _ => field.push(c),
        }
    }
    finish_row(&mut rows, &mut row, &mut field);

    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    if field.is_empty() && row.is_empty() {
        return;
    }
    row.push(field.trim().to_string());
    field.clear();
    let done = std::mem::take(row);
    if done.iter().any(|f| !f.is_empty()) {
        rows.push(done);
    }
}
