//! Utilities for parsing and printing Excel-style cell references.
//!
//! Two flavors of parsing live here. The lenient `parse_cell_ref*` helpers are
//! used by the xlsx reader on `r="B7"` attributes, where `$` markers never
//! appear and a bad value should degrade to a default. The strict
//! [`parse_a1`] keeps the `$` markers and rejects anything that is not a
//! single A1 reference; defined-name resolution relies on it.

/// Largest 0-based row index addressable in an xlsx worksheet.
pub const MAX_ROW: u32 = 1_048_575;

/// Largest 0-based column index addressable in an xlsx worksheet (`XFD`).
pub const MAX_COL: u32 = 16_383;

/// A single A1 reference with its per-axis `$` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Ref {
    pub row: u32,
    pub col: u32,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into (col, row) where col and row are 0-indexed.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for use when working with
/// raw XML attribute values (e.g., `attr.value` from quick-xml).
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            let upper = b.to_ascii_uppercase();
            col = col.saturating_mul(26).saturating_add(u32::from(upper - b'A') + 1);
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        }
    }

    if !saw_col || !saw_row {
        return None;
    }

    Some((col.saturating_sub(1), row.saturating_sub(1)))
}

/// Strictly parse one A1 reference such as `B7`, `$B7`, `B$7` or `$B$7`.
///
/// Returns `None` for anything else: whole-row/column references, `#REF!`,
/// trailing garbage, or coordinates outside the worksheet bounds.
pub fn parse_a1(text: &str) -> Option<A1Ref> {
    let bytes = text.trim().as_bytes();
    let mut pos = 0;

    let col_absolute = bytes.first() == Some(&b'$');
    if col_absolute {
        pos += 1;
    }

    let col_start = pos;
    let mut col: u32 = 0;
    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_alphabetic() {
            break;
        }
        col = col
            .checked_mul(26)?
            .checked_add(u32::from(b.to_ascii_uppercase() - b'A') + 1)?;
        pos += 1;
    }
    if pos == col_start || pos - col_start > 3 {
        return None;
    }

    let row_absolute = bytes.get(pos) == Some(&b'$');
    if row_absolute {
        pos += 1;
    }

    let row_start = pos;
    let mut row: u32 = 0;
    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            return None;
        }
        row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
        pos += 1;
    }
    if pos == row_start || row == 0 {
        return None;
    }

    let (row, col) = (row - 1, col - 1);
    if row > MAX_ROW || col > MAX_COL {
        return None;
    }

    Some(A1Ref {
        row,
        col,
        row_absolute,
        col_absolute,
    })
}

/// Parse one corner of a whole-row area (`$5` or `5` in `$5:$7`).
///
/// The column part is empty, so it comes back as relative column 0.
pub fn parse_a1_row(text: &str) -> Option<A1Ref> {
    let text = text.trim();
    let (row_absolute, digits) = match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row = digits.parse::<u32>().ok()?.checked_sub(1)?;
    if row > MAX_ROW {
        return None;
    }
    Some(A1Ref {
        row,
        col: 0,
        row_absolute,
        col_absolute: false,
    })
}

/// Split an optional sheet qualifier off a reference formula.
///
/// Handles a leading `=`, quoted sheet names (`'My Sheet'!A1`, with `''` as
/// an escaped quote) and bare names (`Sheet1!A1`).
pub fn split_sheet_ref(formula: &str) -> (Option<String>, &str) {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    if let Some(quoted) = formula.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if ch != '\'' {
                name.push(ch);
                continue;
            }
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            let rest = quoted.get(idx + 1..).unwrap_or("");
            return match rest.strip_prefix('!') {
                Some(reference) => (Some(name), reference),
                None => (None, formula),
            };
        }
        return (None, formula);
    }

    match formula.rsplit_once('!') {
        Some((sheet, reference)) => (Some(sheet.to_string()), reference),
        None => (None, formula),
    }
}

/// Convert a 0-based column index to its letter form (0 -> "A", 27 -> "AB").
pub fn col_to_letter(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Format a 0-based (row, col) pair as a relative A1 reference.
pub fn format_cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), u64::from(row) + 1)
}

/// Format a 0-based (row, col) pair as a fully absolute reference (`$A$1`).
pub fn format_absolute_ref(row: u32, col: u32) -> String {
    format!("${}${}", col_to_letter(col), u64::from(row) + 1)
}

/// Quote a sheet name for use in a reference formula when required.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}
