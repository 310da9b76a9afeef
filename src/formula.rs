//! Relative-reference shifting for formula text.
//!
//! A shared formula is stored once on its master cell; every other cell in
//! the group carries only `<f t="shared" si="N"/>` and means "the master's
//! formula, moved by my offset from the master". [`shift_references`]
//! produces that moved text so each cell can carry its own formula.
//!
//! Only A1 cell references are rewritten. String literals, quoted sheet
//! names, structured references (`Table1[Col]`), function names and error
//! literals are copied through. Whole-row and whole-column references
//! (`A:A`, `3:5`) are kept as they are.

use crate::cell_ref::{col_to_letter, parse_a1, A1Ref, MAX_COL, MAX_ROW};

/// Move every relative axis of every A1 reference in `formula` by
/// `rows`/`cols`. A reference pushed off the sheet becomes `#REF!`.
#[must_use]
pub fn shift_references(formula: &str, rows: i64, cols: i64) -> String {
    let mut out = String::with_capacity(formula.len());
    let mut rest = formula;

    while let Some(ch) = rest.chars().next() {
        let len = match ch {
            '"' | '\'' => quoted_len(rest, ch),
            '[' => bracket_len(rest),
            c if is_token_char(c) => {
                let len = rest.find(|c: char| !is_token_char(c)).unwrap_or(rest.len());
                let (token, after) = rest.split_at(len);
                match after.chars().next() {
                    // Function name or sheet qualifier.
                    Some('(' | '!') => out.push_str(token),
                    _ => out.push_str(&shift_token(token, rows, cols)),
                }
                rest = after;
                continue;
            }
            c => c.len_utf8(),
        };
        let (head, tail) = rest.split_at(len);
        out.push_str(head);
        rest = tail;
    }

    out
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '$' | '_' | '.')
}

fn shift_token(token: &str, rows: i64, cols: i64) -> String {
    let Some(reference) = parse_a1(token) else {
        return token.to_string();
    };
    match moved(reference, rows, cols) {
        Some(r) => format!(
            "{}{}{}{}",
            if r.col_absolute { "$" } else { "" },
            col_to_letter(r.col),
            if r.row_absolute { "$" } else { "" },
            u64::from(r.row) + 1
        ),
        None => "#REF!".to_string(),
    }
}

fn moved(reference: A1Ref, rows: i64, cols: i64) -> Option<A1Ref> {
    let axis = |value: u32, absolute: bool, delta: i64, max: u32| -> Option<u32> {
        if absolute {
            return Some(value);
        }
        let target = i64::from(value).checked_add(delta)?;
        u32::try_from(target).ok().filter(|&t| t <= max)
    };
    Some(A1Ref {
        row: axis(reference.row, reference.row_absolute, rows, MAX_ROW)?,
        col: axis(reference.col, reference.col_absolute, cols, MAX_COL)?,
        ..reference
    })
}

/// Byte length of a quoted run starting at `text`'s first character,
/// closing quote included. A doubled quote is an escaped quote.
fn quoted_len(text: &str, quote: char) -> usize {
    let mut chars = text.char_indices().skip(1).peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch != quote {
            continue;
        }
        if chars.peek().map(|&(_, next)| next) == Some(quote) {
            chars.next();
            continue;
        }
        return idx + ch.len_utf8();
    }
    text.len()
}

/// Byte length of a (possibly nested) `[...]` run.
fn bracket_len(text: &str) -> usize {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}
