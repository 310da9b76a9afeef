//! Compound row operations.

use super::CopyPolicy;
use crate::cell_ref::MAX_ROW;
use crate::error::{ReportError, Result};
use crate::types::{Grid, MergedRegion, Row, Selection};

/// Empty every row in the selection and drop the merged regions it fully
/// contains. Rows stay in place; absent rows stay absent.
pub fn clear_rows(grid: &mut Grid, selection: &Selection) {
    let (top, bottom) = (selection.top_row(), selection.bottom_row());
    let unmerged = grid.remove_merged_regions(|m| m.rows_within(top, bottom));
    for (_, row) in grid.rows.range_mut(top..=bottom) {
        *row = Row::default();
    }
    log::debug!(
        "cleared rows {top}..={bottom} of '{}' ({unmerged} merges removed)",
        grid.name
    );
}

/// Set the zero-height flag on every row in the selection, optionally
/// clearing it first. Missing rows are created to carry the flag.
pub fn hide_rows(grid: &mut Grid, selection: &Selection, with_clear: bool) {
    if with_clear {
        clear_rows(grid, selection);
    }
    let (top, bottom) = (selection.top_row(), selection.bottom_row());
    for idx in top..=bottom {
        grid.row_mut(idx).hidden = true;
    }
    log::debug!("hid rows {top}..={bottom} of '{}'", grid.name);
}

/// Open `count` blank blocks of the selection's height at its top row,
/// pushing the selected rows and everything below them down.
pub fn insert_rows(grid: &mut Grid, selection: &Selection, count: u32) -> Result<()> {
    let total = i64::from(selection.height()) * i64::from(count);
    grid.shift_rows(selection.top_row(), total)?;
    if count > 0 {
        log::debug!(
            "inserted {total} rows at row {} of '{}'",
            selection.top_row(),
            grid.name
        );
    }
    Ok(())
}

/// Append `count` copies of the selected rows directly below them.
///
/// Rows that followed the selection move down by `height * count`. Copy `i`
/// (0-based) starts at `bottom + 1 + i * height`.
pub fn copy_rows(
    grid: &mut Grid,
    selection: &Selection,
    count: u32,
    policy: CopyPolicy,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let (top, bottom) = (selection.top_row(), selection.bottom_row());
    let height = i64::from(selection.height());
    let total = height * i64::from(count);
    if i64::from(bottom) + total > i64::from(MAX_ROW) {
        return Err(ReportError::precondition(format!(
            "{count} copies of rows {top}..={bottom} do not fit in the sheet"
        )));
    }

    let source: Vec<(i64, Row)> = grid
        .rows
        .range(top..=bottom)
        .map(|(&idx, row)| (i64::from(idx - top), row.clone()))
        .collect();
    let regions: Vec<MergedRegion> = if policy.copies_merges() {
        grid.merges
            .iter()
            .filter(|m| m.rows_within(top, bottom))
            .copied()
            .collect()
    } else {
        Vec::new()
    };

    grid.shift_rows(bottom + 1, total)?;

    for copy in 0..i64::from(count) {
        let delta = (copy + 1) * height;
        for (offset, row) in &source {
            let dest = i64::from(top) + delta + offset;
            let dest = u32::try_from(dest)
                .map_err(|_| ReportError::precondition(format!("row {dest} out of range")))?;
            grid.rows.insert(dest, policy.copy_row(row));
        }
        grid.merges
            .extend(regions.iter().filter_map(|region| region.offset_rows(delta)));
    }

    log::debug!(
        "copied rows {top}..={bottom} of '{}' {count} times ({policy:?})",
        grid.name
    );
    Ok(())
}

/// Remove the selected rows and close the gap.
///
/// Fully contained merged regions and row breaks on the removed rows go
/// with them; later rows move up by the selection's height.
pub fn delete_rows(grid: &mut Grid, selection: &Selection) -> Result<()> {
    let (top, bottom) = (selection.top_row(), selection.bottom_row());
    let unmerged = grid.remove_merged_regions(|m| m.rows_within(top, bottom));
    grid.rows.retain(|idx, _| !(top..=bottom).contains(idx));
    grid.row_breaks.retain(|row| !(top..=bottom).contains(row));

    if let Some(base) = bottom.checked_add(1) {
        grid.shift_rows(base, -i64::from(selection.height()))?;
    }
    log::debug!(
        "deleted rows {top}..={bottom} of '{}' ({unmerged} merges removed)",
        grid.name
    );
    Ok(())
}
