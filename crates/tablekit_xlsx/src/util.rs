//! Stateless helper utilities used by the layout engine and the writer.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::error::ExportError;
use crate::spec::SpecSheetHorizontalMerge;

////////////////////////////////////////////////////////////////////////////////
// #region ColumnLabels

/// Map a 0-based column position to its spreadsheet label (`0 -> A`, `26 -> AA`).
///
/// Bijective base-26, so there is no upper bound on the label length.
pub fn index_to_label(n_idx_col: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = n_idx_col as u128 + 1;
    while n_rest > 0 {
        let n_digit = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_digit as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// Inverse of [`index_to_label`]; `None` for empty or non-alphabetic text.
pub fn label_to_index(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut n_acc: usize = 0;
    for chr in label.chars() {
        if !chr.is_ascii_alphabetic() {
            return None;
        }
        let n_digit = (chr.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n_acc = n_acc.checked_mul(26)?.checked_add(n_digit)?;
    }
    Some(n_acc - 1)
}

/// A1-style address of a 0-based column and a 1-based row.
pub fn derive_cell_address(n_idx_col: usize, n_row: usize) -> String {
    format!("{}{n_row}", index_to_label(n_idx_col))
}

/// Split an A1-style address into `(row, col)`; row 1-based, column 0-based.
pub fn parse_cell_address(address: &str) -> Option<(usize, usize)> {
    let n_split = address.find(|chr: char| chr.is_ascii_digit())?;
    let (c_col, c_row) = address.split_at(n_split);
    let n_row = c_row.parse::<usize>().ok().filter(|n| *n > 0)?;
    Some((n_row, label_to_index(c_col)?))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name`, or `name__N` when already taken, and record the result.
pub fn derive_unique_sheet_name(
    name: &str,
    set_sheet_names_existing: &mut BTreeSet<String>,
) -> String {
    if !set_sheet_names_existing.contains(name) {
        set_sheet_names_existing.insert(name.to_string());
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if !set_sheet_names_existing.contains(&candidate) {
            set_sheet_names_existing.insert(candidate.clone());
            return candidate;
        }
        n_idx += 1;
    }
}

/// Convert a 1-based row number to the writer's 0-based row index.
pub fn cast_row_num(n_row: usize) -> Result<u32, ExportError> {
    if n_row == 0 || n_row > N_NROWS_EXCEL_MAX {
        return Err(ExportError::IndexOverflow(format!(
            "row number out of range: {n_row}"
        )));
    }
    u32::try_from(n_row - 1)
        .map_err(|_| ExportError::IndexOverflow(format!("row index overflow: {n_row}")))
}

/// Convert a 0-based column index to the writer's column type.
pub fn cast_col_num(n_idx_col: usize) -> Result<u16, ExportError> {
    if n_idx_col >= N_NCOLS_EXCEL_MAX {
        return Err(ExportError::IndexOverflow(format!(
            "column index out of range: {n_idx_col}"
        )));
    }
    u16::try_from(n_idx_col)
        .map_err(|_| ExportError::IndexOverflow(format!("column index overflow: {n_idx_col}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderMergeUtils

/// Plan merge spans `(start, end)` (inclusive, 0-based) for one header row.
///
/// A span is a run of >= 2 equal non-empty labels; empty labels break runs.
pub fn plan_row_merge_spans(row_labels: &[String]) -> Vec<(usize, usize)> {
    let mut l_spans = Vec::new();
    let n_cols = row_labels.len();
    let mut n_col_idx = 0;

    while n_col_idx < n_cols {
        let c_cell_val = &row_labels[n_col_idx];
        if c_cell_val.is_empty() {
            n_col_idx += 1;
            continue;
        }

        let mut n_col_idx_end = n_col_idx + 1;
        while n_col_idx_end < n_cols && row_labels[n_col_idx_end] == *c_cell_val {
            n_col_idx_end += 1;
        }

        if n_col_idx_end - n_col_idx > 1 {
            l_spans.push((n_col_idx, n_col_idx_end - 1));
        }
        n_col_idx = n_col_idx_end;
    }

    l_spans
}

/// Plan horizontal merges for every row of a header grid whose first row sits
/// at `n_row_first` (1-based). Rows are planned independently.
pub fn plan_horizontal_merges(
    header_grid: &[Vec<String>],
    n_row_first: usize,
) -> BTreeMap<usize, Vec<SpecSheetHorizontalMerge>> {
    let mut dict_horizontal_merges_map = BTreeMap::new();

    for (n_idx_row, v_str_current_row) in header_grid.iter().enumerate() {
        let n_row = n_row_first + n_idx_row;
        for (n_col_start, n_col_end) in plan_row_merge_spans(v_str_current_row) {
            dict_horizontal_merges_map
                .entry(n_row)
                .or_insert_with(Vec::new)
                .push(SpecSheetHorizontalMerge {
                    row_number: n_row,
                    col_idx_start: n_col_start,
                    col_idx_end: n_col_end,
                    text: v_str_current_row[n_col_start].clone(),
                });
        }
    }

    dict_horizontal_merges_map
}

/// Build lookup set of cells covered by a horizontal merge (excluding anchor).
pub fn derive_horizontal_merge_tracker(
    merges: &[SpecSheetHorizontalMerge],
) -> BTreeSet<(usize, usize)> {
    let mut set_merged_cells_tracker = BTreeSet::new();

    for merge in merges {
        for n_idx_col in (merge.col_idx_start + 1)..=merge.col_idx_end {
            set_merged_cells_tracker.insert((merge.row_number, n_idx_col));
        }
    }

    set_merged_cells_tracker
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
