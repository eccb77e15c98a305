//! In-memory worksheet produced by the layout pass and consumed by the writer.

use std::collections::BTreeMap;

use crate::spec::{EnumCellValue, SpecCellFormat, SpecSheetHorizontalMerge};
use crate::util::{derive_cell_address, parse_cell_address};

/// One cell of a [`SheetGrid`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecGridCell {
    /// Display value; the cached result when `formula` is set.
    pub value: EnumCellValue,
    /// Formula text without the leading `=`.
    pub formula: Option<String>,
    /// Accumulated format.
    pub format: SpecCellFormat,
}

/// Cells keyed by `(row 1-based, column 0-based)`, plus merges and widths.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetGrid {
    /// Worksheet name.
    pub name: String,
    dict_cells: BTreeMap<(usize, usize), SpecGridCell>,
    l_merges: Vec<SpecSheetHorizontalMerge>,
    dict_column_widths: BTreeMap<usize, f64>,
}

impl SheetGrid {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn cell_mut(&mut self, n_row: usize, n_idx_col: usize) -> &mut SpecGridCell {
        self.dict_cells.entry((n_row, n_idx_col)).or_default()
    }

    /// Set a value, keeping the cell format.
    pub fn set_value(&mut self, n_row: usize, n_idx_col: usize, value: EnumCellValue) {
        self.cell_mut(n_row, n_idx_col).value = value;
    }

    /// Overlay `patch` onto the cell format.
    pub fn patch_format(&mut self, n_row: usize, n_idx_col: usize, patch: &SpecCellFormat) {
        let cell = self.cell_mut(n_row, n_idx_col);
        cell.format = cell.format.merge(patch);
    }

    /// Attach a formula; the current value becomes its cached result.
    pub fn set_formula(&mut self, n_row: usize, n_idx_col: usize, formula: String) {
        self.cell_mut(n_row, n_idx_col).formula = Some(formula);
    }

    /// Record a horizontal merge.
    pub fn merge_row_cells(&mut self, merge: SpecSheetHorizontalMerge) {
        self.l_merges.push(merge);
    }

    pub fn set_column_width(&mut self, n_idx_col: usize, width: f64) {
        self.dict_column_widths.insert(n_idx_col, width);
    }

    pub fn cell(&self, n_row: usize, n_idx_col: usize) -> Option<&SpecGridCell> {
        self.dict_cells.get(&(n_row, n_idx_col))
    }

    /// Look a cell up by A1 address.
    pub fn cell_by_address(&self, address: &str) -> Option<&SpecGridCell> {
        let (n_row, n_idx_col) = parse_cell_address(address)?;
        self.cell(n_row, n_idx_col)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (&(usize, usize), &SpecGridCell)> {
        self.dict_cells.iter()
    }

    pub fn merges(&self) -> &[SpecSheetHorizontalMerge] {
        &self.l_merges
    }

    pub fn column_widths(&self) -> &BTreeMap<usize, f64> {
        &self.dict_column_widths
    }

    /// Formula text by A1 address.
    pub fn formulas(&self) -> BTreeMap<String, String> {
        self.dict_cells
            .iter()
            .filter_map(|((n_row, n_idx_col), cell)| {
                cell.formula
                    .as_ref()
                    .map(|formula| (derive_cell_address(*n_idx_col, *n_row), formula.clone()))
            })
            .collect()
    }
}
