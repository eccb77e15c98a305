//! Table layout orchestration.
//!
//! A sheet is laid out in two phases. The LAYOUT phase walks the tables in
//! declaration order and, per table, runs
//! `TITLE? -> HEADER? -> BODY -> HIERARCHY? -> BORDERS -> FILL? -> ROW_FORMULAS?
//! -> REGISTER -> NOTIFICATION? -> GAP`, advancing the row cursor held by
//! [`LayoutContext`]. The RESOLVE phase then rewrites the queued cross-table
//! cell formulas against the completed registry.

use std::collections::HashMap;

use crate::conf::{
    derive_num_format, C_NUM_FORMAT_GENERAL, N_GAP_BETWEEN_TABLES_DEFAULT, N_INDENT_PER_LEVEL,
};
use crate::error::ExportError;
use crate::formula::{
    derive_leaf_flags, plan_row_formulas, resolve_cross_table_formula, validate_row_formula,
};
use crate::grid::SheetGrid;
use crate::header::build_header_rows;
use crate::spec::{
    EnumCellInput, EnumTableData, SpecCellFormat, SpecCellStyle, SpecColumnDefinition,
    SpecExportReport, SpecLayoutFormats, SpecRecord, SpecRegisteredTable, SpecSheetReport, SpecTableContentRange, SpecTableRegistry, SpecTableSettingData,
    SpecWorkSheetSetting, TypeSheetData,
};
use crate::util::plan_horizontal_merges;

/// Cross-table formula waiting for the RESOLVE phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPendingCellFormula {
    /// 1-based row of the target cell.
    pub row_number: usize,
    /// 0-based column of the target cell.
    pub col_idx: usize,
    /// `{table,column,rowOffset}` template.
    pub template: String,
}

/// Mutable state of one sheet's layout pass.
#[derive(Debug, Clone)]
pub struct LayoutContext {
    /// Next free row (1-based); never decreases.
    pub n_row_cursor: usize,
    /// Content ranges of the tables laid out so far.
    pub registry: SpecTableRegistry,
    /// Cross-table formulas queued during LAYOUT.
    pub l_pending_cell_formulas: Vec<SpecPendingCellFormula>,
    /// Blank rows after each table.
    pub n_gap_between_tables: usize,
    /// Width of rows-only table columns.
    pub column_width: Option<f64>,
    /// Named formats.
    pub formats: SpecLayoutFormats,
}

impl LayoutContext {
    pub fn new(n_row_start: usize, formats: SpecLayoutFormats) -> Self {
        Self {
            n_row_cursor: n_row_start,
            registry: SpecTableRegistry::default(),
            l_pending_cell_formulas: vec![],
            n_gap_between_tables: N_GAP_BETWEEN_TABLES_DEFAULT,
            column_width: None,
            formats,
        }
    }

    /// Context for a sheet, with the sheet's gap and column width.
    pub fn from_sheet_setting(
        sheet_setting: &SpecWorkSheetSetting,
        formats: SpecLayoutFormats,
    ) -> Result<Self, ExportError> {
        if sheet_setting.starting_row_number == 0 {
            return Err(ExportError::InvalidSheetSetting {
                sheet: sheet_setting.sheet_name.clone(),
                reason: "startingRowNumber is 1-based and must be >= 1".to_string(),
            });
        }

        let mut ctx = Self::new(sheet_setting.starting_row_number, formats);
        ctx.n_gap_between_tables = sheet_setting
            .gap_between_two_tables
            .unwrap_or(N_GAP_BETWEEN_TABLES_DEFAULT);
        ctx.column_width = sheet_setting.column_width;
        Ok(ctx)
    }

    fn border(&self, edges: &[EnumBorderEdge]) -> SpecCellFormat {
        let n_style = Some(self.formats.border_style);
        let mut cfg = SpecCellFormat::default();
        for edge in edges {
            match edge {
                EnumBorderEdge::Top => cfg.top = n_style,
                EnumBorderEdge::Bottom => cfg.bottom = n_style,
                EnumBorderEdge::Left => cfg.left = n_style,
                EnumBorderEdge::Right => cfg.right = n_style,
            }
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy)]
enum EnumBorderEdge {
    Top,
    Bottom,
    Left,
    Right,
}

////////////////////////////////////////////////////////////////////////////////
// #region TableLayout

/// Lay out one table at the cursor and register its content range.
pub fn layout_table(
    ctx: &mut LayoutContext,
    grid: &mut SheetGrid,
    table_name: &str,
    setting: &SpecTableSettingData,
    data: Option<&EnumTableData>,
    report: &mut SpecExportReport,
) -> Result<SpecRegisteredTable, ExportError> {
    if let Some(title) = setting.table_title.as_deref() {
        grid.set_value(ctx.n_row_cursor, 0, title.into());
        grid.patch_format(ctx.n_row_cursor, 0, &ctx.formats.title);
        ctx.n_row_cursor += 1;
    }

    let table = match setting.header_definition.as_deref() {
        Some(columns) => {
            layout_headered_table(ctx, grid, table_name, setting, columns, data, report)?
        }
        None => layout_rows_only_table(ctx, grid, table_name, setting)?,
    };

    if let Some(notification) = setting.notification.as_deref() {
        grid.set_value(ctx.n_row_cursor, 0, notification.into());
        grid.patch_format(ctx.n_row_cursor, 0, &ctx.formats.notification);
        ctx.n_row_cursor += 1;
    }
    ctx.n_row_cursor += ctx.n_gap_between_tables;

    log::debug!(
        "table {table_name:?}: body rows [{}, {}), cursor now {}",
        table.range.start,
        table.range.end,
        ctx.n_row_cursor
    );
    Ok(table)
}

fn derive_table_records<'a>(
    table_name: &str,
    data: Option<&'a EnumTableData>,
) -> Result<&'a [SpecRecord], ExportError> {
    match data {
        None => Ok(&[][..]),
        Some(EnumTableData::Rows(records)) => Ok(records.as_slice()),
        Some(EnumTableData::Record(_)) => Err(ExportError::TableDataMismatch {
            table: table_name.to_string(),
            expected: "a list of records".to_string(),
            found: "a single record".to_string(),
        }),
    }
}

fn validate_table_definition(
    table_name: &str,
    columns: &[SpecColumnDefinition],
    records: &[SpecRecord],
) -> Result<(), ExportError> {
    let n_hierarchy = columns.iter().filter(|column| column.hierarchy).count();
    if n_hierarchy > 1 {
        return Err(ExportError::MultipleHierarchyColumns {
            table: table_name.to_string(),
            count: n_hierarchy,
        });
    }

    for column in columns {
        if let Some(template) = column.row_formula.as_deref() {
            validate_row_formula(table_name, template, columns)?;
        }
    }

    for record in records {
        let Some(parent_id) = record.parent_id.as_deref() else {
            continue;
        };
        if !records.iter().any(|r| r.id.as_deref() == Some(parent_id)) {
            return Err(ExportError::UnknownParentId {
                table: table_name.to_string(),
                parent_id: parent_id.to_string(),
            });
        }
    }
    validate_hierarchy_acyclic(table_name, records)
}

/// Every parent chain must reach a root within `records.len()` hops without
/// revisiting its start record.
fn validate_hierarchy_acyclic(
    table_name: &str,
    records: &[SpecRecord],
) -> Result<(), ExportError> {
    let dict_parents: HashMap<&str, Option<&str>> = records
        .iter()
        .filter_map(|record| Some((record.id.as_deref()?, record.parent_id.as_deref())))
        .collect();

    for record in records {
        let Some(id) = record.id.as_deref() else {
            continue;
        };
        let mut parent = record.parent_id.as_deref();
        let mut n_hops = 0usize;
        while let Some(parent_id) = parent {
            n_hops += 1;
            if parent_id == id || n_hops > records.len() {
                return Err(ExportError::HierarchyCycle {
                    table: table_name.to_string(),
                    id: id.to_string(),
                });
            }
            parent = dict_parents.get(parent_id).copied().flatten();
        }
    }
    Ok(())
}

/// Body format of a column: alignment or number format, then the column patch.
pub fn derive_column_body_format(
    column: &SpecColumnDefinition,
    formats: &SpecLayoutFormats,
) -> SpecCellFormat {
    let mut cfg = match column.data_type {
        None => formats.untyped_column.clone(),
        Some(data_type) => SpecCellFormat {
            num_format: derive_num_format(Some(data_type)).map(ToString::to_string),
            ..Default::default()
        },
    };
    if let Some(patch) = &column.style {
        cfg = cfg.merge(patch);
    }
    cfg
}

fn layout_headered_table(
    ctx: &mut LayoutContext,
    grid: &mut SheetGrid,
    table_name: &str,
    setting: &SpecTableSettingData,
    columns: &[SpecColumnDefinition],
    data: Option<&EnumTableData>,
    report: &mut SpecExportReport,
) -> Result<SpecRegisteredTable, ExportError> {
    let records = derive_table_records(table_name, data)?;
    validate_table_definition(table_name, columns, records)?;
    let n_cols = columns.len();

    // HEADER
    let header = build_header_rows(table_name, columns, &setting.header_groups)?;
    for key in &header.unknown_group_keys {
        report.warn(format!(
            "table {table_name:?}: group key {key:?} matches no header group"
        ));
    }

    let n_row_header_first = ctx.n_row_cursor;
    let cfg_top = ctx.border(&[EnumBorderEdge::Top]);
    let cfg_bottom = ctx.border(&[EnumBorderEdge::Bottom]);
    for (n_idx_level, l_entries) in header.rows.iter().enumerate() {
        let n_row = n_row_header_first + n_idx_level;
        for (n_idx_col, entry) in l_entries.iter().enumerate() {
            if n_idx_level == 0 {
                grid.patch_format(n_row, n_idx_col, &cfg_top);
            }
            let Some(entry) = entry else {
                continue;
            };
            if entry.name().is_empty() {
                continue;
            }
            grid.set_value(n_row, n_idx_col, entry.name().into());
            grid.patch_format(n_row, n_idx_col, &ctx.formats.header);
            if let Some(patch) = entry.header_style() {
                grid.patch_format(n_row, n_idx_col, patch);
            }
            grid.patch_format(n_row, n_idx_col, &cfg_bottom);
        }
    }
    for merge in plan_horizontal_merges(&header.labels(), n_row_header_first)
        .into_values()
        .flatten()
    {
        grid.merge_row_cells(merge);
    }

    let l_column_formats: Vec<SpecCellFormat> = columns
        .iter()
        .map(|column| derive_column_body_format(column, &ctx.formats))
        .collect();
    for (n_idx_col, column) in columns.iter().enumerate() {
        if let Some(width) = column.width {
            grid.set_column_width(n_idx_col, width);
        }
    }
    ctx.n_row_cursor += header.height();

    // BODY
    let n_row_start = ctx.n_row_cursor;
    let n_rows = records.len();
    for (n_idx_row, record) in records.iter().enumerate() {
        let n_row = n_row_start + n_idx_row;
        for (n_idx_col, column) in columns.iter().enumerate() {
            grid.patch_format(n_row, n_idx_col, &l_column_formats[n_idx_col]);
            if let Some(input) = record.get(&column.key) {
                write_cell_input(ctx, grid, n_row, n_idx_col, input);
            }
        }
        write_body_row_borders(ctx, grid, n_row, n_idx_row, n_rows, n_cols);
    }

    // HIERARCHY
    let n_idx_hierarchy = columns.iter().position(|column| column.hierarchy);
    if let Some(n_idx_col) = n_idx_hierarchy {
        for (n_idx_row, record) in records.iter().enumerate() {
            let n_level = record.level.unwrap_or(0);
            let mut cfg = ctx.formats.hierarchy.clone();
            if n_level > 0 {
                let n_indent = n_level.saturating_mul(N_INDENT_PER_LEVEL);
                cfg.indent = Some(u8::try_from(n_indent).unwrap_or(u8::MAX));
            }
            grid.patch_format(n_row_start + n_idx_row, n_idx_col, &cfg);
        }
    }

    // BORDERS
    let cfg_vertical = ctx.border(&[EnumBorderEdge::Left, EnumBorderEdge::Right]);
    for n_row in n_row_header_first..n_row_start + n_rows {
        for n_idx_col in 0..n_cols {
            grid.patch_format(n_row, n_idx_col, &cfg_vertical);
        }
    }

    // FILL
    let l_leaf_flags = derive_leaf_flags(records, n_idx_hierarchy.is_some());
    for (n_idx_col, column) in columns.iter().enumerate() {
        if !column.editable {
            continue;
        }
        for (n_idx_row, if_leaf) in l_leaf_flags.iter().enumerate() {
            if *if_leaf {
                grid.patch_format(n_row_start + n_idx_row, n_idx_col, &ctx.formats.editable);
            }
        }
    }

    // ROW_FORMULAS
    for planned in plan_row_formulas(table_name, columns, records, n_row_start)? {
        grid.set_formula(planned.row_number, planned.col_idx, planned.formula);
    }

    Ok(register_table(
        ctx,
        table_name,
        n_rows,
        Some(columns.iter().map(|column| column.key.clone()).collect()),
        n_cols,
    ))
}

fn layout_rows_only_table(
    ctx: &mut LayoutContext,
    grid: &mut SheetGrid,
    table_name: &str,
    setting: &SpecTableSettingData,
) -> Result<SpecRegisteredTable, ExportError> {
    let rows = setting
        .rows_definition
        .as_deref()
        .ok_or_else(|| ExportError::MissingRowsDefinition {
            table: table_name.to_string(),
        })?;
    let n_cols = rows.iter().map(Vec::len).max().unwrap_or(0);

    if let Some(width) = ctx.column_width {
        for n_idx_col in 0..n_cols {
            grid.set_column_width(n_idx_col, width);
        }
    }

    let n_row_start = ctx.n_row_cursor;
    for (n_idx_row, l_inputs) in rows.iter().enumerate() {
        let n_row = n_row_start + n_idx_row;
        for (n_idx_col, input) in l_inputs.iter().enumerate() {
            write_cell_input(ctx, grid, n_row, n_idx_col, input);
        }
        write_body_row_borders(ctx, grid, n_row, n_idx_row, rows.len(), n_cols);
    }

    Ok(register_table(ctx, table_name, rows.len(), None, n_cols))
}

fn write_cell_input(
    ctx: &mut LayoutContext,
    grid: &mut SheetGrid,
    n_row: usize,
    n_idx_col: usize,
    input: &EnumCellInput,
) {
    let value = input.value();
    if !value.is_none() {
        grid.set_value(n_row, n_idx_col, value.clone());
    }
    if let Some(style) = input.style() {
        apply_cell_style(ctx, grid, n_row, n_idx_col, style);
    }
}

/// Per-cell style: number format, font, and a queued cross-table formula.
fn apply_cell_style(
    ctx: &mut LayoutContext,
    grid: &mut SheetGrid,
    n_row: usize,
    n_idx_col: usize,
    style: &SpecCellStyle,
) {
    if let Some(data_type) = style.data_type {
        let c_num_format = derive_num_format(Some(data_type)).unwrap_or(C_NUM_FORMAT_GENERAL);
        grid.patch_format(
            n_row,
            n_idx_col,
            &SpecCellFormat {
                num_format: Some(c_num_format.to_string()),
                ..Default::default()
            },
        );
    }
    if let Some(font) = &style.font {
        grid.patch_format(n_row, n_idx_col, &font.to_format());
    }
    if let Some(template) = &style.cell_formula {
        ctx.l_pending_cell_formulas.push(SpecPendingCellFormula {
            row_number: n_row,
            col_idx: n_idx_col,
            template: template.clone(),
        });
    }
}

fn write_body_row_borders(
    ctx: &LayoutContext,
    grid: &mut SheetGrid,
    n_row: usize,
    n_idx_row: usize,
    n_rows: usize,
    n_cols: usize,
) {
    let mut l_edges = Vec::with_capacity(2);
    if n_idx_row == 0 {
        l_edges.push(EnumBorderEdge::Top);
    }
    if n_idx_row + 1 == n_rows {
        l_edges.push(EnumBorderEdge::Bottom);
    }
    if l_edges.is_empty() {
        return;
    }
    let cfg = ctx.border(&l_edges);
    for n_idx_col in 0..n_cols {
        grid.patch_format(n_row, n_idx_col, &cfg);
    }
}

fn register_table(
    ctx: &mut LayoutContext,
    table_name: &str,
    n_rows: usize,
    column_keys: Option<Vec<String>>,
    n_cols: usize,
) -> SpecRegisteredTable {
    let n_row_start = ctx.n_row_cursor;
    let table = SpecRegisteredTable {
        name: table_name.to_string(),
        range: SpecTableContentRange {
            start: n_row_start,
            end: n_row_start + n_rows,
        },
        column_keys,
        width: n_cols,
    };
    ctx.registry.register(table.clone());
    ctx.n_row_cursor = table.range.end;
    table
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetLayout

/// RESOLVE phase: rewrite every queued cross-table formula. Returns the count.
pub fn resolve_pending_formulas(
    ctx: &mut LayoutContext,
    grid: &mut SheetGrid,
) -> Result<usize, ExportError> {
    let l_pending = std::mem::take(&mut ctx.l_pending_cell_formulas);
    for pending in &l_pending {
        let formula = resolve_cross_table_formula(&pending.template, &ctx.registry)?;
        grid.set_formula(pending.row_number, pending.col_idx, formula);
    }
    Ok(l_pending.len())
}

/// Lay out every table of one sheet, then resolve its cross-table formulas.
pub fn layout_sheet(
    sheet_setting: &SpecWorkSheetSetting,
    data: Option<&TypeSheetData>,
    formats: &SpecLayoutFormats,
    report: &mut SpecExportReport,
) -> Result<(SheetGrid, SpecSheetReport), ExportError> {
    let mut ctx = LayoutContext::from_sheet_setting(sheet_setting, formats.clone())?;
    let mut grid = SheetGrid::new(&sheet_setting.sheet_name);

    for named in &sheet_setting.table_settings {
        let table_data = data.and_then(|dict_data| dict_data.get(&named.name));
        let setting = named.setting.resolve(table_data);
        layout_table(&mut ctx, &mut grid, &named.name, &setting, table_data, report)?;
    }

    if let Some(dict_data) = data {
        for name in dict_data.keys() {
            if ctx.registry.get(name).is_none() {
                report.warn(format!(
                    "sheet {:?}: data for {name:?} has no table setting",
                    sheet_setting.sheet_name
                ));
            }
        }
    }

    let cnt_cross_table_formulas = resolve_pending_formulas(&mut ctx, &mut grid)?;
    log::info!(
        "sheet {:?}: {} tables, {} cross-table formulas",
        sheet_setting.sheet_name,
        ctx.registry.tables().len(),
        cnt_cross_table_formulas
    );

    let sheet_report = SpecSheetReport {
        sheet_name: sheet_setting.sheet_name.clone(),
        tables: ctx.registry.tables().to_vec(),
        merges: grid.merges().to_vec(),
        cnt_cross_table_formulas,
    };
    Ok((grid, sheet_report))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnumErrorKind;
    use crate::spec::{
        EnumCellValue, EnumDataType, EnumTableSetting, SpecFontStyle, SpecHeaderGroup,
        SpecTableContentRange,
    };
    use pretty_assertions::assert_eq;

    fn derive_score_setting() -> SpecTableSettingData {
        SpecTableSettingData {
            table_title: Some("Score".to_string()),
            header_groups: vec![
                SpecHeaderGroup::new("void", "", None),
                SpecHeaderGroup::new("science", "Science", None),
            ],
            header_definition: Some(vec![
                SpecColumnDefinition::new("name", "Name"),
                SpecColumnDefinition::new("sum", "SUM")
                    .with_group("void")
                    .with_row_formula("{math}+{physics}"),
                SpecColumnDefinition::new("math", "Math").with_group("science"),
                SpecColumnDefinition::new("physics", "Physics").with_group("science"),
            ]),
            notification: Some("check me".to_string()),
            ..Default::default()
        }
    }

    fn derive_score_rows() -> EnumTableData {
        EnumTableData::Rows(vec![
            SpecRecord::from_cells([
                ("name", EnumCellInput::from("Jack")),
                ("math", EnumCellInput::from(1.0)),
                ("physics", EnumCellInput::from(2.0)),
            ]),
            SpecRecord::from_cells([
                ("name", EnumCellInput::from("Peter")),
                ("math", EnumCellInput::from(2.0)),
                ("physics", EnumCellInput::from(2.0)),
            ]),
        ])
    }

    #[test]
    fn test_headered_table_walks_all_phases() {
        let mut ctx = LayoutContext::new(2, SpecLayoutFormats::default());
        let mut grid = SheetGrid::new("s");
        let mut report = SpecExportReport::default();
        let data = derive_score_rows();

        let table = layout_table(
            &mut ctx,
            &mut grid,
            "scores",
            &derive_score_setting(),
            Some(&data),
            &mut report,
        )
        .unwrap();

        // title 2, header 3..=4, body 5..=6, notification 7, gap 4
        assert_eq!(table.range, SpecTableContentRange { start: 5, end: 7 });
        assert_eq!(ctx.n_row_cursor, 12);
        assert_eq!(grid.cell_by_address("A2").unwrap().value, EnumCellValue::from("Score"));
        assert_eq!(grid.cell_by_address("A7").unwrap().value, EnumCellValue::from("check me"));
        assert_eq!(grid.cell_by_address("C3").unwrap().value, EnumCellValue::from("Science"));
        assert_eq!(grid.cell_by_address("B4").unwrap().value, EnumCellValue::from("SUM"));

        let dict_formulas = grid.formulas();
        assert_eq!(dict_formulas["B5"], "C5+D5");
        assert_eq!(dict_formulas["B6"], "C6+D6");
        assert_eq!(grid.merges().len(), 1);
        assert_eq!(grid.merges()[0].row_number, 3);
        assert_eq!((grid.merges()[0].col_idx_start, grid.merges()[0].col_idx_end), (2, 3));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_header_and_body_borders() {
        let mut ctx = LayoutContext::new(1, SpecLayoutFormats::default());
        let mut grid = SheetGrid::new("s");
        let mut report = SpecExportReport::default();
        let data = derive_score_rows();
        let mut setting = derive_score_setting();
        setting.table_title = None;
        setting.notification = None;

        layout_table(&mut ctx, &mut grid, "t", &setting, Some(&data), &mut report).unwrap();

        // blank header cell on the first header row: top border only, no header style
        let cell = grid.cell_by_address("A1").unwrap();
        assert_eq!(cell.format.top, Some(1));
        assert_eq!(cell.format.bold, None);
        assert_eq!(cell.format.left, Some(1));

        let cell = grid.cell_by_address("C1").unwrap();
        assert_eq!(cell.format.bold, Some(true));
        assert_eq!(cell.format.bottom, Some(1));

        // first body row top, last body row bottom
        assert_eq!(grid.cell_by_address("D3").unwrap().format.top, Some(1));
        assert_eq!(grid.cell_by_address("D4").unwrap().format.bottom, Some(1));
        assert_eq!(grid.cell_by_address("D4").unwrap().format.right, Some(1));
        assert_eq!(grid.cell_by_address("A3").unwrap().format.align.as_deref(), Some("center"));
    }

    #[test]
    fn test_hierarchy_indent_fill_and_self_sum() {
        let mut name = SpecColumnDefinition::new("name", "Name");
        name.hierarchy = true;
        let mut amount = SpecColumnDefinition::new("amount", "Amount")
            .with_data_type(EnumDataType::Number);
        amount.self_sum = true;
        amount.editable = true;
        let setting = SpecTableSettingData {
            header_definition: Some(vec![name, amount]),
            ..Default::default()
        };
        let data = EnumTableData::Rows(vec![
            SpecRecord::from_cells([("name", "Total")]).with_node("1", None, 0),
            SpecRecord::from_cells([("name", EnumCellInput::from("A")), ("amount", EnumCellInput::from(3.0))])
                .with_node("2", Some("1"), 1),
            SpecRecord::from_cells([("name", EnumCellInput::from("B")), ("amount", EnumCellInput::from(4.0))])
                .with_node("3", Some("1"), 1),
        ]);

        let mut ctx = LayoutContext::new(1, SpecLayoutFormats::default());
        let mut grid = SheetGrid::new("s");
        let mut report = SpecExportReport::default();
        layout_table(&mut ctx, &mut grid, "t", &setting, Some(&data), &mut report).unwrap();

        assert_eq!(grid.formulas()["B2"], "B3+B4");
        assert_eq!(grid.cell_by_address("A2").unwrap().format.indent, None);
        assert_eq!(grid.cell_by_address("A3").unwrap().format.indent, Some(2));
        assert_eq!(grid.cell_by_address("A3").unwrap().format.align.as_deref(), Some("left"));
        assert_eq!(grid.cell_by_address("B2").unwrap().format.bg_color, None);
        assert_eq!(
            grid.cell_by_address("B3").unwrap().format.bg_color.as_deref(),
            Some("#FFFF00")
        );
        assert_eq!(
            grid.cell_by_address("B3").unwrap().format.num_format.as_deref(),
            Some("#,##0.00")
        );
    }

    #[test]
    fn test_rows_only_table_and_deferred_cross_table_formula() {
        let summary = SpecTableSettingData {
            rows_definition: Some(vec![vec![
                EnumCellInput::from("Total"),
                EnumCellInput::Styled {
                    value: EnumCellValue::Number(0.0),
                    style: SpecCellStyle {
                        data_type: Some(EnumDataType::Number),
                        font: Some(SpecFontStyle {
                            bold: Some(true),
                            ..Default::default()
                        }),
                        cell_formula: Some("{later,2,1}+{later,2,-1}".to_string()),
                    },
                },
            ]]),
            ..Default::default()
        };
        let later = SpecTableSettingData {
            rows_definition: Some(vec![
                vec![EnumCellInput::from("x"), EnumCellInput::from(1.0)],
                vec![EnumCellInput::from("y"), EnumCellInput::from(2.0)],
            ]),
            ..Default::default()
        };
        let mut sheet = SpecWorkSheetSetting::new("s", 3)
            .with_table("summary", EnumTableSetting::Static(summary))
            .with_table("later", EnumTableSetting::Static(later));
        sheet.gap_between_two_tables = Some(1);
        sheet.column_width = Some(18.0);

        let mut report = SpecExportReport::default();
        let (grid, sheet_report) =
            layout_sheet(&sheet, None, &SpecLayoutFormats::default(), &mut report).unwrap();

        assert_eq!(sheet_report.tables[0].range, SpecTableContentRange { start: 3, end: 4 });
        assert_eq!(sheet_report.tables[1].range, SpecTableContentRange { start: 5, end: 7 });
        assert_eq!(sheet_report.cnt_cross_table_formulas, 1);
        assert_eq!(grid.formulas()["B3"], "B5+B6");

        let cell = grid.cell_by_address("B3").unwrap();
        assert_eq!(cell.value, EnumCellValue::Number(0.0));
        assert_eq!(cell.format.bold, Some(true));
        assert_eq!(cell.format.top, Some(1));
        assert_eq!(cell.format.bottom, Some(1));
        assert_eq!(grid.column_widths().get(&1), Some(&18.0));
    }

    #[test]
    fn test_zero_row_table_registers_empty_range() {
        let setting = SpecTableSettingData {
            header_definition: Some(vec![
                SpecColumnDefinition::new("a", "A"),
                SpecColumnDefinition::new("b", "B").with_row_formula("{a}*2"),
            ]),
            ..Default::default()
        };
        let mut ctx = LayoutContext::new(4, SpecLayoutFormats::default());
        let mut grid = SheetGrid::new("s");
        let mut report = SpecExportReport::default();
        let data = EnumTableData::Rows(vec![]);

        let table = layout_table(&mut ctx, &mut grid, "t", &setting, Some(&data), &mut report)
            .unwrap();
        assert_eq!(table.range, SpecTableContentRange { start: 5, end: 5 });
        assert!(grid.formulas().is_empty());
        assert_eq!(ctx.n_row_cursor, 9);
    }

    #[test]
    fn test_configuration_and_data_errors() {
        let mut report = SpecExportReport::default();
        let formats = SpecLayoutFormats::default();

        let mut a = SpecColumnDefinition::new("a", "A");
        a.hierarchy = true;
        let mut b = SpecColumnDefinition::new("b", "B");
        b.hierarchy = true;
        let setting = SpecTableSettingData {
            header_definition: Some(vec![a, b]),
            ..Default::default()
        };
        let err = layout_table(
            &mut LayoutContext::new(1, formats.clone()),
            &mut SheetGrid::new("s"),
            "t",
            &setting,
            None,
            &mut report,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MultipleHierarchyColumns { count: 2, .. }));

        let err = layout_table(
            &mut LayoutContext::new(1, formats.clone()),
            &mut SheetGrid::new("s"),
            "t",
            &SpecTableSettingData::default(),
            None,
            &mut report,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::MissingRowsDefinition { .. }));

        let setting = SpecTableSettingData {
            header_definition: Some(vec![SpecColumnDefinition::new("a", "A")]),
            ..Default::default()
        };
        let data = EnumTableData::Rows(vec![
            SpecRecord::from_cells([("a", 1.0)]).with_node("1", Some("404"), 1),
        ]);
        let err = layout_table(
            &mut LayoutContext::new(1, formats.clone()),
            &mut SheetGrid::new("s"),
            "t",
            &setting,
            Some(&data),
            &mut report,
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::UnknownParentId { .. }));
        assert_eq!(err.kind(), EnumErrorKind::DataShape);

        let l_cases = [
            vec![SpecRecord::from_cells([("a", 1.0)]).with_node("3", Some("3"), 0)],
            vec![
                SpecRecord::from_cells([("a", 1.0)]).with_node("1", Some("2"), 0),
                SpecRecord::from_cells([("a", 1.0)]).with_node("2", Some("1"), 1),
            ],
        ];
        for l_records in l_cases {
            let mut a = SpecColumnDefinition::new("a", "A");
            a.self_sum = true;
            let setting = SpecTableSettingData {
                header_definition: Some(vec![SpecColumnDefinition::new("n", "N"), a]),
                ..Default::default()
            };
            let err = layout_table(
                &mut LayoutContext::new(1, formats.clone()),
                &mut SheetGrid::new("s"),
                "t",
                &setting,
                Some(&EnumTableData::Rows(l_records)),
                &mut report,
            )
            .unwrap_err();
            assert!(matches!(err, ExportError::HierarchyCycle { .. }));
            assert_eq!(err.kind(), EnumErrorKind::Configuration);
        }

        let sheet = SpecWorkSheetSetting::new("s", 0);
        let err = layout_sheet(&sheet, None, &formats, &mut report).unwrap_err();
        assert!(matches!(err, ExportError::InvalidSheetSetting { .. }));
    }

    #[test]
    fn test_unknown_group_key_is_warned() {
        let setting = SpecTableSettingData {
            header_definition: Some(vec![SpecColumnDefinition::new("a", "A").with_group("ghost")]),
            ..Default::default()
        };
        let mut report = SpecExportReport::default();
        layout_table(
            &mut LayoutContext::new(1, SpecLayoutFormats::default()),
            &mut SheetGrid::new("s"),
            "t",
            &setting,
            None,
            &mut report,
        )
        .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("ghost"));
    }
}
