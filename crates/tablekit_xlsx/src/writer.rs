//! XLSX export kernel: lays out every sheet, renders the grids with
//! `rust_xlsxwriter`, and hands the buffer to a persistence backend.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet};

use crate::conf::{C_EXT_XLSX, C_MIME_TYPE_XLSX};
use crate::error::ExportError;
use crate::grid::{SheetGrid, SpecGridCell};
use crate::layout::layout_sheet;
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecExportReport, SpecExportSettings, SpecLayoutFormats,
    TypeSheetData,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_horizontal_merge_tracker, derive_unique_sheet_name,
    sanitize_sheet_name,
};

////////////////////////////////////////////////////////////////////////////////
// #region Persistence

/// Destination of a finished workbook.
pub trait TraitPersistence {
    /// Store `buffer` under `file_name` (extension included).
    fn save(&mut self, buffer: &[u8], file_name: &str, mime_type: &str)
        -> Result<(), ExportError>;
}

/// Writes workbooks into a directory.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path_dir_out: PathBuf,
    l_paths_saved: Vec<PathBuf>,
}

impl FilePersistence {
    pub fn new(path_dir_out: impl AsRef<Path>) -> Self {
        Self {
            path_dir_out: path_dir_out.as_ref().to_path_buf(),
            l_paths_saved: vec![],
        }
    }

    /// Paths written so far, oldest first.
    pub fn paths_saved(&self) -> &[PathBuf] {
        &self.l_paths_saved
    }
}

impl TraitPersistence for FilePersistence {
    fn save(
        &mut self,
        buffer: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<(), ExportError> {
        fs::create_dir_all(&self.path_dir_out)?;
        let path_file_out = self.path_dir_out.join(file_name);
        fs::write(&path_file_out, buffer)?;
        log::debug!(
            "saved {} bytes ({mime_type}) to {}",
            buffer.len(),
            path_file_out.display()
        );
        self.l_paths_saved.push(path_file_out);
        Ok(())
    }
}

/// A document captured by [`MemoryPersistence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSavedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub buffer: Vec<u8>,
}

/// Keeps saved workbooks in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    pub documents: Vec<SpecSavedDocument>,
}

impl TraitPersistence for MemoryPersistence {
    fn save(
        &mut self,
        buffer: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<(), ExportError> {
        self.documents.push(SpecSavedDocument {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            buffer: buffer.to_vec(),
        });
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Exporter

/// Entry point of an export call.
///
/// Holds format presets only; every sheet gets a fresh [`crate::layout::LayoutContext`].
#[derive(Debug, Clone, Default)]
pub struct XlsxExporter {
    formats: SpecLayoutFormats,
}

impl XlsxExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom named formats instead of the defaults.
    pub fn with_formats(formats: SpecLayoutFormats) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &SpecLayoutFormats {
        &self.formats
    }

    /// Lay out every sheet without rendering.
    ///
    /// `data` is aligned with `settings.work_sheets`; missing entries mean
    /// the sheet has no data.
    pub fn layout(
        &self,
        settings: &SpecExportSettings,
        data: &[TypeSheetData],
    ) -> Result<(Vec<SheetGrid>, SpecExportReport), ExportError> {
        let mut report = SpecExportReport {
            file_name: settings.file_name.clone(),
            ..Default::default()
        };
        if data.len() > settings.work_sheets.len() {
            report.warn(format!(
                "{} data entries for {} work sheets; extra entries are ignored",
                data.len(),
                settings.work_sheets.len()
            ));
        }

        let mut set_sheet_names_existing = BTreeSet::new();
        let mut l_grids = Vec::with_capacity(settings.work_sheets.len());
        for (n_idx_sheet, sheet_setting) in settings.work_sheets.iter().enumerate() {
            let (mut grid, mut sheet_report) = layout_sheet(
                sheet_setting,
                data.get(n_idx_sheet),
                &self.formats,
                &mut report,
            )?;

            let c_sheet_name = derive_unique_sheet_name(
                &sanitize_sheet_name(&sheet_setting.sheet_name, "_"),
                &mut set_sheet_names_existing,
            );
            if c_sheet_name != sheet_setting.sheet_name {
                report.warn(format!(
                    "sheet name {:?} written as {c_sheet_name:?}",
                    sheet_setting.sheet_name
                ));
            }
            grid.name = c_sheet_name.clone();
            sheet_report.sheet_name = c_sheet_name;

            report.sheets.push(sheet_report);
            l_grids.push(grid);
        }

        Ok((l_grids, report))
    }

    /// Lay out and render the workbook into memory.
    pub fn export_to_buffer(
        &self,
        settings: &SpecExportSettings,
        data: &[TypeSheetData],
    ) -> Result<(Vec<u8>, SpecExportReport), ExportError> {
        let (l_grids, report) = self.layout(settings, data)?;
        let mut workbook = render_workbook(&l_grids)?;
        let buffer = workbook.save_to_buffer()?;
        Ok((buffer, report))
    }

    /// Full export: layout, render, then save through `persistence`.
    ///
    /// Nothing reaches `persistence` unless every sheet was laid out and
    /// rendered.
    pub fn export(
        &self,
        settings: &SpecExportSettings,
        data: &[TypeSheetData],
        persistence: &mut impl TraitPersistence,
    ) -> Result<SpecExportReport, ExportError> {
        let (buffer, report) = self.export_to_buffer(settings, data)?;
        let c_file_name = format!("{}.{C_EXT_XLSX}", settings.file_name);
        persistence.save(&buffer, &c_file_name, C_MIME_TYPE_XLSX)?;

        log::info!(
            "exported {c_file_name:?}: {} sheets, {} bytes, {} warnings",
            report.sheets.len(),
            buffer.len(),
            report.warnings.len()
        );
        Ok(report)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Rendering

#[derive(Default)]
struct FormatCache {
    dict_formats: HashMap<SpecCellFormat, Format>,
}

impl FormatCache {
    fn get(&mut self, spec: &SpecCellFormat) -> &Format {
        self.dict_formats
            .entry(spec.clone())
            .or_insert_with(|| derive_rust_xlsx_format(spec))
    }
}

/// Render laid-out grids into a workbook, one worksheet per grid.
pub fn render_workbook(grids: &[SheetGrid]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let mut cache = FormatCache::default();

    for grid in grids {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&grid.name)?;
        write_grid(worksheet, grid, &mut cache)?;
    }

    Ok(workbook)
}

/// Merges first, then every cell not owned by a merge, then column widths.
fn write_grid(
    worksheet: &mut Worksheet,
    grid: &SheetGrid,
    cache: &mut FormatCache,
) -> Result<(), ExportError> {
    let mut set_merged_cells = derive_horizontal_merge_tracker(grid.merges());
    let cfg_empty = SpecCellFormat::default();

    for merge in grid.merges() {
        let cfg_anchor = grid
            .cell(merge.row_number, merge.col_idx_start)
            .map_or(&cfg_empty, |cell| &cell.format);
        let n_row = cast_row_num(merge.row_number)?;
        worksheet.merge_range(
            n_row,
            cast_col_num(merge.col_idx_start)?,
            n_row,
            cast_col_num(merge.col_idx_end)?,
            &merge.text,
            cache.get(cfg_anchor),
        )?;
        set_merged_cells.insert((merge.row_number, merge.col_idx_start));
    }

    for (&(n_row, n_idx_col), cell) in grid.cells() {
        if set_merged_cells.contains(&(n_row, n_idx_col)) {
            continue;
        }
        if cell.formula.is_none() && cell.value.is_none() && cell.format.is_empty() {
            continue;
        }
        write_cell_with_format(worksheet, n_row, n_idx_col, cell, cache.get(&cell.format))?;
    }

    for (&n_idx_col, &width) in grid.column_widths() {
        worksheet.set_column_width(cast_col_num(n_idx_col)?, width)?;
    }

    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: usize,
    n_idx_col: usize,
    cell: &SpecGridCell,
    format: &Format,
) -> Result<(), ExportError> {
    let n_row = cast_row_num(n_row)?;
    let n_col = cast_col_num(n_idx_col)?;

    if let Some(formula) = &cell.formula {
        let formula = Formula::new(formula).set_result(cell.value.to_result_text());
        worksheet.write_formula_with_format(n_row, n_col, formula, format)?;
        return Ok(());
    }

    match &cell.value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = spec.indent
        && val > 0
    {
        format = format.set_indent(val);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = spec.top {
        format = format.set_border_top(derive_format_border(val));
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if let Some(val) = spec.left {
        format = format.set_border_left(derive_format_border(val));
    }
    if let Some(val) = spec.right {
        format = format.set_border_right(derive_format_border(val));
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "middle" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        EnumTableSetting, SpecColumnDefinition, SpecTableSettingData, SpecWorkSheetSetting,
    };

    fn derive_settings(sheet_names: &[&str]) -> SpecExportSettings {
        let setting = SpecTableSettingData {
            table_title: Some("T".to_string()),
            header_definition: Some(vec![SpecColumnDefinition::new("a", "A")]),
            ..Default::default()
        };
        SpecExportSettings {
            file_name: "report".to_string(),
            work_sheets: sheet_names
                .iter()
                .map(|name| {
                    SpecWorkSheetSetting::new(name, 1)
                        .with_table("t", EnumTableSetting::Static(setting.clone()))
                })
                .collect(),
        }
    }

    #[test]
    fn test_sheet_names_are_sanitized_and_unique() {
        let exporter = XlsxExporter::new();
        let (l_grids, report) = exporter
            .layout(&derive_settings(&["a/b", "a_b", "ok"]), &[])
            .unwrap();
        let l_names: Vec<&str> = l_grids.iter().map(|grid| grid.name.as_str()).collect();
        assert_eq!(l_names, vec!["a_b", "a_b__2", "ok"]);
        assert_eq!(report.sheets[1].sheet_name, "a_b__2");
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_export_saves_xlsx_through_persistence() {
        let exporter = XlsxExporter::new();
        let mut persistence = MemoryPersistence::default();
        let report = exporter
            .export(&derive_settings(&["s"]), &[], &mut persistence)
            .unwrap();

        assert_eq!(report.file_name, "report");
        assert_eq!(persistence.documents.len(), 1);
        let document = &persistence.documents[0];
        assert_eq!(document.file_name, "report.xlsx");
        assert_eq!(document.mime_type, "application/vnd.ms-excel");
        assert!(document.buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_failed_layout_saves_nothing() {
        let exporter = XlsxExporter::new();
        let mut settings = derive_settings(&["s"]);
        settings.work_sheets[0].starting_row_number = 0;
        let mut persistence = MemoryPersistence::default();
        assert!(exporter.export(&settings, &[], &mut persistence).is_err());
        assert!(persistence.documents.is_empty());
    }

    #[test]
    fn test_format_cache_reuses_formats() {
        let mut cache = FormatCache::default();
        let spec = SpecCellFormat {
            bold: Some(true),
            indent: Some(4),
            ..Default::default()
        };
        cache.get(&spec);
        cache.get(&spec.clone());
        cache.get(&SpecCellFormat::default());
        assert_eq!(cache.dict_formats.len(), 2);
        assert_eq!(derive_format_align(" VCenter "), Some(FormatAlign::VerticalCenter));
        assert_eq!(derive_format_align("nowhere"), None);
    }
}
