//! `tablekit_xlsx`:
//! Table-layout and formula-resolution engine for styled XLSX reports.
//!
//! Modules:
//! - `conf`    : constants and default format presets
//! - `spec`    : settings, data and report models
//! - `error`   : error taxonomy
//! - `util`    : column labels, sheet names, merge planning
//! - `header`  : header tree builder
//! - `formula` : row-local and cross-table formula resolution
//! - `grid`    : in-memory sheet produced by the layout pass
//! - `layout`  : per-table state machine and sheet orchestration
//! - `writer`  : `rust_xlsxwriter` rendering and persistence
//! - `frame`   : Polars DataFrame input (feature `polars`)
pub mod conf;
pub mod error;
#[cfg(feature = "polars")]
pub mod frame;
pub mod formula;
pub mod grid;
pub mod header;
pub mod layout;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{C_MIME_TYPE_XLSX, N_GAP_BETWEEN_TABLES_DEFAULT, derive_default_layout_formats};
pub use error::{EnumErrorKind, ExportError};
pub use formula::{
    EnumColumnIdentifier, SpecCrossTableToken, SpecPlannedFormula, parse_cross_table_tokens,
    plan_row_formulas, plan_self_sum_formulas, resolve_cross_table_formula, resolve_row_formula,
};
pub use grid::{SheetGrid, SpecGridCell};
pub use header::{EnumHeaderEntry, SpecHeaderRows, build_header_rows};
pub use layout::{LayoutContext, SpecPendingCellFormula, layout_sheet, layout_table};
pub use spec::{
    EnumCellInput, EnumCellValue, EnumDataType, EnumTableData, EnumTableSetting, SpecCellFormat,
    SpecCellStyle, SpecColumnDefinition, SpecExportReport, SpecExportSettings, SpecFontStyle,
    SpecHeaderGroup, SpecLayoutFormats, SpecRecord, SpecRegisteredTable, SpecSheetHorizontalMerge,
    SpecSheetReport, SpecTableContentRange, SpecTableRegistry, SpecTableSettingData,
    SpecWorkSheetSetting, TypeSheetData, derive_sheet_data_from_json_str,
};
pub use util::{index_to_label, label_to_index, plan_horizontal_merges, plan_row_merge_spans};
pub use writer::{FilePersistence, MemoryPersistence, TraitPersistence, XlsxExporter};
