//! Shared table-layout specification models.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::ExportError;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification; every field is an optional overlay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Indent level (used by hierarchy columns).
    pub indent: Option<u8>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Top border override.
    pub top: Option<i64>,
    /// Bottom border override.
    pub bottom: Option<i64>,
    /// Left border override.
    pub left: Option<i64>,
    /// Right border override.
    pub right: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Solid background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            indent: other.indent.or(self.indent),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            left: other.left.or(self.left),
            right: other.right.or(self.right),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }

    /// True when no property is set.
    pub fn is_empty(&self) -> bool {
        *self == SpecCellFormat::default()
    }
}

/// Font overrides carried by a single styled cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SpecFontStyle {
    /// Font family name.
    pub name: Option<String>,
    /// Font size in points.
    pub size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,
    /// Font color (`#RRGGBB`).
    pub color: Option<String>,
}

impl SpecFontStyle {
    /// Convert to a format patch.
    pub fn to_format(&self) -> SpecCellFormat {
        SpecCellFormat {
            font_name: self.name.clone(),
            font_size: self.size,
            bold: self.bold,
            italic: self.italic,
            font_color: self.color.clone(),
            ..Default::default()
        }
    }
}

/// Named formats used by the layout pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecLayoutFormats {
    /// Table title cell.
    pub title: SpecCellFormat,
    /// Non-blank header cells (before per-header overrides).
    pub header: SpecCellFormat,
    /// Notification row under a table.
    pub notification: SpecCellFormat,
    /// Fill applied to editable leaf cells.
    pub editable: SpecCellFormat,
    /// Hierarchy column cells.
    pub hierarchy: SpecCellFormat,
    /// Body cells of columns without a data type.
    pub untyped_column: SpecCellFormat,
    /// Border style code used for table outlines.
    pub border_style: i64,
}

impl Default for SpecLayoutFormats {
    fn default() -> Self {
        crate::conf::derive_default_layout_formats()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Primitive cell value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Boolean value.
    Boolean(bool),
    /// Numeric value.
    Number(f64),
    /// Text value.
    String(String),
}

impl EnumCellValue {
    /// Text used as the cached result of a formula cell.
    pub fn to_result_text(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Boolean(val) => if *val { "TRUE" } else { "FALSE" }.to_string(),
            Self::Number(val) => val.to_string(),
            Self::String(val) => val.clone(),
        }
    }

    /// True for the blank value.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for EnumCellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for EnumCellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Spreadsheet data type of a column or a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum EnumDataType {
    /// Calendar date.
    Date,
    /// Plain number.
    Number,
    /// Text.
    String,
    /// Money amount.
    Currency,
    /// Ratio rendered as a percentage.
    Percentage,
}

/// Style of one styled input cell.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecCellStyle {
    /// Data type driving the number format.
    pub data_type: Option<EnumDataType>,
    /// Font overrides.
    pub font: Option<SpecFontStyle>,
    /// Cross-table formula template `{table,column,rowOffset}`.
    pub cell_formula: Option<String>,
}

/// One input cell: either a bare value or a value with its own style.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumCellInput {
    /// Value with per-cell style.
    Styled {
        #[serde(default)]
        value: EnumCellValue,
        style: SpecCellStyle,
    },
    /// Bare value.
    Plain(EnumCellValue),
}

impl EnumCellInput {
    /// Displayed value.
    pub fn value(&self) -> &EnumCellValue {
        match self {
            Self::Styled { value, .. } => value,
            Self::Plain(value) => value,
        }
    }

    /// Per-cell style, if any.
    pub fn style(&self) -> Option<&SpecCellStyle> {
        match self {
            Self::Styled { style, .. } => Some(style),
            Self::Plain(_) => None,
        }
    }
}

impl From<EnumCellValue> for EnumCellInput {
    fn from(value: EnumCellValue) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for EnumCellInput {
    fn from(value: &str) -> Self {
        Self::Plain(value.into())
    }
}

impl From<f64> for EnumCellInput {
    fn from(value: f64) -> Self {
        Self::Plain(value.into())
    }
}

impl From<i64> for EnumCellInput {
    fn from(value: i64) -> Self {
        Self::Plain(value.into())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowData

/// One record of a headered table.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecRecord {
    /// Node id (hierarchical tables).
    #[serde(default, deserialize_with = "deserialize_record_id")]
    pub id: Option<String>,
    /// Parent node id (hierarchical tables).
    #[serde(default, deserialize_with = "deserialize_record_id")]
    pub parent_id: Option<String>,
    /// Hierarchy depth, 0 for roots.
    #[serde(default)]
    pub level: Option<usize>,
    /// Cell inputs by column key.
    #[serde(flatten)]
    pub cells: BTreeMap<String, EnumCellInput>,
}

impl SpecRecord {
    /// Create a record from `(column key, input)` pairs.
    pub fn from_cells<K, V>(cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<EnumCellInput>,
    {
        Self {
            cells: cells
                .into_iter()
                .map(|(key, val)| (key.into(), val.into()))
                .collect(),
            ..Default::default()
        }
    }

    /// Attach hierarchy fields.
    pub fn with_node(mut self, id: &str, parent_id: Option<&str>, level: usize) -> Self {
        self.id = Some(id.to_string());
        self.parent_id = parent_id.map(ToString::to_string);
        self.level = Some(level);
        self
    }

    /// Input for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&EnumCellInput> {
        self.cells.get(key)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnumRawRecordId {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn deserialize_record_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<EnumRawRecordId>::deserialize(deserializer)?;
    Ok(raw.map(|val| match val {
        EnumRawRecordId::Text(s) => s,
        EnumRawRecordId::Integer(n) => n.to_string(),
        EnumRawRecordId::Float(n) => n.to_string(),
    }))
}

/// Data handed to one table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumTableData {
    /// Records of a headered table.
    Rows(Vec<SpecRecord>),
    /// Plain record consumed by a computed rows-only setting.
    Record(BTreeMap<String, EnumCellInput>),
}

/// Data of one worksheet keyed by table name.
pub type TypeSheetData = BTreeMap<String, EnumTableData>;

/// Parse per-sheet data (`[{tableName: rows | record}, ...]`) from JSON text.
pub fn derive_sheet_data_from_json_str(text: &str) -> Result<Vec<TypeSheetData>, ExportError> {
    Ok(serde_json::from_str(text)?)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableSettings

/// Leaf column of a table header.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecColumnDefinition {
    /// Column key, unique within the table.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Parent header group key.
    pub group_key: Option<String>,
    /// Column data type.
    pub data_type: Option<EnumDataType>,
    /// Column width in character units.
    pub width: Option<f64>,
    /// Column holds the hierarchy (indented by record level).
    pub hierarchy: bool,
    /// Column renders check state; carried through as configuration.
    pub checkable: bool,
    /// Non-leaf rows sum their direct children.
    pub self_sum: bool,
    /// Leaf cells get the editable fill.
    pub editable: bool,
    /// Per-row formula template, e.g. `{math}+{physics}`.
    pub row_formula: Option<String>,
    /// Format patch applied to body cells of this column.
    pub style: Option<SpecCellFormat>,
    /// Format patch applied to this column's header cell.
    pub header_style: Option<SpecCellFormat>,
}

impl SpecColumnDefinition {
    /// Create a plain column.
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Set the parent header group.
    pub fn with_group(mut self, group_key: &str) -> Self {
        self.group_key = Some(group_key.to_string());
        self
    }

    /// Set the row formula template.
    pub fn with_row_formula(mut self, template: &str) -> Self {
        self.row_formula = Some(template.to_string());
        self
    }

    /// Set the data type.
    pub fn with_data_type(mut self, data_type: EnumDataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

/// Header banner spanning one or more columns.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecHeaderGroup {
    /// Group key.
    pub key: String,
    /// Display name; empty renders a blank cell that still reserves its row.
    pub name: String,
    /// Parent group key.
    pub group_key: Option<String>,
    /// Format patch applied to the group's header cells.
    pub header_style: Option<SpecCellFormat>,
}

impl SpecHeaderGroup {
    /// Create a group.
    pub fn new(key: &str, name: &str, group_key: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            group_key: group_key.map(ToString::to_string),
            header_style: None,
        }
    }
}

/// Resolved table setting.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecTableSettingData {
    /// Title row above the table.
    pub table_title: Option<String>,
    /// Header groups (may nest via `group_key`).
    pub header_groups: Vec<SpecHeaderGroup>,
    /// Leaf columns; `None` marks a rows-only table.
    pub header_definition: Option<Vec<SpecColumnDefinition>>,
    /// Literal rows of a rows-only table.
    pub rows_definition: Option<Vec<Vec<EnumCellInput>>>,
    /// Notification row under the table.
    pub notification: Option<String>,
}

/// Builder of a table setting from the table's raw data.
pub type TypeTableSettingFn =
    Arc<dyn Fn(Option<&EnumTableData>) -> SpecTableSettingData + Send + Sync>;

/// Table setting as declared by the caller.
#[derive(Clone)]
pub enum EnumTableSetting {
    /// Fixed setting.
    Static(SpecTableSettingData),
    /// Setting computed from the table's data at layout time.
    Computed(TypeTableSettingFn),
}

impl EnumTableSetting {
    /// Wrap a closure as a computed setting.
    pub fn computed<F>(func: F) -> Self
    where
        F: Fn(Option<&EnumTableData>) -> SpecTableSettingData + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(func))
    }

    /// Resolve into concrete data.
    pub fn resolve(&self, data: Option<&EnumTableData>) -> SpecTableSettingData {
        match self {
            Self::Static(val) => val.clone(),
            Self::Computed(func) => func(data),
        }
    }
}

impl fmt::Debug for EnumTableSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(val) => f.debug_tuple("Static").field(val).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for EnumTableSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        SpecTableSettingData::deserialize(deserializer).map(Self::Static)
    }
}

/// Table setting with its name, in declaration order.
#[derive(Debug, Clone)]
pub struct SpecNamedTableSetting {
    /// Table name referenced by data and cross-table formulas.
    pub name: String,
    /// The setting.
    pub setting: EnumTableSetting,
}

/// Per-worksheet settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecWorkSheetSetting {
    /// Worksheet name.
    pub sheet_name: String,
    /// First row (1-based) written on this sheet.
    #[serde(default = "default_starting_row_number")]
    pub starting_row_number: usize,
    /// Blank rows between tables; defaults to `conf::N_GAP_BETWEEN_TABLES_DEFAULT`.
    #[serde(default)]
    pub gap_between_two_tables: Option<usize>,
    /// Column width used by rows-only tables.
    #[serde(default)]
    pub column_width: Option<f64>,
    /// Tables in declaration order.
    #[serde(deserialize_with = "deserialize_ordered_table_settings")]
    pub table_settings: Vec<SpecNamedTableSetting>,
}

impl SpecWorkSheetSetting {
    /// Create a sheet setting without tables.
    pub fn new(sheet_name: &str, starting_row_number: usize) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            starting_row_number,
            gap_between_two_tables: None,
            column_width: None,
            table_settings: vec![],
        }
    }

    /// Append a table.
    pub fn with_table(mut self, name: &str, setting: EnumTableSetting) -> Self {
        self.table_settings.push(SpecNamedTableSetting {
            name: name.to_string(),
            setting,
        });
        self
    }
}

fn default_starting_row_number() -> usize {
    1
}

struct OrderedTableSettingsVisitor;

impl<'de> Visitor<'de> for OrderedTableSettingsVisitor {
    type Value = Vec<SpecNamedTableSetting>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of table name to table setting")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut l_settings = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, setting)) = map.next_entry::<String, EnumTableSetting>()? {
            l_settings.push(SpecNamedTableSetting { name, setting });
        }
        Ok(l_settings)
    }
}

fn deserialize_ordered_table_settings<'de, D>(
    deserializer: D,
) -> Result<Vec<SpecNamedTableSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(OrderedTableSettingsVisitor)
}

/// Settings of one export call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecExportSettings {
    /// Output file name without extension.
    pub file_name: String,
    /// Worksheets in output order.
    pub work_sheets: Vec<SpecWorkSheetSetting>,
}

impl SpecExportSettings {
    /// Parse settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(text)?)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableRegistry

/// Half-open row range `[start, end)` of one table body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecTableContentRange {
    /// First body row (1-based).
    pub start: usize,
    /// One past the last body row.
    pub end: usize,
}

impl SpecTableContentRange {
    /// Number of body rows.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// True for a table without body rows.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Last body row, if any.
    pub fn last_row(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }
}

/// Registry entry of a laid-out table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRegisteredTable {
    /// Table name.
    pub name: String,
    /// Body row range.
    pub range: SpecTableContentRange,
    /// Column keys of headered tables.
    pub column_keys: Option<Vec<String>>,
    /// Number of columns.
    pub width: usize,
}

/// Registry of laid-out tables in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecTableRegistry {
    l_tables: Vec<SpecRegisteredTable>,
}

impl SpecTableRegistry {
    /// Record a table; entries are never mutated afterwards.
    pub fn register(&mut self, table: SpecRegisteredTable) {
        self.l_tables.push(table);
    }

    /// Look a table up by name.
    pub fn get(&self, name: &str) -> Option<&SpecRegisteredTable> {
        self.l_tables.iter().find(|table| table.name == name)
    }

    /// All entries in declaration order.
    pub fn tables(&self) -> &[SpecRegisteredTable] {
        &self.l_tables
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetHorizontalMerge {
    /// Row where the merge is applied (1-based).
    pub row_number: usize,
    /// Start column index (inclusive, 0-based).
    pub col_idx_start: usize,
    /// End column index (inclusive, 0-based).
    pub col_idx_end: usize,
    /// Merge display text.
    pub text: String,
}

/// Per-sheet outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetReport {
    /// Final (sanitised, unique) sheet name.
    pub sheet_name: String,
    /// Registered tables.
    pub tables: Vec<SpecRegisteredTable>,
    /// Header merges written on the sheet.
    pub merges: Vec<SpecSheetHorizontalMerge>,
    /// Number of resolved cross-table formulas.
    pub cnt_cross_table_formulas: usize,
}

/// Per-export report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecExportReport {
    /// File name without extension.
    pub file_name: String,
    /// Sheet reports in output order.
    pub sheets: Vec<SpecSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecExportReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        log::warn!("{}", msg.as_ref());
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overlays_only_set_fields() {
        let base = SpecCellFormat {
            bold: Some(true),
            top: Some(1),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            left: Some(1),
            top: Some(2),
            ..Default::default()
        });
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.top, Some(2));
        assert_eq!(merged.left, Some(1));
        assert!(SpecCellFormat::default().is_empty());
    }

    #[test]
    fn test_record_deserializes_ids_and_styled_cells() {
        let rec: SpecRecord = serde_json::from_str(
            r#"{"id": 1, "parentId": "0", "level": 1, "name": "A",
                "score": {"value": 3, "style": {"dataType": "Percentage"}}, "note": null}"#,
        )
        .unwrap();
        assert_eq!(rec.id.as_deref(), Some("1"));
        assert_eq!(rec.parent_id.as_deref(), Some("0"));
        assert_eq!(rec.level, Some(1));
        assert_eq!(rec.get("name"), Some(&EnumCellInput::Plain("A".into())));
        assert_eq!(rec.get("note"), Some(&EnumCellInput::Plain(EnumCellValue::None)));
        let score = rec.get("score").unwrap();
        assert_eq!(score.value(), &EnumCellValue::Number(3.0));
        assert_eq!(
            score.style().and_then(|s| s.data_type),
            Some(EnumDataType::Percentage)
        );
        assert!(!rec.cells.contains_key("id"));
    }

    #[test]
    fn test_table_settings_keep_declaration_order() {
        let sheet: SpecWorkSheetSetting = serde_json::from_str(
            r#"{"sheetName": "s", "tableSettings": {"zeta": {}, "alpha": {"tableTitle": "T"}}}"#,
        )
        .unwrap();
        let l_names: Vec<&str> = sheet
            .table_settings
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(l_names, vec!["zeta", "alpha"]);
        assert_eq!(sheet.starting_row_number, 1);
        assert_eq!(
            sheet.table_settings[1].setting.resolve(None).table_title.as_deref(),
            Some("T")
        );
    }

    #[test]
    fn test_content_range_last_row() {
        let range = SpecTableContentRange { start: 2, end: 3 };
        assert_eq!(range.len(), 1);
        assert_eq!(range.last_row(), Some(2));
        let empty = SpecTableContentRange { start: 7, end: 7 };
        assert!(empty.is_empty());
        assert_eq!(empty.last_row(), None);
    }
}
