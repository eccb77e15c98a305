//! Layout constants and default preset factories.

use crate::spec::{EnumDataType, SpecCellFormat, SpecLayoutFormats};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Blank rows inserted after each table when the sheet sets no gap.
pub const N_GAP_BETWEEN_TABLES_DEFAULT: usize = 4;
/// Indent units per hierarchy level.
pub const N_INDENT_PER_LEVEL: usize = 2;
/// Thin border style code.
pub const N_BORDER_THIN: i64 = 1;

/// Number format that clears an inherited column format.
pub const C_NUM_FORMAT_GENERAL: &str = "General";
/// Number format of `Number` cells.
pub const C_NUM_FORMAT_NUMBER: &str = "#,##0.00";
/// Number format of `Percentage` cells.
pub const C_NUM_FORMAT_PERCENTAGE: &str = "0.00%";

/// MIME type handed to the persistence layer.
pub const C_MIME_TYPE_XLSX: &str = "application/vnd.ms-excel";
/// File extension appended to the export file name.
pub const C_EXT_XLSX: &str = "xlsx";

/// Number format for a data type; `None` keeps the general format.
pub fn derive_num_format(data_type: Option<EnumDataType>) -> Option<&'static str> {
    match data_type {
        Some(EnumDataType::Number) => Some(C_NUM_FORMAT_NUMBER),
        Some(EnumDataType::Percentage) => Some(C_NUM_FORMAT_PERCENTAGE),
        _ => None,
    }
}

/// Build default named formats used by [`crate::layout::LayoutContext`].
pub fn derive_default_layout_formats() -> SpecLayoutFormats {
    let cfg_middle_left = SpecCellFormat {
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecLayoutFormats {
        title: cfg_middle_left.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
        header: SpecCellFormat {
            bold: Some(true),
            text_wrap: Some(true),
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        },
        notification: SpecCellFormat {
            bold: Some(true),
            font_color: Some("#FF0000".to_string()),
            ..Default::default()
        },
        editable: SpecCellFormat {
            bg_color: Some("#FFFF00".to_string()),
            ..Default::default()
        },
        hierarchy: cfg_middle_left,
        untyped_column: SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        },
        border_style: N_BORDER_THIN,
    }
}
