//! Export error taxonomy.

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

/// Coarse error class used by callers that only care about who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumErrorKind {
    /// Malformed table settings (templates, groups, hierarchy flags).
    Configuration,
    /// Row data that does not fit the declared table shape.
    DataShape,
    /// Failure inside the document model or the persistence layer.
    Serialization,
}

/// Top-level error returned by every layout/export operation.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("table {table:?}: unknown column key {key:?} in formula {formula:?}")]
    UnknownColumnKey {
        table: String,
        key: String,
        formula: String,
    },

    #[error("formula {formula:?} references unknown table {table:?}")]
    UnknownTable { table: String, formula: String },

    #[error("table {table:?}: column position {position} is outside 1..={width}")]
    ColumnPositionOutOfRange {
        table: String,
        position: usize,
        width: usize,
    },

    #[error("table {table:?}: header group chain starting at {key:?} does not terminate")]
    HeaderGroupCycle { table: String, key: String },

    #[error("table {table:?}: {count} columns are flagged as hierarchy, at most one is allowed")]
    MultipleHierarchyColumns { table: String, count: usize },

    #[error("table {table:?}: no header definition and no rows definition")]
    MissingRowsDefinition { table: String },

    #[error("malformed formula token {token:?}: {reason}")]
    MalformedFormulaToken { token: String, reason: String },

    #[error("table {table:?}: parent chain of record {id:?} loops back on itself")]
    HierarchyCycle { table: String, id: String },

    #[error("table {table:?}: parent id {parent_id:?} does not match any record id")]
    UnknownParentId { table: String, parent_id: String },

    #[error("formula token {token:?}: row offset 0 is not a valid relative offset")]
    ZeroRowOffset { token: String },

    #[error("formula token {token:?}: row offset {offset} is outside table {table:?} ({rows} rows)")]
    RowOffsetOutOfRange {
        token: String,
        table: String,
        offset: i64,
        rows: usize,
    },

    #[error("table {table:?}: expected {expected} data, got {found}")]
    TableDataMismatch {
        table: String,
        expected: String,
        found: String,
    },

    #[error("sheet {sheet:?}: {reason}")]
    InvalidSheetSetting { sheet: String, reason: String },

    #[error("{0}")]
    IndexOverflow(String),

    #[cfg(feature = "polars")]
    #[error("dataframe conversion failed: {0}")]
    Frame(String),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Classify the error.
    pub fn kind(&self) -> EnumErrorKind {
        match self {
            Self::UnknownColumnKey { .. }
            | Self::UnknownTable { .. }
            | Self::ColumnPositionOutOfRange { .. }
            | Self::HeaderGroupCycle { .. }
            | Self::HierarchyCycle { .. }
            | Self::MultipleHierarchyColumns { .. }
            | Self::MissingRowsDefinition { .. }
            | Self::MalformedFormulaToken { .. }
            | Self::InvalidSheetSetting { .. }
            | Self::Json(_) => EnumErrorKind::Configuration,
            Self::UnknownParentId { .. }
            | Self::ZeroRowOffset { .. }
            | Self::RowOffsetOutOfRange { .. }
            | Self::TableDataMismatch { .. } => EnumErrorKind::DataShape,
            #[cfg(feature = "polars")]
            Self::Frame(_) => EnumErrorKind::DataShape,
            Self::IndexOverflow(_) | Self::Xlsx(_) | Self::Io(_) => EnumErrorKind::Serialization,
        }
    }
}
