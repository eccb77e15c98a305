//! Polars DataFrame input for headered tables.

use polars::prelude::{AnyValue, DataFrame};

use crate::error::ExportError;
use crate::spec::{EnumCellInput, EnumCellValue, SpecRecord};

/// Column mapped to [`SpecRecord::id`].
pub const C_COL_ID: &str = "id";
/// Columns mapped to [`SpecRecord::parent_id`].
pub const TUP_COL_PARENT_ID: [&str; 2] = ["parentId", "parent_id"];
/// Column mapped to [`SpecRecord::level`].
pub const C_COL_LEVEL: &str = "level";

/// Convert every row of `df` into a record keyed by column name.
pub fn derive_records_from_dataframe(df: &DataFrame) -> Result<Vec<SpecRecord>, ExportError> {
    let mut l_records = vec![SpecRecord::default(); df.height()];

    for column in df.get_columns() {
        let c_name = column.name().as_str();
        for (n_idx_row, record) in l_records.iter_mut().enumerate() {
            let value = column
                .get(n_idx_row)
                .map_err(|err| ExportError::Frame(format!("failed to read {c_name:?}: {err}")))?;

            if c_name == C_COL_ID {
                record.id = derive_id_from_any_value(value);
            } else if TUP_COL_PARENT_ID.contains(&c_name) {
                record.parent_id = derive_id_from_any_value(value);
            } else if c_name == C_COL_LEVEL {
                record.level = derive_level_from_any_value(c_name, n_idx_row, value)?;
            } else {
                record.cells.insert(
                    c_name.to_string(),
                    EnumCellInput::Plain(derive_cell_value_from_any_value(value)),
                );
            }
        }
    }

    Ok(l_records)
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => match value.extract::<f64>() {
            Some(val) => EnumCellValue::Number(val),
            None => EnumCellValue::String(value.to_string()),
        },
    }
}

fn derive_id_from_any_value(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(val) => Some(val.to_string()),
        AnyValue::StringOwned(val) => Some(val.to_string()),
        _ => Some(value.to_string()),
    }
}

fn derive_level_from_any_value(
    c_name: &str,
    n_idx_row: usize,
    value: AnyValue<'_>,
) -> Result<Option<usize>, ExportError> {
    if matches!(value, AnyValue::Null) {
        return Ok(None);
    }
    match value.extract::<i64>() {
        Some(n_level) if n_level >= 0 => Ok(Some(n_level as usize)),
        _ => Err(ExportError::Frame(format!(
            "{c_name:?} row {n_idx_row}: level must be a non-negative integer, got {value}"
        ))),
    }
}
