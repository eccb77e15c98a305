//! Symbolic formula resolution.
//!
//! Two grammars are supported:
//! - row-local templates such as `{math}+{physics}`, rewritten per body row;
//! - cross-table references `{tableName,columnRef,rowOffset}`, rewritten once
//!   every table of the sheet is registered.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::conf::N_NCOLS_EXCEL_MAX;
use crate::error::ExportError;
use crate::spec::{
    EnumDataType, SpecColumnDefinition, SpecRecord, SpecRegisteredTable, SpecTableRegistry,
};
use crate::util::{derive_cell_address, index_to_label};

fn row_formula_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([^{}]+)\}").expect("row formula key regex must compile")
    })
}

fn cross_table_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("cross-table token regex must compile"))
}

/// A formula to write at `(row_number, col_idx)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPlannedFormula {
    /// 1-based row.
    pub row_number: usize,
    /// 0-based column.
    pub col_idx: usize,
    /// Formula text without the leading `=`.
    pub formula: String,
}

////////////////////////////////////////////////////////////////////////////////
// #region RowFormula

/// Column keys referenced by a row template, in first-seen order.
pub fn derive_row_formula_keys(template: &str) -> Vec<String> {
    let mut l_keys: Vec<String> = Vec::new();
    for caps in row_formula_key_re().captures_iter(template) {
        let key = &caps[1];
        if !l_keys.iter().any(|k| k == key) {
            l_keys.push(key.to_string());
        }
    }
    l_keys
}

/// Check that every `{key}` of `template` names a column of the table.
pub fn validate_row_formula(
    table_name: &str,
    template: &str,
    columns: &[SpecColumnDefinition],
) -> Result<(), ExportError> {
    for key in derive_row_formula_keys(template) {
        if !columns.iter().any(|column| column.key == key) {
            return Err(ExportError::UnknownColumnKey {
                table: table_name.to_string(),
                key,
                formula: template.to_string(),
            });
        }
    }
    Ok(())
}

/// Rewrite `{key}` tokens into addresses on row `n_row` (1-based).
pub fn resolve_row_formula(
    table_name: &str,
    template: &str,
    columns: &[SpecColumnDefinition],
    n_row: usize,
) -> Result<String, ExportError> {
    let mut c_formula = String::with_capacity(template.len());
    let mut n_pos_last = 0;

    for caps in row_formula_key_re().captures_iter(template) {
        let (Some(m_token), Some(m_key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let n_idx_col = columns
            .iter()
            .position(|column| column.key == m_key.as_str())
            .ok_or_else(|| ExportError::UnknownColumnKey {
                table: table_name.to_string(),
                key: m_key.as_str().to_string(),
                formula: template.to_string(),
            })?;

        c_formula.push_str(&template[n_pos_last..m_token.start()]);
        c_formula.push_str(&derive_cell_address(n_idx_col, n_row));
        n_pos_last = m_token.end();
    }
    c_formula.push_str(&template[n_pos_last..]);

    Ok(c_formula)
}

/// Leaf flag per record.
///
/// In a hierarchical table a record is a leaf when no record names it as
/// parent; records without an id are always leaves. Flat tables are all leaves.
pub fn derive_leaf_flags(records: &[SpecRecord], if_hierarchical: bool) -> Vec<bool> {
    if !if_hierarchical {
        return vec![true; records.len()];
    }

    let set_parent_ids: BTreeSet<&str> = records
        .iter()
        .filter_map(|record| record.parent_id.as_deref())
        .collect();

    records
        .iter()
        .map(|record| match record.id.as_deref() {
            Some(id) => !set_parent_ids.contains(id),
            None => true,
        })
        .collect()
}

/// Self-sum formulas of one column: every node with children sums them.
///
/// Nodes are visited from the deepest level upward; records without a level
/// are skipped. Nodes without children keep their value.
pub fn plan_self_sum_formulas(
    n_idx_col: usize,
    records: &[SpecRecord],
    n_row_start: usize,
) -> Vec<SpecPlannedFormula> {
    let c_col_label = index_to_label(n_idx_col);
    let Some(n_level_max) = records.iter().filter_map(|record| record.level).max() else {
        return vec![];
    };

    let mut l_formulas = Vec::new();
    for n_level in (0..=n_level_max).rev() {
        for (n_idx_row, record) in records.iter().enumerate() {
            if record.level != Some(n_level) {
                continue;
            }
            let Some(id) = record.id.as_deref() else {
                continue;
            };

            let l_terms: Vec<String> = records
                .iter()
                .enumerate()
                .filter(|(_, child)| child.parent_id.as_deref() == Some(id))
                .map(|(n_idx_child, _)| format!("{c_col_label}{}", n_row_start + n_idx_child))
                .collect();
            if l_terms.is_empty() {
                continue;
            }

            l_formulas.push(SpecPlannedFormula {
                row_number: n_row_start + n_idx_row,
                col_idx: n_idx_col,
                formula: l_terms.join("+"),
            });
        }
    }

    l_formulas
}

/// All column formulas of a headered table, in write order.
///
/// Per column, self-sum formulas come first and row templates second, so a
/// template overrides a self-sum on the same cell. Templates skip non-leaf
/// rows unless the column is a percentage.
pub fn plan_row_formulas(
    table_name: &str,
    columns: &[SpecColumnDefinition],
    records: &[SpecRecord],
    n_row_start: usize,
) -> Result<Vec<SpecPlannedFormula>, ExportError> {
    let if_hierarchical = columns.iter().any(|column| column.hierarchy);
    let l_leaf_flags = derive_leaf_flags(records, if_hierarchical);
    let mut l_formulas = Vec::new();

    for (n_idx_col, column) in columns.iter().enumerate() {
        if if_hierarchical && column.self_sum {
            l_formulas.extend(plan_self_sum_formulas(n_idx_col, records, n_row_start));
        }

        let Some(template) = column.row_formula.as_deref() else {
            continue;
        };
        validate_row_formula(table_name, template, columns)?;

        let if_percentage = column.data_type == Some(EnumDataType::Percentage);
        for (n_idx_row, if_leaf) in l_leaf_flags.iter().enumerate() {
            if !(if_percentage || *if_leaf) {
                continue;
            }
            let n_row = n_row_start + n_idx_row;
            l_formulas.push(SpecPlannedFormula {
                row_number: n_row,
                col_idx: n_idx_col,
                formula: resolve_row_formula(table_name, template, columns, n_row)?,
            });
        }
    }

    Ok(l_formulas)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CrossTableFormula

/// Column reference inside a cross-table token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumColumnIdentifier {
    /// Column key of a headered table.
    Key(String),
    /// 1-based column position.
    Position(usize),
}

/// One parsed `{table,column,rowOffset}` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCrossTableToken {
    /// Token text including braces, as written in the template.
    pub token: String,
    /// Referenced table name.
    pub table: String,
    /// Referenced column.
    pub column: EnumColumnIdentifier,
    /// Non-zero row offset; negative counts from the end.
    pub row_offset: i64,
}

fn malformed(token: &str, reason: &str) -> ExportError {
    ExportError::MalformedFormulaToken {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse the distinct cross-table tokens of `template`, first-seen order.
pub fn parse_cross_table_tokens(template: &str) -> Result<Vec<SpecCrossTableToken>, ExportError> {
    let mut l_tokens: Vec<SpecCrossTableToken> = Vec::new();

    for m_token in cross_table_token_re().find_iter(template) {
        let c_token = m_token.as_str();
        if l_tokens.iter().any(|token| token.token == c_token) {
            continue;
        }

        let l_parts: Vec<&str> = c_token[1..c_token.len() - 1]
            .split(',')
            .map(str::trim)
            .collect();
        let [c_table, c_column, c_offset] = l_parts.as_slice() else {
            return Err(malformed(c_token, "expected {table,column,rowOffset}"));
        };
        if c_table.is_empty() {
            return Err(malformed(c_token, "empty table name"));
        }

        let column = match c_column.parse::<i64>() {
            Ok(n_pos) if n_pos >= 1 => EnumColumnIdentifier::Position(n_pos as usize),
            Ok(_) => return Err(malformed(c_token, "column position must be >= 1")),
            Err(_) if c_column.is_empty() => return Err(malformed(c_token, "empty column")),
            Err(_) => EnumColumnIdentifier::Key(c_column.to_string()),
        };

        let row_offset = c_offset
            .parse::<i64>()
            .map_err(|_| malformed(c_token, "row offset must be an integer"))?;
        if row_offset == 0 {
            return Err(ExportError::ZeroRowOffset {
                token: c_token.to_string(),
            });
        }

        l_tokens.push(SpecCrossTableToken {
            token: c_token.to_string(),
            table: c_table.to_string(),
            column,
            row_offset,
        });
    }

    Ok(l_tokens)
}

/// Absolute row of `token` inside `table`.
///
/// Positive `N` is the `N`th body row (`start + N - 1`); negative `N` counts
/// from the end (`end + N`, so `-1` is the last row).
pub fn resolve_row_offset(
    token: &SpecCrossTableToken,
    table: &SpecRegisteredTable,
) -> Result<usize, ExportError> {
    let n_rows = table.range.len();
    let n_offset_abs = token.row_offset.unsigned_abs() as usize;
    if token.row_offset == 0 || n_offset_abs > n_rows {
        return Err(ExportError::RowOffsetOutOfRange {
            token: token.token.clone(),
            table: table.name.clone(),
            offset: token.row_offset,
            rows: n_rows,
        });
    }

    if token.row_offset > 0 {
        Ok(table.range.start + n_offset_abs - 1)
    } else {
        Ok(table.range.end - n_offset_abs)
    }
}

/// 0-based column of `token` inside `table`.
pub fn resolve_column_index(
    token: &SpecCrossTableToken,
    table: &SpecRegisteredTable,
    template: &str,
) -> Result<usize, ExportError> {
    match &token.column {
        EnumColumnIdentifier::Position(n_pos) => {
            if *n_pos > N_NCOLS_EXCEL_MAX {
                return Err(ExportError::ColumnPositionOutOfRange {
                    table: table.name.clone(),
                    position: *n_pos,
                    width: N_NCOLS_EXCEL_MAX,
                });
            }
            Ok(n_pos - 1)
        }
        EnumColumnIdentifier::Key(key) => table
            .column_keys
            .as_ref()
            .and_then(|l_keys| l_keys.iter().position(|k| k == key))
            .ok_or_else(|| ExportError::UnknownColumnKey {
                table: table.name.clone(),
                key: key.clone(),
                formula: template.to_string(),
            }),
    }
}

/// Rewrite every cross-table token of `template` against `registry`.
pub fn resolve_cross_table_formula(
    template: &str,
    registry: &SpecTableRegistry,
) -> Result<String, ExportError> {
    let mut c_formula = template.to_string();

    for token in parse_cross_table_tokens(template)? {
        let table = registry
            .get(&token.table)
            .ok_or_else(|| ExportError::UnknownTable {
                table: token.table.clone(),
                formula: template.to_string(),
            })?;
        let n_idx_col = resolve_column_index(&token, table, template)?;
        let n_row = resolve_row_offset(&token, table)?;
        c_formula = c_formula.replace(&token.token, &derive_cell_address(n_idx_col, n_row));
    }

    Ok(c_formula)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnumErrorKind;
    use crate::spec::SpecTableContentRange;
    use pretty_assertions::assert_eq;

    fn derive_columns(keys: &[&str]) -> Vec<SpecColumnDefinition> {
        keys.iter()
            .map(|key| SpecColumnDefinition::new(key, key))
            .collect()
    }

    fn derive_registry() -> SpecTableRegistry {
        let mut registry = SpecTableRegistry::default();
        registry.register(SpecRegisteredTable {
            name: "table1".to_string(),
            range: SpecTableContentRange { start: 2, end: 3 },
            column_keys: None,
            width: 6,
        });
        registry.register(SpecRegisteredTable {
            name: "scores".to_string(),
            range: SpecTableContentRange { start: 10, end: 14 },
            column_keys: Some(vec!["name".to_string(), "total".to_string()]),
            width: 2,
        });
        registry
    }

    #[test]
    fn test_row_formula_uses_column_positions() {
        let columns = derive_columns(&["x", "y", "z", "a", "b"]);
        assert_eq!(
            resolve_row_formula("t", "{a}+{b}", &columns, 5).unwrap(),
            "D5+E5"
        );
        assert_eq!(
            resolve_row_formula("t", "({a}+{a})/2", &columns, 12).unwrap(),
            "(D12+D12)/2"
        );
    }

    #[test]
    fn test_row_formula_unknown_key_fails() {
        let columns = derive_columns(&["a"]);
        let err = resolve_row_formula("t", "{a}+{nope}", &columns, 1).unwrap_err();
        assert!(matches!(
            &err,
            ExportError::UnknownColumnKey { key, .. } if key == "nope"
        ));
        assert_eq!(err.kind(), EnumErrorKind::Configuration);
    }

    #[test]
    fn test_row_formula_accepts_any_braced_key() {
        let columns = derive_columns(&["name", "foreign-lang"]);
        assert_eq!(
            resolve_row_formula("t", "{foreign-lang}*2", &columns, 2).unwrap(),
            "B2*2"
        );

        let err = validate_row_formula("t", "{no such}*2", &columns).unwrap_err();
        assert!(matches!(
            &err,
            ExportError::UnknownColumnKey { key, .. } if key == "no such"
        ));
        assert!(resolve_row_formula("t", "{no such}*2", &columns, 2).is_err());
    }

    #[test]
    fn test_self_sum_sums_direct_children() {
        let records = vec![
            SpecRecord::default().with_node("1", None, 0),
            SpecRecord::default().with_node("2", Some("1"), 1),
            SpecRecord::default().with_node("3", Some("1"), 1),
        ];
        let l_formulas = plan_self_sum_formulas(0, &records, 6);
        assert_eq!(
            l_formulas,
            vec![SpecPlannedFormula {
                row_number: 6,
                col_idx: 0,
                formula: "A7+A8".to_string(),
            }]
        );
    }

    #[test]
    fn test_self_sum_visits_deeper_levels_first() {
        let records = vec![
            SpecRecord::default().with_node("r", None, 0),
            SpecRecord::default().with_node("m", Some("r"), 1),
            SpecRecord::default().with_node("l", Some("m"), 2),
        ];
        let l_formulas = plan_self_sum_formulas(1, &records, 1);
        let l_rows: Vec<usize> = l_formulas.iter().map(|f| f.row_number).collect();
        assert_eq!(l_rows, vec![2, 1]);
        assert_eq!(l_formulas[0].formula, "B3");
        assert_eq!(l_formulas[1].formula, "B2");
    }

    #[test]
    fn test_row_templates_skip_aggregate_rows_except_percentage() {
        let mut columns = derive_columns(&["name", "a", "b"]);
        columns[0].hierarchy = true;
        columns[1].self_sum = true;
        columns.push(SpecColumnDefinition::new("sum", "Sum").with_row_formula("{a}+{b}"));
        columns.push(
            SpecColumnDefinition::new("ratio", "Ratio")
                .with_row_formula("{a}/{b}")
                .with_data_type(EnumDataType::Percentage),
        );
        let records = vec![
            SpecRecord::default().with_node("1", None, 0),
            SpecRecord::default().with_node("2", Some("1"), 1),
        ];

        let l_formulas = plan_row_formulas("t", &columns, &records, 4).unwrap();
        let l_cells: Vec<(usize, usize, &str)> = l_formulas
            .iter()
            .map(|f| (f.row_number, f.col_idx, f.formula.as_str()))
            .collect();
        assert_eq!(
            l_cells,
            vec![
                (4, 1, "B5"),
                (5, 3, "B5+C5"),
                (4, 4, "B4/C4"),
                (5, 4, "B5/C5"),
            ]
        );
    }

    #[test]
    fn test_row_formulas_on_empty_table_are_noop() {
        let columns = vec![
            SpecColumnDefinition::new("a", "A"),
            SpecColumnDefinition::new("s", "S").with_row_formula("{a}*2"),
        ];
        assert!(plan_row_formulas("t", &columns, &[], 9).unwrap().is_empty());
    }

    #[test]
    fn test_flat_table_rows_are_all_leaves() {
        let records = vec![
            SpecRecord::default().with_node("1", None, 0),
            SpecRecord::default().with_node("2", Some("1"), 1),
        ];
        assert_eq!(derive_leaf_flags(&records, false), vec![true, true]);
        assert_eq!(derive_leaf_flags(&records, true), vec![false, true]);
    }

    #[test]
    fn test_cross_table_negative_offset_hits_single_row() {
        let registry = derive_registry();
        assert_eq!(
            resolve_cross_table_formula("{table1,4,-1}+{table1,5,-1}", &registry).unwrap(),
            "D2+E2"
        );
        assert_eq!(
            resolve_cross_table_formula("{table1,4,1}", &registry).unwrap(),
            "D2"
        );
    }

    #[test]
    fn test_cross_table_keys_offsets_and_duplicates() {
        let registry = derive_registry();
        assert_eq!(
            resolve_cross_table_formula("{scores, total, 1}-{scores,total,-1}", &registry).unwrap(),
            "B10-B13"
        );
        assert_eq!(
            resolve_cross_table_formula("{scores,1,2}*{scores,1,2}", &registry).unwrap(),
            "A11*A11"
        );
    }

    #[test]
    fn test_cross_table_parse_dedups_and_trims() {
        let l_tokens = parse_cross_table_tokens("{ t , k , -2 }+{ t , k , -2 }+{t,3,1}").unwrap();
        assert_eq!(l_tokens.len(), 2);
        assert_eq!(l_tokens[0].table, "t");
        assert_eq!(l_tokens[0].column, EnumColumnIdentifier::Key("k".to_string()));
        assert_eq!(l_tokens[0].row_offset, -2);
        assert_eq!(l_tokens[1].column, EnumColumnIdentifier::Position(3));
    }

    #[test]
    fn test_cross_table_errors() {
        let registry = derive_registry();

        let err = resolve_cross_table_formula("{missing,1,1}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::UnknownTable { .. }));

        let err = resolve_cross_table_formula("{scores,nope,1}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::UnknownColumnKey { .. }));

        let err = resolve_cross_table_formula("{table1,key,1}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::UnknownColumnKey { .. }));

        assert_eq!(
            resolve_cross_table_formula("{table1,6,-1}+{table1,7,-1}", &registry).unwrap(),
            "F2+G2"
        );
        let err = resolve_cross_table_formula("{table1,16385,1}", &registry).unwrap_err();
        assert!(matches!(
            err,
            ExportError::ColumnPositionOutOfRange { width: 16_384, .. }
        ));

        let err = resolve_cross_table_formula("{table1,1,0}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::ZeroRowOffset { .. }));
        assert_eq!(err.kind(), EnumErrorKind::DataShape);

        let err = resolve_cross_table_formula("{scores,1,-5}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::RowOffsetOutOfRange { rows: 4, .. }));

        let err = resolve_cross_table_formula("{table1,0,1}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::MalformedFormulaToken { .. }));

        let err = resolve_cross_table_formula("{table1,1}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::MalformedFormulaToken { .. }));

        let err = resolve_cross_table_formula("{table1,1,last}", &registry).unwrap_err();
        assert!(matches!(err, ExportError::MalformedFormulaToken { .. }));
    }
}
