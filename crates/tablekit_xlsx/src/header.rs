//! Header tree builder: turns leaf columns plus nested groups into header rows.

use std::collections::BTreeMap;

use crate::error::ExportError;
use crate::spec::{SpecCellFormat, SpecColumnDefinition, SpecHeaderGroup};

/// One occupied header slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnumHeaderEntry<'a> {
    /// Group banner.
    Group(&'a SpecHeaderGroup),
    /// Leaf column.
    Column(&'a SpecColumnDefinition),
}

impl<'a> EnumHeaderEntry<'a> {
    /// Display label.
    pub fn name(&self) -> &'a str {
        match self {
            Self::Group(group) => &group.name,
            Self::Column(column) => &column.name,
        }
    }

    /// Header format overrides.
    pub fn header_style(&self) -> Option<&'a SpecCellFormat> {
        match self {
            Self::Group(group) => group.header_style.as_ref(),
            Self::Column(column) => column.header_style.as_ref(),
        }
    }

    fn group_key(&self) -> Option<&'a str> {
        match self {
            Self::Group(group) => group.group_key.as_deref(),
            Self::Column(column) => column.group_key.as_deref(),
        }
    }
}

/// Header rows, topmost group level first, leaf columns last.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecHeaderRows<'a> {
    /// Every row has one slot per leaf column.
    pub rows: Vec<Vec<Option<EnumHeaderEntry<'a>>>>,
    /// Group keys referenced by a column or group but not declared.
    pub unknown_group_keys: Vec<String>,
}

impl SpecHeaderRows<'_> {
    /// Number of header rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Display labels; empty slots and blank groups render as `""`.
    pub fn labels(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|entry| entry.map(|e| e.name().to_string()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

/// Build the header rows of one table.
///
/// Each pass maps the current row to the groups its entries belong to and
/// prepends the result, until a pass produces no group at all. A chain that
/// is longer than the number of declared groups must contain a cycle.
pub fn build_header_rows<'a>(
    table_name: &str,
    header_definition: &'a [SpecColumnDefinition],
    header_groups: &'a [SpecHeaderGroup],
) -> Result<SpecHeaderRows<'a>, ExportError> {
    let mut dict_groups: BTreeMap<&str, &SpecHeaderGroup> = BTreeMap::new();
    for group in header_groups {
        dict_groups.entry(group.key.as_str()).or_insert(group);
    }

    let mut l_unknown_group_keys: Vec<String> = Vec::new();
    let mut lookup_parent = |entry: &EnumHeaderEntry<'a>| -> Option<EnumHeaderEntry<'a>> {
        let key = entry.group_key()?;
        match dict_groups.get(key).copied() {
            Some(group) => Some(EnumHeaderEntry::Group(group)),
            None => {
                if !l_unknown_group_keys.iter().any(|k| k == key) {
                    l_unknown_group_keys.push(key.to_string());
                }
                None
            }
        }
    };

    let l_leaf_row: Vec<Option<EnumHeaderEntry<'a>>> = header_definition
        .iter()
        .map(|column| Some(EnumHeaderEntry::Column(column)))
        .collect();

    let mut l_rows = vec![l_leaf_row];
    let mut l_current: Vec<Option<EnumHeaderEntry<'a>>> = l_rows[0]
        .iter()
        .map(|entry| entry.as_ref().and_then(&mut lookup_parent))
        .collect();

    let mut n_hops = 0usize;
    while l_current.iter().any(Option::is_some) {
        n_hops += 1;
        if n_hops > header_groups.len() {
            let key = l_current
                .iter()
                .flatten()
                .find_map(|entry| match entry {
                    EnumHeaderEntry::Group(group) => Some(group.key.clone()),
                    EnumHeaderEntry::Column(_) => None,
                })
                .unwrap_or_default();
            return Err(ExportError::HeaderGroupCycle {
                table: table_name.to_string(),
                key,
            });
        }

        let l_next: Vec<Option<EnumHeaderEntry<'a>>> = l_current
            .iter()
            .map(|entry| entry.as_ref().and_then(&mut lookup_parent))
            .collect();
        l_rows.insert(0, l_current);
        l_current = l_next;
    }

    Ok(SpecHeaderRows {
        rows: l_rows,
        unknown_group_keys: l_unknown_group_keys,
    })
}
