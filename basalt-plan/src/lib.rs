//! DDL plan values consumed by the executors.

use basalt_catalog::layout::Schema;
use basalt_catalog::ColumnSpec;
use bitflags::bitflags;
use semistr::SemiStr;

bitflags! {
    pub struct AlterTableKind: u8 {
        const ADD_COLUMN = 0x01;
        const DROP_COLUMN = 0x02;
    }
}

/// Request to change a table's column set. Built once from a parsed
/// statement or directly by a caller, then consumed by the executor.
///
/// Added columns travel as a self-consistent schema fragment whose
/// offsets are local to the fragment; the candidate schema recomputes
/// them against the post-drop layout.
#[derive(Debug)]
pub struct AlterTablePlan {
    database_name: SemiStr,
    table_name: SemiStr,
    added_columns: Schema,
    dropped_columns: Vec<SemiStr>,
    kind: AlterTableKind,
}

impl AlterTablePlan {
    /// Builds a plan from column specs and dropped-column names, deriving
    /// the alter kind from whichever lists are non-empty.
    pub fn new(
        database_name: &str,
        table_name: &str,
        added: &[ColumnSpec],
        dropped: &[&str],
    ) -> Self {
        let mut kind = AlterTableKind::empty();
        if !added.is_empty() {
            kind |= AlterTableKind::ADD_COLUMN;
        }
        if !dropped.is_empty() {
            kind |= AlterTableKind::DROP_COLUMN;
        }
        AlterTablePlan {
            database_name: SemiStr::new(database_name),
            table_name: SemiStr::new(table_name),
            added_columns: Schema::from_specs(added),
            dropped_columns: dropped.iter().map(|name| SemiStr::new(name)).collect(),
            kind,
        }
    }

    /// Builds a plan around an already-assembled schema fragment.
    pub fn with_fragment(
        database_name: &str,
        table_name: &str,
        added_columns: Schema,
        dropped_columns: Vec<SemiStr>,
        kind: AlterTableKind,
    ) -> Self {
        AlterTablePlan {
            database_name: SemiStr::new(database_name),
            table_name: SemiStr::new(table_name),
            added_columns,
            dropped_columns,
            kind,
        }
    }

    #[inline]
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[inline]
    pub fn added_columns(&self) -> &Schema {
        &self.added_columns
    }

    #[inline]
    pub fn dropped_columns(&self) -> &[SemiStr] {
        &self.dropped_columns
    }

    #[inline]
    pub fn kind(&self) -> AlterTableKind {
        self.kind
    }
}
