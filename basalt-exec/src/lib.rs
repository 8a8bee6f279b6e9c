//! Executes ALTER TABLE plans.
//!
//! The executor validates the requested delta against the schema visible
//! to its transaction, derives the candidate schema through the schema
//! algebra, and submits it to the catalog's atomic install. Validation
//! touches no shared state; the install is the single externally-visible
//! mutation and its result code is recorded on the transaction verbatim.

use basalt_catalog::error::{Error, Result};
use basalt_catalog::layout::Schema;
use basalt_catalog::trx::{ResultType, Transaction};
use basalt_catalog::{Catalog, Table};
use basalt_plan::AlterTablePlan;
use semistr::SemiStr;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub struct AlterTableExecutor<'a> {
    plan: &'a AlterTablePlan,
    catalog: &'a dyn Catalog,
}

impl<'a> AlterTableExecutor<'a> {
    #[inline]
    pub fn new(plan: &'a AlterTablePlan, catalog: &'a dyn Catalog) -> Self {
        AlterTableExecutor { plan, catalog }
    }

    /// Runs validation and the install step. Returns `true` iff the
    /// catalog reports success; the transaction result carries the
    /// fine-grained outcome.
    pub fn execute(&self, trx: &mut Transaction) -> bool {
        let (table, old_schema) = match self.resolve_target(trx) {
            Ok(target) => target,
            Err(e) => {
                debug!("alter table failed to resolve target: {}", e);
                trx.set_result(ResultType::Failure);
                return false;
            }
        };
        let candidate = match self.build_candidate(&old_schema) {
            Ok(candidate) => candidate,
            Err(e) => {
                debug!("alter table validation failed: {}", e);
                trx.set_result(ResultType::Failure);
                return false;
            }
        };
        let result = self
            .catalog
            .alter_table(&table.database_id, &table.id, candidate, trx);
        trx.set_result(result);
        if result == ResultType::Aborted {
            debug!("alter table install rejected: {}", Error::AlterConflict);
        }
        result == ResultType::Success
    }

    fn resolve_target(&self, trx: &Transaction) -> Result<(Table, Arc<Schema>)> {
        let table =
            self.catalog
                .resolve_table(self.plan.database_name(), self.plan.table_name(), trx)?;
        let schema = self
            .catalog
            .current_schema(&table.id, trx)
            .ok_or_else(|| Error::TableNotFound(SemiStr::new(self.plan.table_name())))?;
        Ok((table, schema))
    }

    /// Validates drops and adds against the snapshot schema and derives
    /// the candidate. All-or-nothing: any invalid name fails the whole
    /// plan before anything is built.
    fn build_candidate(&self, old_schema: &Schema) -> Result<Schema> {
        let mut dropped = HashSet::new();
        for name in self.plan.dropped_columns() {
            match old_schema.col_id_by_name(name) {
                None => return Err(Error::ColumnNotFound(name.clone())),
                Some(physical_id) => {
                    dropped.insert(physical_id);
                }
            }
        }

        // retained columns keep their original relative order
        let retained: Vec<usize> = (0..old_schema.col_count())
            .filter(|physical_id| !dropped.contains(physical_id))
            .collect();
        let temp = old_schema.copy_subset(&retained)?;

        // added names are checked against the post-drop state
        let added = self.plan.added_columns();
        for column in added.columns() {
            if temp.col_id_by_name(column.name()).is_some() {
                return Err(Error::ColumnAlreadyExists(SemiStr::new(column.name())));
            }
        }

        Ok(Schema::append_all(&[&temp, added]))
    }
}
