//! In-memory catalog implementation.
//!
//! Schema installs are serialized under the inner write lock and stamped
//! with commit timestamps from the same counter that issues transaction
//! snapshots. Readers resolve their view by snapshot timestamp and hold
//! an `Arc` to it, so an install never changes what an in-flight
//! transaction observes.

use crate::error::{Error, Result};
use crate::layout::{Column, ColumnAttr, Schema};
use crate::trx::{ResultType, Transaction, TrxID};
use crate::{Catalog, Database, DatabaseID, Table, TableID, TableSpec};
use indexmap::IndexMap;
use parking_lot::RwLock;
use semistr::SemiStr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct MemCatalog {
    inner: RwLock<Inner>,
    ts_gen: AtomicU64,
}

#[derive(Debug, Default)]
struct Inner {
    databases: IndexMap<SemiStr, Database>,
    tables: IndexMap<DatabaseID, Vec<Table>>,
    table_schemas: HashMap<TableID, SchemaVersions>,
    database_id_gen: u32,
    table_id_gen: u32,
}

/// Installed schema versions of one table, ascending by commit timestamp.
#[derive(Debug)]
struct SchemaVersions {
    versions: Vec<(TrxID, Arc<Schema>)>,
}

impl SchemaVersions {
    #[inline]
    fn visible(&self, sts: TrxID) -> Option<Arc<Schema>> {
        self.versions
            .iter()
            .rev()
            .find(|(cts, _)| *cts <= sts)
            .map(|(_, schema)| Arc::clone(schema))
    }

    #[inline]
    fn latest_cts(&self) -> TrxID {
        self.versions.last().map(|(cts, _)| *cts).unwrap_or(0)
    }
}

impl MemCatalog {
    #[inline]
    fn next_ts(&self) -> TrxID {
        self.ts_gen.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Physical ids of key columns, registered as the table's indexed set.
#[inline]
fn indexed_cols_of(schema: &Schema) -> Vec<usize> {
    schema
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.attr().intersects(ColumnAttr::PK | ColumnAttr::UK))
        .map(|(i, _)| i)
        .collect()
}

impl Catalog for MemCatalog {
    #[inline]
    fn create_database(&self, database_name: &str) -> Result<DatabaseID> {
        let mut inner = self.inner.write();
        if inner.databases.contains_key(database_name) {
            return Err(Error::DatabaseAlreadyExists(SemiStr::new(database_name)));
        }
        inner.database_id_gen += 1;
        let id = DatabaseID::new(inner.database_id_gen);
        let name = SemiStr::new(database_name);
        let database = Database {
            id,
            name: name.clone(),
        };
        inner.databases.insert(name, database);
        inner.tables.insert(id, vec![]);
        Ok(id)
    }

    #[inline]
    fn drop_database(&self, database_name: &str) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.databases.remove(database_name) {
            None => Err(Error::DatabaseNotFound(SemiStr::new(database_name))),
            Some(database) => {
                if let Some(tables) = inner.tables.remove(&database.id) {
                    for table in tables {
                        inner.table_schemas.remove(&table.id);
                    }
                }
                Ok(())
            }
        }
    }

    #[inline]
    fn all_databases(&self) -> Vec<Database> {
        let inner = self.inner.read();
        inner.databases.values().cloned().collect()
    }

    #[inline]
    fn exists_database(&self, database_name: &str) -> bool {
        let inner = self.inner.read();
        inner.databases.contains_key(database_name)
    }

    #[inline]
    fn find_database_by_name(&self, database_name: &str) -> Option<Database> {
        let inner = self.inner.read();
        inner.databases.get(database_name).cloned()
    }

    #[inline]
    fn find_database(&self, database_id: &DatabaseID) -> Option<Database> {
        let inner = self.inner.read();
        inner
            .databases
            .values()
            .find(|d| &d.id == database_id)
            .cloned()
    }

    #[inline]
    fn create_table(&self, table_spec: TableSpec) -> Result<TableID> {
        for (i, spec) in table_spec.columns.iter().enumerate() {
            if table_spec.columns[..i].iter().any(|c| c.name == spec.name) {
                return Err(Error::ColumnNameNotUnique(spec.name.clone()));
            }
        }
        let mut schema = Schema::from_specs(&table_spec.columns);
        schema.set_indexed_cols(indexed_cols_of(&schema));
        let mut inner = self.inner.write();
        let Inner {
            databases,
            tables,
            table_schemas,
            table_id_gen,
            ..
        } = &mut *inner;
        match databases.get(&table_spec.database_name) {
            None => Err(Error::DatabaseNotFound(table_spec.database_name)),
            Some(database) => {
                let tables_in_database = &tables[&database.id];
                if tables_in_database
                    .iter()
                    .any(|t| t.name == table_spec.table_name)
                {
                    return Err(Error::TableAlreadyExists(table_spec.table_name));
                }
                *table_id_gen += 1;
                let table_id = TableID::new(*table_id_gen);
                let table_name = SemiStr::new(&table_spec.table_name);
                let table = Table {
                    id: table_id,
                    database_id: database.id,
                    name: table_name,
                };
                tables.entry(database.id).or_default().push(table);
                let cts = self.next_ts();
                table_schemas.insert(
                    table_id,
                    SchemaVersions {
                        versions: vec![(cts, Arc::new(schema))],
                    },
                );
                Ok(table_id)
            }
        }
    }

    #[inline]
    fn drop_table(&self, database_name: &str, table_name: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let Inner {
            databases,
            tables,
            table_schemas,
            ..
        } = &mut *inner;
        match databases.get(database_name) {
            None => Err(Error::DatabaseNotFound(SemiStr::new(database_name))),
            Some(database) => {
                let tables_in_database = &mut tables[&database.id];
                match tables_in_database.iter().position(|t| t.name == table_name) {
                    None => Err(Error::TableNotFound(SemiStr::new(table_name))),
                    Some(idx) => {
                        let table = tables_in_database.swap_remove(idx);
                        table_schemas.remove(&table.id);
                        Ok(())
                    }
                }
            }
        }
    }

    #[inline]
    fn all_tables_in_database(&self, database_id: &DatabaseID) -> Vec<Table> {
        let inner = self.inner.read();
        inner.tables.get(database_id).cloned().unwrap_or_default()
    }

    #[inline]
    fn exists_table(&self, database_id: &DatabaseID, table_name: &str) -> bool {
        let inner = self.inner.read();
        inner
            .tables
            .get(database_id)
            .map(|ts| ts.iter().any(|t| t.name == table_name))
            .unwrap_or_default()
    }

    #[inline]
    fn find_table_by_name(&self, database_id: &DatabaseID, table_name: &str) -> Option<Table> {
        let inner = self.inner.read();
        inner
            .tables
            .get(database_id)
            .and_then(|ts| ts.iter().find(|t| t.name == table_name).cloned())
    }

    #[inline]
    fn find_table(&self, table_id: &TableID) -> Option<Table> {
        let inner = self.inner.read();
        inner
            .tables
            .values()
            .flat_map(|ts| ts.iter())
            .find(|t| &t.id == table_id)
            .cloned()
    }

    #[inline]
    fn begin_trx(&self) -> Transaction {
        Transaction::new(self.next_ts())
    }

    #[inline]
    fn resolve_table(
        &self,
        database_name: &str,
        table_name: &str,
        _trx: &Transaction,
    ) -> Result<Table> {
        let inner = self.inner.read();
        match inner.databases.get(database_name) {
            None => Err(Error::DatabaseNotFound(SemiStr::new(database_name))),
            Some(database) => inner
                .tables
                .get(&database.id)
                .and_then(|ts| ts.iter().find(|t| t.name == table_name).cloned())
                .ok_or_else(|| Error::TableNotFound(SemiStr::new(table_name))),
        }
    }

    #[inline]
    fn current_schema(&self, table_id: &TableID, trx: &Transaction) -> Option<Arc<Schema>> {
        let inner = self.inner.read();
        inner
            .table_schemas
            .get(table_id)
            .and_then(|sv| sv.visible(trx.sts()))
    }

    #[inline]
    fn exists_column(&self, table_id: &TableID, column_name: &str, trx: &Transaction) -> bool {
        self.current_schema(table_id, trx)
            .map(|schema| schema.col_id_by_name(column_name).is_some())
            .unwrap_or_default()
    }

    #[inline]
    fn find_column_by_name(
        &self,
        table_id: &TableID,
        column_name: &str,
        trx: &Transaction,
    ) -> Option<Column> {
        self.current_schema(table_id, trx).and_then(|schema| {
            schema
                .col_id_by_name(column_name)
                .and_then(|id| schema.column(id).cloned())
        })
    }

    #[inline]
    fn alter_table(
        &self,
        database_id: &DatabaseID,
        table_id: &TableID,
        new_schema: Schema,
        trx: &Transaction,
    ) -> ResultType {
        let mut inner = self.inner.write();
        let exists = inner
            .tables
            .get(database_id)
            .map(|ts| ts.iter().any(|t| &t.id == table_id))
            .unwrap_or_default();
        if !exists {
            return ResultType::Failure;
        }
        match inner.table_schemas.get_mut(table_id) {
            None => ResultType::Failure,
            Some(sv) => {
                // First committer wins: a version installed after this
                // transaction's snapshot means the caller validated
                // against a stale schema.
                if sv.latest_cts() > trx.sts() {
                    return ResultType::Aborted;
                }
                let mut schema = new_schema;
                schema.set_indexed_cols(indexed_cols_of(&schema));
                let cts = self.next_ts();
                sv.versions.push((cts, Arc::new(schema)));
                ResultType::Success
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnSpec;
    use basalt_datatype::PreciseType;

    fn catalog_with_table() -> (MemCatalog, TableID) {
        let cat = MemCatalog::default();
        cat.create_database("db1").unwrap();
        let table_id = cat
            .create_table(TableSpec::new(
                "db1",
                "t1",
                vec![
                    ColumnSpec::new("id", PreciseType::i32(), ColumnAttr::NOT_NULL | ColumnAttr::PK),
                    ColumnSpec::new("name", PreciseType::var_utf8(255), ColumnAttr::empty()),
                ],
            ))
            .unwrap();
        (cat, table_id)
    }

    #[test]
    fn test_database_lifecycle() {
        let cat = MemCatalog::default();
        let id = cat.create_database("db1").unwrap();
        assert!(cat.exists_database("db1"));
        assert_eq!(Some(id), cat.find_database_by_name("db1").map(|d| d.id));
        assert!(matches!(
            cat.create_database("db1"),
            Err(Error::DatabaseAlreadyExists(_))
        ));
        cat.drop_database("db1").unwrap();
        assert!(!cat.exists_database("db1"));
        assert!(matches!(
            cat.drop_database("db1"),
            Err(Error::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn test_table_lifecycle() {
        let (cat, table_id) = catalog_with_table();
        let db = cat.find_database_by_name("db1").unwrap();
        assert!(cat.exists_table(&db.id, "t1"));
        assert_eq!(Some(table_id), cat.find_table(&table_id).map(|t| t.id));
        assert!(matches!(
            cat.create_table(TableSpec::new("db1", "t1", vec![])),
            Err(Error::TableAlreadyExists(_))
        ));
        assert!(matches!(
            cat.create_table(TableSpec::new("nodb", "t2", vec![])),
            Err(Error::DatabaseNotFound(_))
        ));
        assert!(matches!(
            cat.create_table(TableSpec::new(
                "db1",
                "t2",
                vec![
                    ColumnSpec::new("a", PreciseType::i32(), ColumnAttr::empty()),
                    ColumnSpec::new("a", PreciseType::i64(), ColumnAttr::empty()),
                ],
            )),
            Err(Error::ColumnNameNotUnique(_))
        ));
        cat.drop_table("db1", "t1").unwrap();
        assert!(!cat.exists_table(&db.id, "t1"));
        assert!(matches!(
            cat.drop_table("db1", "t1"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_created_schema_layout() {
        let (cat, table_id) = catalog_with_table();
        let trx = cat.begin_trx();
        let schema = cat.current_schema(&table_id, &trx).unwrap();
        assert_eq!(2, schema.col_count());
        assert_eq!(0, schema.offset(0));
        assert_eq!(4, schema.offset(1));
        assert!(!schema.allow_null(0));
        // the primary key column is registered as indexed
        assert_eq!(&[0usize][..], schema.indexed_cols());
        assert!(cat.exists_column(&table_id, "name", &trx));
        let col = cat.find_column_by_name(&table_id, "id", &trx).unwrap();
        assert_eq!("id", col.name());
    }

    #[test]
    fn test_resolve_table() {
        let (cat, table_id) = catalog_with_table();
        let trx = cat.begin_trx();
        let table = cat.resolve_table("db1", "t1", &trx).unwrap();
        assert_eq!(table_id, table.id);
        assert!(matches!(
            cat.resolve_table("db1", "missing", &trx),
            Err(Error::TableNotFound(_))
        ));
        assert!(matches!(
            cat.resolve_table("nodb", "t1", &trx),
            Err(Error::DatabaseNotFound(_))
        ));
    }

    #[test]
    fn test_alter_installs_new_version() {
        let (cat, table_id) = catalog_with_table();
        let db = cat.find_database_by_name("db1").unwrap();
        let trx = cat.begin_trx();
        let old = cat.current_schema(&table_id, &trx).unwrap();
        let candidate = old.copy_subset(&[0]).unwrap();
        assert_eq!(
            ResultType::Success,
            cat.alter_table(&db.id, &table_id, candidate, &trx)
        );
        // the altering snapshot still reads the old version
        let again = cat.current_schema(&table_id, &trx).unwrap();
        assert_eq!(2, again.col_count());
        // a later transaction reads the installed one
        let trx2 = cat.begin_trx();
        let installed = cat.current_schema(&table_id, &trx2).unwrap();
        assert_eq!(1, installed.col_count());
    }

    #[test]
    fn test_snapshot_stability_under_alter() {
        let (cat, table_id) = catalog_with_table();
        let db = cat.find_database_by_name("db1").unwrap();
        let reader = cat.begin_trx();
        let before = cat.current_schema(&table_id, &reader).unwrap();

        let writer = cat.begin_trx();
        let candidate = cat
            .current_schema(&table_id, &writer)
            .unwrap()
            .copy_subset(&[0])
            .unwrap();
        assert_eq!(
            ResultType::Success,
            cat.alter_table(&db.id, &table_id, candidate, &writer)
        );

        // the reader's view is untouched by the committed install
        let after = cat.current_schema(&table_id, &reader).unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(2, after.col_count());
        assert_eq!(0, after.offset(0));
    }

    #[test]
    fn test_concurrent_alter_aborts_loser() {
        let (cat, table_id) = catalog_with_table();
        let db = cat.find_database_by_name("db1").unwrap();
        let loser = cat.begin_trx();
        let winner = cat.begin_trx();

        let c1 = cat
            .current_schema(&table_id, &winner)
            .unwrap()
            .copy_subset(&[0])
            .unwrap();
        assert_eq!(
            ResultType::Success,
            cat.alter_table(&db.id, &table_id, c1, &winner)
        );

        let c2 = cat
            .current_schema(&table_id, &loser)
            .unwrap()
            .copy_subset(&[1])
            .unwrap();
        assert_eq!(
            ResultType::Aborted,
            cat.alter_table(&db.id, &table_id, c2, &loser)
        );

        // exactly one alter took effect
        let check = cat.begin_trx();
        let installed = cat.current_schema(&table_id, &check).unwrap();
        assert_eq!(1, installed.col_count());
        assert_eq!("id", installed.column(0).unwrap().name());
    }

    #[test]
    fn test_alter_unknown_table_fails() {
        let (cat, table_id) = catalog_with_table();
        let db = cat.find_database_by_name("db1").unwrap();
        let trx = cat.begin_trx();
        let schema = cat.current_schema(&table_id, &trx).unwrap().copy();
        cat.drop_table("db1", "t1").unwrap();
        assert_eq!(
            ResultType::Failure,
            cat.alter_table(&db.id, &table_id, schema, &trx)
        );
    }
}
