//! Catalog maintains metadata of all database objects and owns each
//! table's active physical layout.
//!
//! Table layouts are immutable [`layout::Schema`] values shared by
//! reference; replacing one is a single atomic install through
//! [`Catalog::alter_table`]. It could be shared between threads.

pub mod error;
pub mod layout;
pub mod mem_impl;
pub mod trx;

use crate::error::Result;
use crate::layout::{Column, ColumnAttr, Schema};
use crate::trx::{ResultType, Transaction};
use basalt_datatype::PreciseType;
use semistr::SemiStr;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub trait Catalog: Send + Sync {
    fn create_database(&self, database_name: &str) -> Result<DatabaseID>;

    fn drop_database(&self, database_name: &str) -> Result<()>;

    fn all_databases(&self) -> Vec<Database>;

    fn exists_database(&self, database_name: &str) -> bool;

    fn find_database_by_name(&self, database_name: &str) -> Option<Database>;

    fn find_database(&self, database_id: &DatabaseID) -> Option<Database>;

    fn create_table(&self, table_spec: TableSpec) -> Result<TableID>;

    fn drop_table(&self, database_name: &str, table_name: &str) -> Result<()>;

    fn all_tables_in_database(&self, database_id: &DatabaseID) -> Vec<Table>;

    fn exists_table(&self, database_id: &DatabaseID, table_name: &str) -> bool;

    fn find_table_by_name(&self, database_id: &DatabaseID, table_name: &str) -> Option<Table>;

    fn find_table(&self, table_id: &TableID) -> Option<Table>;

    /// Starts a transaction with a fresh snapshot timestamp.
    fn begin_trx(&self) -> Transaction;

    /// Looks up a table by name under the given transaction.
    fn resolve_table(
        &self,
        database_name: &str,
        table_name: &str,
        trx: &Transaction,
    ) -> Result<Table>;

    /// Returns the table's active schema as of the transaction's
    /// snapshot. The returned reference stays valid and unchanged for
    /// the transaction's entire lifetime.
    fn current_schema(&self, table_id: &TableID, trx: &Transaction) -> Option<Arc<Schema>>;

    fn exists_column(&self, table_id: &TableID, column_name: &str, trx: &Transaction) -> bool;

    fn find_column_by_name(
        &self,
        table_id: &TableID,
        column_name: &str,
        trx: &Transaction,
    ) -> Option<Column>;

    /// Atomically installs `new_schema` as the table's active schema.
    /// Serialized against concurrent alters of the same table; the loser
    /// reports [`ResultType::Aborted`]. The caller records the returned
    /// code on its transaction.
    fn alter_table(
        &self,
        database_id: &DatabaseID,
        table_id: &TableID,
        new_schema: Schema,
        trx: &Transaction,
    ) -> ResultType;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectID<T> {
    id: u32,
    _marker: PhantomData<T>,
}

impl<T> ObjectID<T> {
    /// Required to create object only within the catalog module.
    pub(crate) fn new(id: u32) -> Self {
        ObjectID {
            id,
            _marker: PhantomData,
        }
    }
}

impl<T> ObjectID<T> {
    #[inline]
    pub fn value(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct D;
pub type DatabaseID = ObjectID<D>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct T;
pub type TableID = ObjectID<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct C;
pub type ColumnID = ObjectID<C>;

// Column ids are minted process-wide so a column keeps its identity
// across schema versions and fragment ids never collide with installed
// ones.
static COLUMN_ID_GEN: AtomicU32 = AtomicU32::new(0);

#[inline]
pub(crate) fn next_column_id() -> ColumnID {
    ColumnID::new(COLUMN_ID_GEN.fetch_add(1, Ordering::Relaxed) + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub id: DatabaseID,
    pub name: SemiStr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub id: TableID,
    pub database_id: DatabaseID,
    pub name: SemiStr,
}

/// Table spec used in creating table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub database_name: SemiStr,
    pub table_name: SemiStr,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    #[inline]
    pub fn new(database_name: &str, table_name: &str, columns: Vec<ColumnSpec>) -> Self {
        TableSpec {
            database_name: SemiStr::new(database_name),
            table_name: SemiStr::new(table_name),
            columns,
        }
    }
}

/// Column spec used in creating table or building a schema fragment,
/// before a logical id exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: SemiStr,
    pub pty: PreciseType,
    pub attr: ColumnAttr,
}

impl ColumnSpec {
    #[inline]
    pub fn new(name: &str, pty: PreciseType, attr: ColumnAttr) -> Self {
        ColumnSpec {
            name: SemiStr::new(name),
            pty,
            attr,
        }
    }
}
