use semistr::SemiStr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Database '{0}' already exists")]
    DatabaseAlreadyExists(SemiStr),
    #[error("Database '{0}' not found")]
    DatabaseNotFound(SemiStr),
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(SemiStr),
    #[error("Table '{0}' not found")]
    TableNotFound(SemiStr),
    #[error("Column '{0}' not found")]
    ColumnNotFound(SemiStr),
    #[error("Column '{0}' already exists")]
    ColumnAlreadyExists(SemiStr),
    #[error("Column name '{0}' is not unique")]
    ColumnNameNotUnique(SemiStr),
    #[error("Column index {0} out of bound")]
    ColumnIndexOutOfBound(usize),
    #[error("Duplicated column id {0} when creating schema")]
    DuplicateColumnID(u32),
    #[error("Schema changed by concurrent transaction")]
    AlterConflict,
}
