//! Physical layout of a table.
//!
//! A [`Schema`] is an immutable ordered list of [`Column`]s together with
//! layout metadata derived at construction time: byte offsets within the
//! fixed-length tuple region, the set of non-inlined columns, and the
//! mapping from logical column ids to positions. New layouts are derived
//! from existing ones through the schema algebra ([`Schema::copy`],
//! [`Schema::copy_subset`], [`Schema::append`]), never by in-place edits,
//! so concurrent readers of a published schema need no locks.

use crate::error::{Error, Result};
use crate::{next_column_id, ColumnID, ColumnSpec};
use basalt_datatype::PreciseType;
use bitflags::bitflags;
use semistr::SemiStr;
use std::collections::HashMap;
use std::fmt;

bitflags! {
    pub struct ColumnAttr: u8 {
        const NOT_NULL = 0x01; // rejects null values
        const PK = 0x02; // primary key
        const UK = 0x04; // unique key
        const FK = 0x08; // foreign key
    }
}

/// Column describes a single field: value type, storage footprint within
/// the fixed-length tuple region, and constraint attributes.
///
/// The byte offset is assigned by the owning schema and is meaningful only
/// there; the rest of the descriptor is schema-agnostic and is shared by
/// value between schema versions.
#[derive(Debug, Clone)]
pub struct Column {
    logical_id: ColumnID,
    name: SemiStr,
    pty: PreciseType,
    fixed_len: usize,
    inlined: bool,
    var_len: Option<usize>,
    offset: usize,
    attr: ColumnAttr,
}

impl Column {
    #[inline]
    pub(crate) fn new(logical_id: ColumnID, name: &str, pty: PreciseType, attr: ColumnAttr) -> Self {
        Column {
            logical_id,
            name: SemiStr::new(name),
            pty,
            fixed_len: pty.fixed_len(),
            inlined: pty.is_inlined(),
            var_len: pty.var_len_capacity(),
            offset: 0,
            attr,
        }
    }

    /// Stable identity of the column across schema versions.
    #[inline]
    pub fn logical_id(&self) -> ColumnID {
        self.logical_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn pty(&self) -> PreciseType {
        self.pty
    }

    /// Bytes occupied in the fixed-length region. For a non-inlined
    /// column this is the size of the out-of-line reference.
    #[inline]
    pub fn fixed_len(&self) -> usize {
        self.fixed_len
    }

    #[inline]
    pub fn is_inlined(&self) -> bool {
        self.inlined
    }

    /// Maximum byte length of the out-of-line value, `None` if inlined.
    #[inline]
    pub fn var_len(&self) -> Option<usize> {
        self.var_len
    }

    /// Full value size for inlined columns, capacity for non-inlined ones.
    #[inline]
    pub fn value_len(&self) -> usize {
        if self.inlined {
            self.fixed_len
        } else {
            self.var_len.unwrap_or(0)
        }
    }

    /// Byte offset within the fixed-length region of the owning schema.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn attr(&self) -> ColumnAttr {
        self.attr
    }

    #[inline]
    pub fn allow_null(&self) -> bool {
        !self.attr.contains(ColumnAttr::NOT_NULL)
    }

    /// The only in-place mutation a column supports.
    #[inline]
    pub fn add_attr(&mut self, attr: ColumnAttr) {
        self.attr |= attr;
    }
}

/// Structural equality. Logical id and offset are bindings to a
/// particular schema instance and do not participate.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.pty == other.pty
            && self.fixed_len == other.fixed_len
            && self.inlined == other.inlined
            && self.var_len == other.var_len
            && self.attr == other.attr
    }
}

impl Eq for Column {}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @{}", self.name, self.pty.to_lower(), self.offset)
    }
}

/// Ordered collection of columns with derived layout metadata.
///
/// Columns are addressed by physical id, their position in the sequence.
/// Offsets are assigned left to right as the running sum of fixed
/// lengths. Once published a schema is immutable except for attribute
/// addition and index-set registration, both of which preserve column
/// count, order and offsets.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
    logic_to_phys: HashMap<ColumnID, usize>,
    uninlined_cols: Vec<usize>,
    all_inlined: bool,
    fixed_len: usize,
    indexed_cols: Vec<usize>,
}

impl Schema {
    /// Constructs a schema from externally supplied columns.
    /// A duplicated logical id is a hard error, not a logged anomaly.
    pub fn new(columns: Vec<Column>) -> Result<Schema> {
        let mut seen = HashMap::with_capacity(columns.len());
        for (physical_id, column) in columns.iter().enumerate() {
            if seen.insert(column.logical_id, physical_id).is_some() {
                return Err(Error::DuplicateColumnID(column.logical_id.value()));
            }
        }
        Ok(Self::assemble(columns))
    }

    /// Builds a schema from column specs, minting a fresh logical id per
    /// column. Used for DDL column lists and ALTER TABLE fragments.
    pub fn from_specs(specs: &[ColumnSpec]) -> Schema {
        let columns = specs
            .iter()
            .map(|spec| Column::new(next_column_id(), &spec.name, spec.pty, spec.attr))
            .collect();
        Self::assemble(columns)
    }

    /// Recomputes all derived metadata from the column list. Offsets of
    /// the source schema never transfer. A logical id gathered twice
    /// keeps its first physical mapping.
    fn assemble(mut columns: Vec<Column>) -> Schema {
        let mut logic_to_phys = HashMap::with_capacity(columns.len());
        let mut uninlined_cols = vec![];
        let mut offset = 0usize;
        for (physical_id, column) in columns.iter_mut().enumerate() {
            if !column.inlined {
                uninlined_cols.push(physical_id);
            }
            logic_to_phys.entry(column.logical_id).or_insert(physical_id);
            column.offset = offset;
            offset += column.fixed_len;
        }
        let all_inlined = uninlined_cols.is_empty();
        Schema {
            columns,
            logic_to_phys,
            uninlined_cols,
            all_inlined,
            fixed_len: offset,
            indexed_cols: vec![],
        }
    }

    /// Full copy with layout metadata rebuilt from scratch.
    #[inline]
    pub fn copy(&self) -> Schema {
        Self::assemble(self.columns.clone())
    }

    /// Gathers the columns at the given physical ids, in the given order,
    /// into a new schema. Duplicated ids duplicate the column. Any id
    /// beyond the column count fails without producing a partial schema.
    pub fn copy_subset(&self, physical_ids: &[usize]) -> Result<Schema> {
        let mut columns = Vec::with_capacity(physical_ids.len());
        for &physical_id in physical_ids {
            let column = self
                .columns
                .get(physical_id)
                .ok_or(Error::ColumnIndexOutOfBound(physical_id))?;
            columns.push(column.clone());
        }
        Ok(Self::assemble(columns))
    }

    /// Concatenates the selected columns of each input schema, in input
    /// order and per-input subset order, into a new schema.
    pub fn append(inputs: &[(&Schema, &[usize])]) -> Result<Schema> {
        let mut columns = vec![];
        for (schema, subset) in inputs {
            for &physical_id in *subset {
                let column = schema
                    .columns
                    .get(physical_id)
                    .ok_or(Error::ColumnIndexOutOfBound(physical_id))?;
                columns.push(column.clone());
            }
        }
        Ok(Self::assemble(columns))
    }

    /// Concatenates the full column lists of the given schemas.
    pub fn append_all(schemas: &[&Schema]) -> Schema {
        let count = schemas.iter().map(|s| s.columns.len()).sum();
        let mut columns = Vec::with_capacity(count);
        for schema in schemas {
            columns.extend_from_slice(&schema.columns);
        }
        Self::assemble(columns)
    }

    #[inline]
    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn column(&self, physical_id: usize) -> Option<&Column> {
        self.columns.get(physical_id)
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[inline]
    pub fn offset(&self, physical_id: usize) -> usize {
        self.columns[physical_id].offset
    }

    #[inline]
    pub fn fixed_len(&self, physical_id: usize) -> usize {
        self.columns[physical_id].fixed_len
    }

    #[inline]
    pub fn var_len(&self, physical_id: usize) -> Option<usize> {
        self.columns[physical_id].var_len
    }

    #[inline]
    pub fn is_inlined(&self, physical_id: usize) -> bool {
        self.columns[physical_id].inlined
    }

    /// Full value size for an inlined column, capacity otherwise.
    #[inline]
    pub fn value_len(&self, physical_id: usize) -> usize {
        self.columns[physical_id].value_len()
    }

    #[inline]
    pub fn allow_null(&self, physical_id: usize) -> bool {
        self.columns[physical_id].allow_null()
    }

    /// Total bytes of the fixed-length region of one tuple.
    #[inline]
    pub fn total_fixed_len(&self) -> usize {
        self.fixed_len
    }

    #[inline]
    pub fn all_inlined(&self) -> bool {
        self.all_inlined
    }

    /// Physical ids of non-inlined columns, ascending.
    #[inline]
    pub fn uninlined_cols(&self) -> &[usize] {
        &self.uninlined_cols
    }

    #[inline]
    pub fn uninlined_col_count(&self) -> usize {
        self.uninlined_cols.len()
    }

    #[inline]
    pub fn col_id_by_name(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    #[inline]
    pub fn logic_to_phys(&self, logical_id: &ColumnID) -> Option<usize> {
        self.logic_to_phys.get(logical_id).copied()
    }

    /// Physical ids participating in at least one index. Registered by
    /// the owning table, not derived at construction.
    #[inline]
    pub fn indexed_cols(&self) -> &[usize] {
        &self.indexed_cols
    }

    #[inline]
    pub fn set_indexed_cols(&mut self, indexed_cols: Vec<usize>) {
        self.indexed_cols = indexed_cols;
    }

    /// Adds an attribute to the column at the given physical id.
    /// Value-preserving with respect to column count, order and offsets.
    #[inline]
    pub fn add_attr(&mut self, physical_id: usize, attr: ColumnAttr) {
        if let Some(column) = self.columns.get_mut(physical_id) {
            column.add_attr(attr);
        }
    }

    /// Adds an attribute to every column with the given name.
    #[inline]
    pub fn add_attr_by_name(&mut self, name: &str, attr: ColumnAttr) {
        for column in self.columns.iter_mut().filter(|c| c.name == name) {
            column.add_attr(attr);
        }
    }
}

/// Two schemas are equal iff column counts, uninlined counts and the
/// all-inlined flag match, and columns are pairwise equal in physical
/// order. Used by higher layers to detect no-op alters.
impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        if self.columns.len() != other.columns.len()
            || self.uninlined_cols.len() != other.uninlined_cols.len()
            || self.all_inlined != other.all_inlined
        {
            return false;
        }
        self.columns == other.columns
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Schema[NumColumns:{}, AllInlined:{}, FixedLength:{}, UninlinedCount:{}] :: (",
            self.columns.len(),
            self.all_inlined,
            self.fixed_len,
            self.uninlined_cols.len()
        )?;
        let mut first = true;
        for column in &self.columns {
            if first {
                first = false;
            } else {
                f.write_str(", ")?;
            }
            write!(f, "{}", column)?;
        }
        f.write_str(")")
    }
}
