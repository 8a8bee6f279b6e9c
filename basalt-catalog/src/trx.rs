//! Transaction handle consumed by DDL execution.
//!
//! The catalog hands out snapshot timestamps from a single monotonic
//! counter shared with schema-install commit timestamps. A transaction
//! observes exactly the schema versions committed at or before its
//! snapshot, so a concurrently committing alter never changes what an
//! in-flight transaction reads.

pub type TrxID = u64;

pub const INVALID_TRX_ID: TrxID = !0;

/// Outcome of a statement recorded on its transaction. This is the
/// authoritative signal; boolean executor returns mirror it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Success,
    Failure,
    /// Lost a conflict against a concurrently committed change and must
    /// be restarted by the caller.
    Aborted,
}

#[derive(Debug)]
pub struct Transaction {
    sts: TrxID,
    result: ResultType,
}

impl Transaction {
    #[inline]
    pub(crate) fn new(sts: TrxID) -> Self {
        Transaction {
            sts,
            result: ResultType::Success,
        }
    }

    /// Snapshot timestamp fixed when the transaction began.
    #[inline]
    pub fn sts(&self) -> TrxID {
        self.sts
    }

    #[inline]
    pub fn set_result(&mut self, result: ResultType) {
        self.result = result;
    }

    #[inline]
    pub fn result(&self) -> ResultType {
        self.result
    }
}
