use std::borrow::Cow;

/// Length in bytes of the fixed-region descriptor of a non-inlined value:
/// 2-byte length, 2-byte page offset, 12-byte prefix.
pub const VAR_REF_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreciseType {
    /// Integer type.
    /// First argument is byte number.
    /// Second argument is unsigned flag.
    Int(u8, bool),
    Decimal(u8, u8),
    Float(u8),
    Bool,
    Date,
    Time(u8),
    Datetime(u8),
    /// Note: Char and Varchar length is not same as bytes.
    /// It depends on collation, e.g. commonly used utf8mb4
    /// uses at most 4 bytes to store single character.
    Char(u16, Collation),
    Varchar(u16, Collation),
}

impl PreciseType {
    #[inline]
    pub fn bool() -> Self {
        PreciseType::Bool
    }

    #[inline]
    pub fn int(bytes: u8, unsigned: bool) -> Self {
        PreciseType::Int(bytes, unsigned)
    }

    #[inline]
    pub fn i32() -> Self {
        PreciseType::Int(4, false)
    }

    #[inline]
    pub fn u32() -> Self {
        PreciseType::Int(4, true)
    }

    #[inline]
    pub fn i64() -> Self {
        PreciseType::Int(8, false)
    }

    #[inline]
    pub fn u64() -> Self {
        PreciseType::Int(8, true)
    }

    #[inline]
    pub fn f32() -> Self {
        PreciseType::Float(4)
    }

    #[inline]
    pub fn f64() -> Self {
        PreciseType::Float(8)
    }

    #[inline]
    pub fn decimal(max_prec: u8, max_frac: u8) -> Self {
        PreciseType::Decimal(max_prec, max_frac)
    }

    #[inline]
    pub fn char(len: u16, collation: Collation) -> Self {
        PreciseType::Char(len, collation)
    }

    #[inline]
    pub fn varchar(max_len: u16, collation: Collation) -> Self {
        PreciseType::Varchar(max_len, collation)
    }

    #[inline]
    pub fn ascii(len: u16) -> Self {
        PreciseType::Char(len, Collation::Ascii)
    }

    #[inline]
    pub fn var_ascii(max_len: u16) -> Self {
        PreciseType::Varchar(max_len, Collation::Ascii)
    }

    #[inline]
    pub fn utf8(len: u16) -> Self {
        PreciseType::Char(len, Collation::Utf8mb4)
    }

    #[inline]
    pub fn var_utf8(max_len: u16) -> Self {
        PreciseType::Varchar(max_len, Collation::Utf8mb4)
    }

    #[inline]
    pub fn bytes(len: u16) -> Self {
        PreciseType::Char(len, Collation::Binary)
    }

    #[inline]
    pub fn var_bytes(max_len: u16) -> Self {
        PreciseType::Varchar(max_len, Collation::Binary)
    }

    #[inline]
    pub fn date() -> Self {
        PreciseType::Date
    }

    #[inline]
    pub fn time(frac: u8) -> Self {
        PreciseType::Time(frac)
    }

    #[inline]
    pub fn datetime(frac: u8) -> Self {
        PreciseType::Datetime(frac)
    }

    /// Returns whether the full value is stored within the fixed-length
    /// region of a tuple. Non-inlined values leave only a fixed-size
    /// reference there.
    #[inline]
    pub fn is_inlined(&self) -> bool {
        !matches!(self, PreciseType::Varchar(..))
    }

    /// Number of bytes the value occupies in the fixed-length region of
    /// a tuple. For non-inlined types this is the reference size, not
    /// the value size.
    #[inline]
    pub fn fixed_len(&self) -> usize {
        match self {
            PreciseType::Int(bytes, _) | PreciseType::Float(bytes) => *bytes as usize,
            PreciseType::Bool => 1,
            PreciseType::Date => 4,
            PreciseType::Time(..) | PreciseType::Datetime(..) => 8,
            PreciseType::Decimal(..) => 16,
            PreciseType::Char(len, collation) => *len as usize * collation.max_bytes_per_char(),
            PreciseType::Varchar(..) => VAR_REF_LEN,
        }
    }

    /// Maximum byte length of a non-inlined value, `None` for inlined types.
    #[inline]
    pub fn var_len_capacity(&self) -> Option<usize> {
        match self {
            PreciseType::Varchar(max_len, collation) => {
                Some(*max_len as usize * collation.max_bytes_per_char())
            }
            _ => None,
        }
    }

    #[inline]
    pub fn to_lower(&self) -> Cow<'_, str> {
        match self {
            PreciseType::Int(bytes, unsigned) => {
                if *unsigned {
                    Cow::Owned(format!("uint({})", bytes))
                } else {
                    Cow::Owned(format!("int({})", bytes))
                }
            }
            PreciseType::Decimal(max_prec, max_frac) => {
                Cow::Owned(format!("decimal({}, {})", max_prec, max_frac))
            }
            PreciseType::Float(bytes) => Cow::Owned(format!("float({})", bytes)),
            PreciseType::Bool => Cow::Borrowed("bool"),
            PreciseType::Date => Cow::Borrowed("date"),
            PreciseType::Time(frac) => Cow::Owned(format!("time({})", frac)),
            PreciseType::Datetime(frac) => Cow::Owned(format!("datetime({})", frac)),
            PreciseType::Char(n, c) => Cow::Owned(format!("char({}, {:?})", n, c)),
            PreciseType::Varchar(n, c) => Cow::Owned(format!("varchar({}, {:?})", n, c)),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collation {
    Ascii,
    Utf8mb4,
    Binary,
}

impl Collation {
    #[inline]
    pub const fn max_bytes_per_char(&self) -> usize {
        match self {
            Collation::Ascii | Collation::Binary => 1,
            Collation::Utf8mb4 => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_len() {
        assert_eq!(4, PreciseType::i32().fixed_len());
        assert_eq!(8, PreciseType::u64().fixed_len());
        assert_eq!(8, PreciseType::f64().fixed_len());
        assert_eq!(1, PreciseType::bool().fixed_len());
        assert_eq!(4, PreciseType::date().fixed_len());
        assert_eq!(8, PreciseType::datetime(6).fixed_len());
        assert_eq!(16, PreciseType::decimal(18, 2).fixed_len());
        assert_eq!(10, PreciseType::ascii(10).fixed_len());
        assert_eq!(40, PreciseType::utf8(10).fixed_len());
        // non-inlined types occupy only the reference in the fixed region
        assert_eq!(VAR_REF_LEN, PreciseType::var_utf8(255).fixed_len());
        assert_eq!(VAR_REF_LEN, PreciseType::var_bytes(1024).fixed_len());
    }

    #[test]
    fn test_inlining() {
        assert!(PreciseType::i64().is_inlined());
        assert!(PreciseType::utf8(16).is_inlined());
        assert!(!PreciseType::var_utf8(16).is_inlined());
        assert_eq!(None, PreciseType::i64().var_len_capacity());
        assert_eq!(Some(255), PreciseType::var_ascii(255).var_len_capacity());
        assert_eq!(Some(1020), PreciseType::var_utf8(255).var_len_capacity());
    }
}
