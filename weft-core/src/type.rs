use std::fmt;

/// Value type of the parallel IR.
///
/// `MemRef` is deliberately shapeless: the alias analysis identifies buffers
/// by their defining operation, not by layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    None,
    Index,
    I1,
    I64,
    F64,
    MemRef,
}

impl Type {
    pub fn is_integer(self) -> bool {
        matches!(self, Type::Index | Type::I1 | Type::I64)
    }

    pub fn is_memref(self) -> bool {
        self == Type::MemRef
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Type::None => write!(f, "none"),
            Type::Index => write!(f, "index"),
            Type::I1 => write!(f, "i1"),
            Type::I64 => write!(f, "i64"),
            Type::F64 => write!(f, "f64"),
            Type::MemRef => write!(f, "memref"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
