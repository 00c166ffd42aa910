use crate::Type;
use std::fmt;

#[derive(Clone, Copy, PartialEq)]
pub enum Literal {
    Index(i64),
    I1(bool),
    I64(i64),
    F64(f64),
}

impl Literal {
    pub fn get_type(&self) -> Type {
        match self {
            Literal::Index(_) => Type::Index,
            Literal::I1(_) => Type::I1,
            Literal::I64(_) => Type::I64,
            Literal::F64(_) => Type::F64,
        }
    }

    /// Sign-extended integer view of the literal, if it has one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Index(v) | Literal::I64(v) => Some(*v),
            Literal::I1(v) => Some(*v as i64),
            Literal::F64(_) => None,
        }
    }

    pub fn get_index(&self) -> i64 {
        if let Literal::Index(v) = self {
            *v
        } else {
            panic!("not an index literal");
        }
    }

    pub fn get_i64(&self) -> i64 {
        if let Literal::I64(v) = self {
            *v
        } else {
            panic!("not an i64 literal");
        }
    }

    pub fn get_f64(&self) -> f64 {
        if let Literal::F64(v) = self {
            *v
        } else {
            panic!("not an f64 literal");
        }
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Index(v) => write!(f, "index.const {}", v),
            Literal::I1(v) => write!(f, "i1.const {}", v),
            Literal::I64(v) => write!(f, "i64.const {}", v),
            Literal::F64(v) => write!(f, "f64.const {}", v),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Index(v) => write!(f, "{}", v),
            Literal::I1(v) => write!(f, "{}", v),
            Literal::I64(v) => write!(f, "{}", v),
            Literal::F64(v) => write!(f, "{}", v),
        }
    }
}
