use crate::effects::EffectInstance;
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use weft_core::{Literal, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OpRef<'a>(NonNull<Operation<'a>>);

impl<'a> OpRef<'a> {
    pub fn new(ptr: &'a mut Operation<'a>) -> Self {
        Self(NonNull::from(ptr))
    }

    pub fn as_ptr(&self) -> *mut Operation<'a> {
        self.0.as_ptr()
    }

    /// The `index`-th result of this operation as a value handle.
    pub fn result(self, index: usize) -> Value<'a> {
        Value::Result(self, index)
    }

    /// The operation owning the region this operation lives in, if any.
    pub fn parent_op(self) -> Option<OpRef<'a>> {
        self.parent.and_then(|region| region.parent)
    }

    /// Detaches the operation from its enclosing region. The arena reclaims
    /// the storage when it is dropped.
    pub fn erase(mut self) {
        if let Some(mut region) = self.parent {
            if let Some(pos) = region.position(self) {
                region.ops.remove(pos);
            }
            self.parent = None;
        }
    }
}

unsafe impl<'a> Send for OpRef<'a> {}
unsafe impl<'a> Sync for OpRef<'a> {}

impl<'a> Deref for OpRef<'a> {
    type Target = Operation<'a>;
    fn deref(&self) -> &Self::Target {
        unsafe { self.0.as_ref() }
    }
}

impl<'a> DerefMut for OpRef<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.0.as_mut() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RegionRef<'a>(NonNull<Region<'a>>);

impl<'a> RegionRef<'a> {
    pub fn new(ptr: &'a mut Region<'a>) -> Self {
        Self(NonNull::from(ptr))
    }

    pub fn as_ptr(&self) -> *mut Region<'a> {
        self.0.as_ptr()
    }

    /// The `index`-th region argument as a value handle.
    pub fn arg(self, index: usize) -> Value<'a> {
        Value::Arg(self, index)
    }

    /// Appends an operation at the end of the region and links it back.
    pub fn push(self, op: OpRef<'a>) {
        let mut region = self;
        let mut op = op;
        op.parent = Some(self);
        region.ops.push(op);
    }
}

unsafe impl<'a> Send for RegionRef<'a> {}
unsafe impl<'a> Sync for RegionRef<'a> {}

impl<'a> Deref for RegionRef<'a> {
    type Target = Region<'a>;
    fn deref(&self) -> &Self::Target {
        unsafe { self.0.as_ref() }
    }
}

impl<'a> DerefMut for RegionRef<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.0.as_mut() }
    }
}

/// A use of an SSA value, identified by its definition site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value<'a> {
    /// The `usize`-th result of an operation.
    Result(OpRef<'a>, usize),
    /// The `usize`-th argument of a region (e.g. an induction variable).
    Arg(RegionRef<'a>, usize),
}

impl<'a> Value<'a> {
    pub fn get_type(self) -> Type {
        match self {
            Value::Result(op, _) => op.type_,
            Value::Arg(region, index) => region.args.get(index).copied().unwrap_or(Type::None),
        }
    }
}

#[derive(Debug)]
pub struct Operation<'a> {
    pub kind: OpKind<'a>,
    pub type_: Type,
    pub parent: Option<RegionRef<'a>>,
}

#[derive(Debug)]
pub enum OpKind<'a> {
    Constant(Literal),
    Alloc,
    Load {
        memref: Value<'a>,
        indices: BumpVec<'a, Value<'a>>,
    },
    Store {
        value: Value<'a>,
        memref: Value<'a>,
        indices: BumpVec<'a, Value<'a>>,
    },
    Dealloc {
        memref: Value<'a>,
    },
    Barrier {
        operands: BumpVec<'a, Value<'a>>,
    },
    Parallel {
        lower: Value<'a>,
        upper: Value<'a>,
        step: Value<'a>,
        body: RegionRef<'a>,
    },
    For {
        lower: Value<'a>,
        upper: Value<'a>,
        step: Value<'a>,
        body: RegionRef<'a>,
    },
    If {
        condition: Value<'a>,
        then_region: RegionRef<'a>,
        else_region: Option<RegionRef<'a>>,
    },
    Call {
        callee: &'a str,
        args: BumpVec<'a, Value<'a>>,
    },
    /// An instruction kind outside the built-in set. The analyses only ever
    /// consult its effect capability, never its identity.
    Extension(&'a dyn EffectOp<'a>),
}

/// Capability interface for out-of-tree instruction kinds.
///
/// An extension op that answers `false` from [`has_memory_effects`] is treated
/// as touching anything, the same as any other op without the capability.
///
/// [`has_memory_effects`]: EffectOp::has_memory_effects
pub trait EffectOp<'a>: fmt::Debug {
    fn name(&self) -> &str;

    /// Whether the op implements the memory-effects capability.
    fn has_memory_effects(&self) -> bool {
        true
    }

    /// Appends the op's declared effects. Only called when
    /// [`EffectOp::has_memory_effects`] returns `true`.
    fn memory_effects(&self, effects: &mut Vec<EffectInstance<'a>>);
}

impl<'a> Operation<'a> {
    pub fn new(bump: &'a Bump, kind: OpKind<'a>, type_: Type) -> OpRef<'a> {
        OpRef::new(bump.alloc(Operation {
            kind,
            type_,
            parent: None,
        }))
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, OpKind::Barrier { .. })
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            OpKind::Constant(_) => "constant",
            OpKind::Alloc => "alloc",
            OpKind::Load { .. } => "load",
            OpKind::Store { .. } => "store",
            OpKind::Dealloc { .. } => "dealloc",
            OpKind::Barrier { .. } => "barrier",
            OpKind::Parallel { .. } => "parallel",
            OpKind::For { .. } => "for",
            OpKind::If { .. } => "if",
            OpKind::Call { .. } => "call",
            OpKind::Extension(ext) => ext.name(),
        }
    }

    /// The regions nested immediately under this operation.
    pub fn regions(&self) -> Vec<RegionRef<'a>> {
        match &self.kind {
            OpKind::Parallel { body, .. } | OpKind::For { body, .. } => vec![*body],
            OpKind::If {
                then_region,
                else_region,
                ..
            } => {
                let mut regions = vec![*then_region];
                if let Some(else_region) = else_region {
                    regions.push(*else_region);
                }
                regions
            }
            _ => Vec::new(),
        }
    }

    /// The operand values of this operation, in declaration order.
    pub fn operands(&self) -> Vec<Value<'a>> {
        match &self.kind {
            OpKind::Constant(_) | OpKind::Alloc | OpKind::Extension(_) => Vec::new(),
            OpKind::Load { memref, indices } => {
                let mut out = vec![*memref];
                out.extend(indices.iter().copied());
                out
            }
            OpKind::Store {
                value,
                memref,
                indices,
            } => {
                let mut out = vec![*value, *memref];
                out.extend(indices.iter().copied());
                out
            }
            OpKind::Dealloc { memref } => vec![*memref],
            OpKind::Barrier { operands } => operands.iter().copied().collect(),
            OpKind::Parallel {
                lower, upper, step, ..
            }
            | OpKind::For {
                lower, upper, step, ..
            } => vec![*lower, *upper, *step],
            OpKind::If { condition, .. } => vec![*condition],
            OpKind::Call { args, .. } => args.iter().copied().collect(),
        }
    }
}

#[derive(Debug)]
pub struct Region<'a> {
    pub args: BumpVec<'a, Type>,
    pub ops: BumpVec<'a, OpRef<'a>>,
    pub parent: Option<OpRef<'a>>,
}

impl<'a> Region<'a> {
    pub fn new(bump: &'a Bump, args: &[Type]) -> RegionRef<'a> {
        let mut arg_types = BumpVec::new_in(bump);
        arg_types.extend(args.iter().copied());
        RegionRef::new(bump.alloc(Region {
            args: arg_types,
            ops: BumpVec::new_in(bump),
            parent: None,
        }))
    }

    pub fn position(&self, op: OpRef<'a>) -> Option<usize> {
        self.ops.iter().position(|&o| o == op)
    }

    /// The operation immediately before `op` in program order.
    pub fn prev(&self, op: OpRef<'a>) -> Option<OpRef<'a>> {
        let pos = self.position(op)?;
        if pos == 0 {
            None
        } else {
            Some(self.ops[pos - 1])
        }
    }

    /// The operation immediately after `op` in program order.
    pub fn next(&self, op: OpRef<'a>) -> Option<OpRef<'a>> {
        let pos = self.position(op)?;
        self.ops.get(pos + 1).copied()
    }
}

/// Matches a value handle against a constant-defining operation.
pub fn match_constant(value: Value<'_>) -> Option<Literal> {
    if let Value::Result(op, 0) = value {
        if let OpKind::Constant(literal) = op.kind {
            return Some(literal);
        }
    }
    None
}

/// Matches a value handle against an integer constant, sign-extending.
pub fn match_constant_int(value: Value<'_>) -> Option<i64> {
    match_constant(value).and_then(|literal| literal.as_integer())
}

// Helpers for construction
pub struct IrBuilder<'a> {
    pub bump: &'a Bump,
}

impl<'a> IrBuilder<'a> {
    pub fn new(bump: &'a Bump) -> Self {
        Self { bump }
    }

    fn values(&self, values: &[Value<'a>]) -> BumpVec<'a, Value<'a>> {
        let mut out = BumpVec::new_in(self.bump);
        out.extend(values.iter().copied());
        out
    }

    pub fn region(&self, args: &[Type]) -> RegionRef<'a> {
        Region::new(self.bump, args)
    }

    pub fn constant(&self, value: Literal) -> OpRef<'a> {
        let type_ = value.get_type();
        Operation::new(self.bump, OpKind::Constant(value), type_)
    }

    pub fn alloc(&self) -> OpRef<'a> {
        Operation::new(self.bump, OpKind::Alloc, Type::MemRef)
    }

    pub fn load(&self, memref: Value<'a>, indices: &[Value<'a>], type_: Type) -> OpRef<'a> {
        Operation::new(
            self.bump,
            OpKind::Load {
                memref,
                indices: self.values(indices),
            },
            type_,
        )
    }

    pub fn store(&self, value: Value<'a>, memref: Value<'a>, indices: &[Value<'a>]) -> OpRef<'a> {
        Operation::new(
            self.bump,
            OpKind::Store {
                value,
                memref,
                indices: self.values(indices),
            },
            Type::None,
        )
    }

    pub fn dealloc(&self, memref: Value<'a>) -> OpRef<'a> {
        Operation::new(self.bump, OpKind::Dealloc { memref }, Type::None)
    }

    pub fn barrier(&self, operands: &[Value<'a>]) -> OpRef<'a> {
        Operation::new(
            self.bump,
            OpKind::Barrier {
                operands: self.values(operands),
            },
            Type::None,
        )
    }

    pub fn parallel(
        &self,
        lower: Value<'a>,
        upper: Value<'a>,
        step: Value<'a>,
        body: RegionRef<'a>,
    ) -> OpRef<'a> {
        let op = Operation::new(
            self.bump,
            OpKind::Parallel {
                lower,
                upper,
                step,
                body,
            },
            Type::None,
        );
        let mut body = body;
        body.parent = Some(op);
        op
    }

    pub fn for_(
        &self,
        lower: Value<'a>,
        upper: Value<'a>,
        step: Value<'a>,
        body: RegionRef<'a>,
    ) -> OpRef<'a> {
        let op = Operation::new(
            self.bump,
            OpKind::For {
                lower,
                upper,
                step,
                body,
            },
            Type::None,
        );
        let mut body = body;
        body.parent = Some(op);
        op
    }

    pub fn if_(
        &self,
        condition: Value<'a>,
        then_region: RegionRef<'a>,
        else_region: Option<RegionRef<'a>>,
    ) -> OpRef<'a> {
        let op = Operation::new(
            self.bump,
            OpKind::If {
                condition,
                then_region,
                else_region,
            },
            Type::None,
        );
        let mut then_region = then_region;
        then_region.parent = Some(op);
        if let Some(mut else_region) = else_region {
            else_region.parent = Some(op);
        }
        op
    }

    pub fn call(&self, callee: &'a str, args: &[Value<'a>], type_: Type) -> OpRef<'a> {
        Operation::new(
            self.bump,
            OpKind::Call {
                callee,
                args: self.values(args),
            },
            type_,
        )
    }

    pub fn extension(&self, ext: &'a dyn EffectOp<'a>) -> OpRef<'a> {
        Operation::new(self.bump, OpKind::Extension(ext), Type::None)
    }
}
