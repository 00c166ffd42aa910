//! Memory-effect collection and aliasing for the parallel IR.
//!
//! Everything here is conservative by construction: an effect pair is assumed
//! to alias unless disjointness is provable, and an op without the effects
//! capability is assumed to touch anything. The barrier elimination pattern
//! builds directly on these queries.

use crate::ir::{OpKind, OpRef, Value};
use bitflags::bitflags;
use log::trace;

bitflags! {
    /// Summary of the effect kinds present in a collected set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EffectMask: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const ALLOCATE = 1 << 2;
        const FREE = 1 << 3;
        const OTHER = 1 << 4;

        /// Anything that mutates state.
        const WRITES = Self::WRITE.bits() | Self::ALLOCATE.bits()
            | Self::FREE.bits() | Self::OTHER.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Read,
    Write,
    Allocate,
    Free,
    Other,
}

impl EffectKind {
    pub fn mask(self) -> EffectMask {
        match self {
            EffectKind::Read => EffectMask::READ,
            EffectKind::Write => EffectMask::WRITE,
            EffectKind::Allocate => EffectMask::ALLOCATE,
            EffectKind::Free => EffectMask::FREE,
            EffectKind::Other => EffectMask::OTHER,
        }
    }

    #[inline]
    pub fn is_read(self) -> bool {
        self == EffectKind::Read
    }
}

/// The abstract memory object an effect targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource<'a> {
    /// Any memory; nothing is known about the target.
    Default,
    /// A distinct allocation, identified by its defining op.
    Allocation(OpRef<'a>),
}

/// A single declared memory effect. Immutable; lives only for the duration of
/// the analysis call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectInstance<'a> {
    pub kind: EffectKind,
    pub resource: Option<Resource<'a>>,
    pub value: Option<Value<'a>>,
}

impl<'a> EffectInstance<'a> {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            resource: None,
            value: None,
        }
    }

    pub fn with_resource(mut self, resource: Resource<'a>) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_value(mut self, value: Value<'a>) -> Self {
        self.value = Some(value);
        self
    }
}

/// Computes the union mask of a collected effect set.
pub fn summarize(effects: &[EffectInstance<'_>]) -> EffectMask {
    effects
        .iter()
        .fold(EffectMask::empty(), |mask, e| mask | e.kind.mask())
}

/// The allocation a value is a view of, when its definition makes that known.
fn base_allocation<'a>(value: Value<'a>) -> Option<OpRef<'a>> {
    if let Value::Result(op, _) = value {
        if matches!(op.kind, OpKind::Alloc) {
            return Some(op);
        }
    }
    None
}

fn identity<'a>(effect: &EffectInstance<'a>) -> Option<OpRef<'a>> {
    match effect.resource {
        Some(Resource::Allocation(op)) => Some(op),
        _ => effect.value.and_then(base_allocation),
    }
}

/// Whether two effects can target overlapping memory. True unless disjointness
/// is provable; never returns a false negative.
pub fn may_alias<'a>(a: &EffectInstance<'a>, b: &EffectInstance<'a>) -> bool {
    if let (Some(va), Some(vb)) = (a.value, b.value) {
        if va == vb {
            return true;
        }
    }
    match (identity(a), identity(b)) {
        // Two distinct allocations cannot overlap.
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

/// [`may_alias`] against a raw value handle, treated as an implicit
/// read+write of whatever the value refers to.
pub fn may_alias_value<'a>(effect: &EffectInstance<'a>, value: Value<'a>) -> bool {
    if effect.value == Some(value) {
        return true;
    }
    match (identity(effect), base_allocation(value)) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

/// An op without the effects capability may do anything.
fn saturate_unknown(effects: &mut Vec<EffectInstance<'_>>) {
    effects.push(EffectInstance::new(EffectKind::Read));
    effects.push(EffectInstance::new(EffectKind::Write));
    effects.push(EffectInstance::new(EffectKind::Allocate));
    effects.push(EffectInstance::new(EffectKind::Free));
}

fn memref_effect<'a>(kind: EffectKind, memref: Value<'a>) -> EffectInstance<'a> {
    let mut effect = EffectInstance::new(kind).with_value(memref);
    if let Some(alloc) = base_allocation(memref) {
        effect = effect.with_resource(Resource::Allocation(alloc));
    }
    effect
}

/// Appends the effects of `op` (recursing into any regions it owns) to
/// `effects`. Returns whether the collection is complete, i.e. every reached
/// op declared its effects. On an incomplete collection the set is saturated
/// with resource-less read/write/allocate/free instances, so the result stays
/// sound for pairwise alias scans either way.
pub fn collect_effects<'a>(
    op: OpRef<'a>,
    effects: &mut Vec<EffectInstance<'a>>,
    ignore_barriers: bool,
) -> bool {
    // Barriers order memory, they do not touch it.
    if ignore_barriers && op.is_barrier() {
        return true;
    }
    match &op.kind {
        OpKind::Constant(_) | OpKind::Barrier { .. } => true,
        OpKind::Alloc => {
            effects.push(
                EffectInstance::new(EffectKind::Allocate)
                    .with_resource(Resource::Allocation(op))
                    .with_value(op.result(0)),
            );
            true
        }
        OpKind::Load { memref, .. } => {
            effects.push(memref_effect(EffectKind::Read, *memref));
            true
        }
        OpKind::Store { memref, .. } => {
            effects.push(memref_effect(EffectKind::Write, *memref));
            true
        }
        OpKind::Dealloc { memref } => {
            effects.push(memref_effect(EffectKind::Free, *memref));
            true
        }
        OpKind::Parallel { body, .. } | OpKind::For { body, .. } => {
            let mut complete = true;
            for &inner in body.ops.iter() {
                if !collect_effects(inner, effects, ignore_barriers) {
                    complete = false;
                }
            }
            complete
        }
        OpKind::If {
            then_region,
            else_region,
            ..
        } => {
            let mut complete = true;
            for &inner in then_region.ops.iter() {
                if !collect_effects(inner, effects, ignore_barriers) {
                    complete = false;
                }
            }
            if let Some(else_region) = else_region {
                for &inner in else_region.ops.iter() {
                    if !collect_effects(inner, effects, ignore_barriers) {
                        complete = false;
                    }
                }
            }
            complete
        }
        OpKind::Call { .. } => {
            saturate_unknown(effects);
            false
        }
        OpKind::Extension(ext) => {
            if ext.has_memory_effects() {
                ext.memory_effects(effects);
                true
            } else {
                saturate_unknown(effects);
                false
            }
        }
    }
}

/// Effects visible before `op` in program order.
///
/// Walks siblings backwards; a barrier terminates the walk when
/// `stop_at_barrier` is set, otherwise it is skipped. When a region is
/// exhausted the walk widens into the parent along the ownership chain, up to
/// the function top or the directly-enclosing parallel construct (the
/// barrier's synchronization scope). For a sequential loop parent the whole
/// loop body is collected as well, since other iterations are visible on both
/// sides.
pub fn get_effects_before<'a>(
    op: OpRef<'a>,
    effects: &mut Vec<EffectInstance<'a>>,
    stop_at_barrier: bool,
) -> bool {
    let mut complete = true;
    let mut cur = op;
    // Explicit walk up the ownership chain; bounded by region depth.
    loop {
        let Some(region) = cur.parent else { break };
        let mut walker = region.prev(cur);
        while let Some(sibling) = walker {
            if sibling.is_barrier() {
                if stop_at_barrier {
                    trace!("before-walk stopped at barrier");
                    return complete;
                }
            } else if !collect_effects(sibling, effects, true) {
                complete = false;
            }
            walker = region.prev(sibling);
        }
        let Some(parent) = region.parent else { break };
        if matches!(parent.kind, OpKind::Parallel { .. }) {
            // The enclosing parallel construct is the synchronization scope;
            // it already orders everything outside itself.
            return complete;
        }
        if matches!(parent.kind, OpKind::For { .. }) {
            if !collect_effects(parent, effects, true) {
                complete = false;
            }
        }
        cur = parent;
    }
    trace!("before-walk collected {} effects", effects.len());
    complete
}

/// Effects visible after `op` in program order; mirror of
/// [`get_effects_before`].
pub fn get_effects_after<'a>(
    op: OpRef<'a>,
    effects: &mut Vec<EffectInstance<'a>>,
    stop_at_barrier: bool,
) -> bool {
    let mut complete = true;
    let mut cur = op;
    loop {
        let Some(region) = cur.parent else { break };
        let mut walker = region.next(cur);
        while let Some(sibling) = walker {
            if sibling.is_barrier() {
                if stop_at_barrier {
                    trace!("after-walk stopped at barrier");
                    return complete;
                }
            } else if !collect_effects(sibling, effects, true) {
                complete = false;
            }
            walker = region.next(sibling);
        }
        let Some(parent) = region.parent else { break };
        if matches!(parent.kind, OpKind::Parallel { .. }) {
            return complete;
        }
        if matches!(parent.kind, OpKind::For { .. }) {
            if !collect_effects(parent, effects, true) {
                complete = false;
            }
        }
        cur = parent;
    }
    trace!("after-walk collected {} effects", effects.len());
    complete
}

/// Whether `op` (including anything nested under it) only reads memory.
pub fn is_read_only(op: OpRef<'_>) -> bool {
    let mut effects = Vec::new();
    if !collect_effects(op, &mut effects, false) {
        return false;
    }
    !summarize(&effects).intersects(EffectMask::WRITES)
}

/// Whether `op` (including anything nested under it) touches no memory.
pub fn is_read_none(op: OpRef<'_>) -> bool {
    let mut effects = Vec::new();
    collect_effects(op, &mut effects, false) && effects.is_empty()
}

/// Whether `op` may read from the memory `value` refers to.
pub fn may_read_from<'a>(op: OpRef<'a>, value: Value<'a>) -> bool {
    let mut effects = Vec::new();
    if !collect_effects(op, &mut effects, true) {
        return true;
    }
    effects
        .iter()
        .any(|e| e.kind == EffectKind::Read && may_alias_value(e, value))
}

/// Whether `op` may write to the memory `value` refers to.
pub fn may_write_to<'a>(op: OpRef<'a>, value: Value<'a>, ignore_barrier: bool) -> bool {
    let mut effects = Vec::new();
    if !collect_effects(op, &mut effects, ignore_barrier) {
        return true;
    }
    effects
        .iter()
        .any(|e| e.kind == EffectKind::Write && may_alias_value(e, value))
}
