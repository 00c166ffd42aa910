//! Removal of provably redundant barriers.
//!
//! A barrier is redundant when either of two asymmetric effect windows is
//! conflict-free: synchronization only has to order the closest racing pair,
//! and an adjacent barrier already orders one of the two windows. Anything
//! unprovable keeps the barrier.

use crate::effects::{get_effects_after, get_effects_before, may_alias, EffectInstance};
use crate::ir::{match_constant_int, OpKind, OpRef};
use crate::module::Module;
use crate::pass::{OptimizationOptions, Pass};
use crate::rewrite::{apply_patterns_greedily, NoMatch, RewritePattern, Rewriter};
use log::debug;

/// Two effects conflict when they may alias and are not both reads.
fn has_conflict<'a>(before: &[EffectInstance<'a>], after: &[EffectInstance<'a>]) -> bool {
    for b in before {
        for a in after {
            if may_alias(b, a) {
                if b.kind.is_read() && a.kind.is_read() {
                    continue;
                }
                // Write/write conflicts too: the accesses may target
                // different offsets, so neither subsumes the other.
                return true;
            }
        }
    }
    false
}

pub struct BarrierElim {
    enabled: bool,
    not_top_level: bool,
}

impl BarrierElim {
    pub fn new(enabled: bool, not_top_level: bool) -> Self {
        Self {
            enabled,
            not_top_level,
        }
    }
}

impl<'a> RewritePattern<'a> for BarrierElim {
    fn name(&self) -> &str {
        "barrier-elim"
    }

    fn match_and_rewrite(
        &self,
        op: OpRef<'a>,
        rewriter: &mut Rewriter<'a>,
    ) -> Result<(), NoMatch> {
        if !self.enabled {
            return Err(NoMatch);
        }
        let OpKind::Barrier { operands } = &op.kind else {
            return Err(NoMatch);
        };

        // A barrier over compile-time constants synchronizes nothing that
        // varies at runtime.
        if operands
            .iter()
            .all(|&v| match_constant_int(v).is_some())
        {
            debug!("erasing barrier: all operands constant");
            rewriter.erase_op(op);
            return Ok(());
        }

        if self.not_top_level {
            if let Some(parent) = op.parent_op() {
                if matches!(parent.kind, OpKind::Parallel { .. }) {
                    return Err(NoMatch);
                }
            }
        }

        // Strict before / loose after.
        {
            let mut before = Vec::new();
            get_effects_before(op, &mut before, /*stop_at_barrier=*/ true);
            let mut after = Vec::new();
            get_effects_after(op, &mut after, /*stop_at_barrier=*/ false);

            if !has_conflict(&before, &after) {
                debug!("erasing barrier: no conflict in strict-before window");
                rewriter.erase_op(op);
                return Ok(());
            }
        }

        // Loose before / strict after.
        {
            let mut before = Vec::new();
            get_effects_before(op, &mut before, /*stop_at_barrier=*/ false);
            let mut after = Vec::new();
            get_effects_after(op, &mut after, /*stop_at_barrier=*/ true);

            if !has_conflict(&before, &after) {
                debug!("erasing barrier: no conflict in strict-after window");
                rewriter.erase_op(op);
                return Ok(());
            }
        }

        debug!("keeping barrier: both windows conflict");
        Err(NoMatch)
    }
}

/// Pass facade over the rewrite pattern.
pub struct BarrierElimination {
    options: OptimizationOptions,
}

impl BarrierElimination {
    pub fn new(options: &OptimizationOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Pass for BarrierElimination {
    fn name(&self) -> &str {
        "barrier-elim"
    }

    fn run<'a>(&mut self, module: &mut Module<'a>) {
        let pattern = BarrierElim::new(
            self.options.enable_barrier_elim,
            self.options.barrier_not_top_level,
        );
        for func in &module.functions {
            let erased = apply_patterns_greedily(func, &[&pattern]);
            debug!("barrier-elim erased {} ops in '{}'", erased, func.name);
        }
    }
}
