pub mod effects;
pub mod ir;
pub mod module;
pub mod pass;
pub mod passes;
pub mod print;
pub mod rewrite;
pub mod valuecmp;
pub mod verify;

pub use effects::{
    collect_effects, get_effects_after, get_effects_before, is_read_none, is_read_only, may_alias,
    may_alias_value, may_read_from, may_write_to, summarize, EffectInstance, EffectKind,
    EffectMask, Resource,
};
pub use ir::{
    match_constant, match_constant_int, EffectOp, IrBuilder, OpKind, OpRef, Operation, Region,
    RegionRef, Value,
};
pub use module::{Function, Module};
pub use pass::{OptimizationOptions, Pass, PassRunner};
pub use passes::barrier_elim::{BarrierElim, BarrierElimination};
pub use rewrite::{apply_patterns_greedily, NoMatch, RewritePattern, Rewriter};
pub use valuecmp::{value_cmp, value_cmp_affine, AffineExpr, Cmp, ValueOrInt};
pub use verify::{verify, VerifyError};

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use weft_core::{Literal, Type};

    fn count_barriers(region: RegionRef<'_>) -> usize {
        let mut count = 0;
        for &op in region.ops.iter() {
            if op.is_barrier() {
                count += 1;
            }
            for nested in op.regions() {
                count += count_barriers(nested);
            }
        }
        count
    }

    #[test]
    fn test_end_to_end_elimination() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        // parallel { load(a); barrier; load(b) } with distinct buffers: the
        // barrier orders nothing and the pipeline removes it.
        let outer = builder.region(&[]);
        let a = builder.alloc();
        let b = builder.alloc();
        let lo = builder.constant(Literal::Index(0));
        let hi = builder.constant(Literal::Index(16));
        let step = builder.constant(Literal::Index(1));
        for op in [a, b, lo, hi, step] {
            outer.push(op);
        }

        let body = builder.region(&[Type::Index]);
        let load_a = builder.load(a.result(0), &[body.arg(0)], Type::F64);
        let bar = builder.barrier(&[body.arg(0)]);
        let load_b = builder.load(b.result(0), &[body.arg(0)], Type::F64);
        body.push(load_a);
        body.push(bar);
        body.push(load_b);
        let par = builder.parallel(lo.result(0), hi.result(0), step.result(0), body);
        outer.push(par);

        let mut module = Module::new();
        module.add_function(Function::new("kernel", outer));

        let mut runner = PassRunner::new();
        runner.set_validate(true);
        runner.add(BarrierElimination::new(&OptimizationOptions::default()));
        runner.run(&mut module);

        assert_eq!(count_barriers(module.functions[0].body), 0);
    }

    #[test]
    fn test_end_to_end_disabled_pipeline() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let body = builder.region(&[Type::Index]);
        let bar = builder.barrier(&[body.arg(0)]);
        body.push(bar);

        let mut module = Module::new();
        module.add_function(Function::new("kernel", body));

        let options = OptimizationOptions {
            enable_barrier_elim: false,
            ..Default::default()
        };
        let mut runner = PassRunner::new();
        runner.add(BarrierElimination::new(&options));
        runner.run(&mut module);

        assert_eq!(count_barriers(module.functions[0].body), 1);
    }
}
