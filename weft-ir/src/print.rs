//! Human-readable dump of the IR, for logs and test diagnostics. There is no
//! parser for this form.

use crate::ir::{OpKind, OpRef, RegionRef, Value};
use crate::module::{Function, Module};
use ahash::AHashMap;
use std::fmt;
use weft_core::Type;

#[derive(Default)]
struct Namer<'a> {
    results: AHashMap<OpRef<'a>, usize>,
    args: AHashMap<(RegionRef<'a>, usize), usize>,
    next_result: usize,
    next_arg: usize,
}

impl<'a> Namer<'a> {
    fn number_region(&mut self, region: RegionRef<'a>) {
        for index in 0..region.args.len() {
            self.args.insert((region, index), self.next_arg);
            self.next_arg += 1;
        }
        for &op in region.ops.iter() {
            if op.type_ != Type::None {
                self.results.insert(op, self.next_result);
                self.next_result += 1;
            }
            for nested in op.regions() {
                self.number_region(nested);
            }
        }
    }

    fn value(&self, value: Value<'a>) -> String {
        match value {
            Value::Result(op, _) => match self.results.get(&op) {
                Some(n) => format!("%{}", n),
                None => "%?".to_string(),
            },
            Value::Arg(region, index) => match self.args.get(&(region, index)) {
                Some(n) => format!("%arg{}", n),
                None => "%arg?".to_string(),
            },
        }
    }

    fn values(&self, values: &[Value<'a>]) -> String {
        values
            .iter()
            .map(|&v| self.value(v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn fmt_region<'a>(
    f: &mut fmt::Formatter<'_>,
    namer: &Namer<'a>,
    region: RegionRef<'a>,
    indent: usize,
) -> fmt::Result {
    for &op in region.ops.iter() {
        fmt_op(f, namer, op, indent)?;
    }
    Ok(())
}

fn fmt_op<'a>(
    f: &mut fmt::Formatter<'_>,
    namer: &Namer<'a>,
    op: OpRef<'a>,
    indent: usize,
) -> fmt::Result {
    write!(f, "{:indent$}", "", indent = indent)?;
    if op.type_ != Type::None {
        write!(f, "{} = ", namer.value(op.result(0)))?;
    }
    match &op.kind {
        OpKind::Constant(literal) => writeln!(f, "constant {} : {}", literal, op.type_),
        OpKind::Alloc => writeln!(f, "alloc : {}", op.type_),
        OpKind::Load { memref, indices } => writeln!(
            f,
            "load {}[{}] : {}",
            namer.value(*memref),
            namer.values(indices),
            op.type_
        ),
        OpKind::Store {
            value,
            memref,
            indices,
        } => writeln!(
            f,
            "store {}, {}[{}]",
            namer.value(*value),
            namer.value(*memref),
            namer.values(indices)
        ),
        OpKind::Dealloc { memref } => writeln!(f, "dealloc {}", namer.value(*memref)),
        OpKind::Barrier { operands } => writeln!(f, "barrier({})", namer.values(operands)),
        OpKind::Parallel {
            lower,
            upper,
            step,
            body,
        } => {
            writeln!(
                f,
                "parallel {} = {} to {} step {} {{",
                namer.value(body.arg(0)),
                namer.value(*lower),
                namer.value(*upper),
                namer.value(*step)
            )?;
            fmt_region(f, namer, *body, indent + 2)?;
            writeln!(f, "{:indent$}}}", "", indent = indent)
        }
        OpKind::For {
            lower,
            upper,
            step,
            body,
        } => {
            writeln!(
                f,
                "for {} = {} to {} step {} {{",
                namer.value(body.arg(0)),
                namer.value(*lower),
                namer.value(*upper),
                namer.value(*step)
            )?;
            fmt_region(f, namer, *body, indent + 2)?;
            writeln!(f, "{:indent$}}}", "", indent = indent)
        }
        OpKind::If {
            condition,
            then_region,
            else_region,
        } => {
            writeln!(f, "if {} {{", namer.value(*condition))?;
            fmt_region(f, namer, *then_region, indent + 2)?;
            if let Some(else_region) = else_region {
                writeln!(f, "{:indent$}}} else {{", "", indent = indent)?;
                fmt_region(f, namer, *else_region, indent + 2)?;
            }
            writeln!(f, "{:indent$}}}", "", indent = indent)
        }
        OpKind::Call { callee, args } => {
            writeln!(f, "call @{}({})", callee, namer.values(args))
        }
        OpKind::Extension(ext) => writeln!(f, "ext.{}", ext.name()),
    }
}

impl<'a> fmt::Display for Function<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut namer = Namer::default();
        namer.number_region(self.body);

        let args: Vec<String> = (0..self.body.args.len())
            .map(|i| format!("{}: {}", namer.value(self.body.arg(i)), self.body.args[i]))
            .collect();
        writeln!(f, "func @{}({}) {{", self.name, args.join(", "))?;
        fmt_region(f, &namer, self.body, 2)?;
        writeln!(f, "}}")
    }
}

impl<'a> fmt::Display for Module<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for func in &self.functions {
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrBuilder;
    use bumpalo::Bump;
    use weft_core::Literal;

    #[test]
    fn test_display_function() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let body = builder.region(&[Type::Index]);
        let mem = builder.alloc();
        let val = builder.constant(Literal::F64(1.0));
        let store = builder.store(val.result(0), mem.result(0), &[body.arg(0)]);
        let bar = builder.barrier(&[body.arg(0)]);
        body.push(mem);
        body.push(val);
        body.push(store);
        body.push(bar);

        let func = Function::new("kernel", body);
        let printed = func.to_string();

        assert!(printed.contains("func @kernel(%arg0: index)"));
        assert!(printed.contains("%0 = alloc : memref"));
        assert!(printed.contains("%1 = constant 1 : f64"));
        assert!(printed.contains("store %1, %0[%arg0]"));
        assert!(printed.contains("barrier(%arg0)"));
    }

    #[test]
    fn test_display_nested_parallel() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let outer = builder.region(&[]);
        let lo = builder.constant(Literal::Index(0));
        let hi = builder.constant(Literal::Index(4));
        let step = builder.constant(Literal::Index(1));
        outer.push(lo);
        outer.push(hi);
        outer.push(step);

        let body = builder.region(&[Type::Index]);
        let bar = builder.barrier(&[body.arg(0)]);
        body.push(bar);
        let par = builder.parallel(lo.result(0), hi.result(0), step.result(0), body);
        outer.push(par);

        let func = Function::new("grid", outer);
        let printed = func.to_string();

        assert!(printed.contains("parallel %arg0 = %0 to %1 step %2 {"));
        assert!(printed.contains("    barrier(%arg0)"));
    }
}
