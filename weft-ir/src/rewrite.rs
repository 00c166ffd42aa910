use crate::ir::{OpRef, RegionRef};
use crate::module::Function;
use ahash::AHashSet;
use log::{debug, warn};

/// The pattern did not apply; the graph is untouched. An ordinary outcome,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoMatch;

pub trait RewritePattern<'a> {
    fn name(&self) -> &str;
    fn match_and_rewrite(&self, op: OpRef<'a>, rewriter: &mut Rewriter<'a>)
        -> Result<(), NoMatch>;
}

/// Mutation handle given to patterns; tracks what has been erased so the
/// driver can skip stale worklist entries.
#[derive(Debug, Default)]
pub struct Rewriter<'a> {
    erased: AHashSet<OpRef<'a>>,
}

impl<'a> Rewriter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn erase_op(&mut self, op: OpRef<'a>) {
        op.erase();
        self.erased.insert(op);
    }

    pub fn was_erased(&self, op: OpRef<'a>) -> bool {
        self.erased.contains(&op)
    }

    pub fn num_erased(&self) -> usize {
        self.erased.len()
    }
}

fn collect_ops<'a>(region: RegionRef<'a>, out: &mut Vec<OpRef<'a>>) {
    for &op in region.ops.iter() {
        out.push(op);
        for nested in op.regions() {
            collect_ops(nested, out);
        }
    }
}

const MAX_SWEEPS: usize = 16;

/// Sweeps the function, applying the first matching pattern per op, until a
/// sweep changes nothing. Returns the number of erased ops.
pub fn apply_patterns_greedily<'a>(
    func: &Function<'a>,
    patterns: &[&dyn RewritePattern<'a>],
) -> usize {
    let mut rewriter = Rewriter::new();
    let mut sweep = 0;
    loop {
        let erased_before = rewriter.num_erased();
        let mut worklist = Vec::new();
        collect_ops(func.body, &mut worklist);
        for op in worklist {
            if rewriter.was_erased(op) {
                continue;
            }
            for pattern in patterns {
                if pattern.match_and_rewrite(op, &mut rewriter).is_ok() {
                    debug!("pattern '{}' applied in '{}'", pattern.name(), func.name);
                    break;
                }
            }
        }
        if rewriter.num_erased() == erased_before {
            break;
        }
        sweep += 1;
        if sweep == MAX_SWEEPS {
            warn!(
                "pattern driver on '{}' still changing after {} sweeps, giving up",
                func.name, MAX_SWEEPS
            );
            break;
        }
    }
    rewriter.num_erased()
}
