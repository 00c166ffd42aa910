use crate::module::Module;
use crate::verify::verify;
use log::debug;

pub trait Pass {
    fn name(&self) -> &str;
    fn run<'a>(&mut self, module: &mut Module<'a>);
}

/// Explicit configuration for the optimization pipeline. Passed into pass
/// constructors instead of living in global mutable state, so tests can run
/// in parallel with different settings.
#[derive(Debug, Clone)]
pub struct OptimizationOptions {
    /// Gates the barrier elimination rule as a whole.
    pub enable_barrier_elim: bool,
    /// Refuse to remove a barrier whose directly-enclosing construct is a
    /// parallel loop.
    pub barrier_not_top_level: bool,
}

impl Default for OptimizationOptions {
    fn default() -> Self {
        Self {
            enable_barrier_elim: true,
            barrier_not_top_level: false,
        }
    }
}

pub struct PassRunner {
    passes: Vec<Box<dyn Pass>>,
    validate_after_pass: bool,
}

impl Default for PassRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl PassRunner {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            validate_after_pass: false,
        }
    }

    pub fn set_validate(&mut self, validate: bool) {
        self.validate_after_pass = validate;
    }

    pub fn add<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    pub fn run<'a>(&mut self, module: &mut Module<'a>) {
        for pass in &mut self.passes {
            debug!("running pass '{}'", pass.name());
            pass.run(module);

            if self.validate_after_pass {
                for func in &module.functions {
                    if let Err(errors) = verify(func) {
                        let messages: Vec<String> =
                            errors.iter().map(|e| e.to_string()).collect();
                        panic!(
                            "validation failed after pass '{}' in function '{}':\n{}",
                            pass.name(),
                            func.name,
                            messages.join("\n")
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrBuilder;
    use crate::module::Function;
    use bumpalo::Bump;

    struct MockPass;

    impl Pass for MockPass {
        fn name(&self) -> &str {
            "MockPass"
        }

        fn run<'a>(&mut self, module: &mut Module<'a>) {
            for func in &mut module.functions {
                func.name.push_str("_visited");
            }
        }
    }

    #[test]
    fn test_pass_runner() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);
        let mut module = Module::new();
        module.add_function(Function::new("test", builder.region(&[])));

        let mut runner = PassRunner::new();
        runner.add(MockPass);
        runner.run(&mut module);

        assert_eq!(module.functions[0].name, "test_visited");
    }

    #[test]
    fn test_pass_runner_validation_failure() {
        // A pass that detaches an op's back-link but leaves it in the region.
        struct BrokenPass;
        impl Pass for BrokenPass {
            fn name(&self) -> &str {
                "BrokenPass"
            }
            fn run<'a>(&mut self, module: &mut Module<'a>) {
                for func in &module.functions {
                    if let Some(&op) = func.body.ops.first() {
                        let mut op = op;
                        op.parent = None;
                    }
                }
            }
        }

        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);
        let body = builder.region(&[]);
        body.push(builder.alloc());

        let mut module = Module::new();
        module.add_function(Function::new("test", body));

        let mut runner = PassRunner::new();
        runner.set_validate(true);
        runner.add(BrokenPass);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runner.run(&mut module);
        }));

        assert!(result.is_err(), "PassRunner should panic on validation error");
    }
}
