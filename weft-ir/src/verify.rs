use crate::ir::{OpKind, RegionRef, Value};
use crate::module::Function;
use thiserror::Error;
use weft_core::Type;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("'{op}' does not link back to the region containing it")]
    BadParentLink { op: String },
    #[error("region under '{op}' does not link back to it")]
    BadRegionLink { op: String },
    #[error("'{op}' uses a value defined by a detached operation")]
    DetachedOperand { op: String },
    #[error("barrier operand has type {actual}, expected index")]
    NonIndexBarrierOperand { actual: Type },
    #[error("region argument index {index} out of range ({count} declared)")]
    ArgOutOfRange { index: usize, count: usize },
}

/// Structural validation of a function body: parent back-links, operand
/// attachment, and barrier operand typing.
pub fn verify<'a>(func: &Function<'a>) -> Result<(), Vec<VerifyError>> {
    let mut errors = Vec::new();
    verify_region(func.body, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn verify_region<'a>(region: RegionRef<'a>, errors: &mut Vec<VerifyError>) {
    for &op in region.ops.iter() {
        if op.parent != Some(region) {
            errors.push(VerifyError::BadParentLink {
                op: op.name().to_string(),
            });
        }

        for operand in op.operands() {
            match operand {
                Value::Result(def, _) => {
                    if def.parent.is_none() {
                        errors.push(VerifyError::DetachedOperand {
                            op: op.name().to_string(),
                        });
                    }
                }
                Value::Arg(arg_region, index) => {
                    if index >= arg_region.args.len() {
                        errors.push(VerifyError::ArgOutOfRange {
                            index,
                            count: arg_region.args.len(),
                        });
                    }
                }
            }
        }

        if let OpKind::Barrier { operands } = &op.kind {
            for &operand in operands.iter() {
                let actual = operand.get_type();
                if actual != Type::Index {
                    errors.push(VerifyError::NonIndexBarrierOperand { actual });
                }
            }
        }

        for nested in op.regions() {
            if nested.parent != Some(op) {
                errors.push(VerifyError::BadRegionLink {
                    op: op.name().to_string(),
                });
            }
            verify_region(nested, errors);
        }
    }
}
