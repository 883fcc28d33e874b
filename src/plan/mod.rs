//! Planning passes between the manifest and the emitter.
//!
//! The plan is derived once per manifest and never mutated: variable
//! classification, the hook signature, the launch schedule, buffers,
//! argument bindings and validation checks. The emitter only renders it.

pub mod binding;
pub mod buffer;
pub mod classify;
pub mod order;
pub mod signature;
pub mod validation;

#[cfg(test)]
mod tests;

use log::{debug, info};

use crate::diagnostic::Diagnostic;
use crate::manifest::Manifest;

pub use binding::{ArgBinding, Binding};
pub use buffer::{BufferPlan, MemFlags, Transfer};
pub use classify::{Init, Storage, VariableClass};
pub use order::{LaunchSlot, Schedule, Tier};
pub use signature::{HookParam, Signature};
pub use validation::{Comparison, ValidationExpr};

/// Position of a variable: `manifest.kernels[kernel].variables[index]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VarId {
    pub kernel: usize,
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct Plan {
    /// Indexed like `manifest.kernels[k].variables[v]`.
    pub classes: Vec<Vec<VariableClass>>,
    pub signature: Signature,
    pub schedule: Schedule,
    /// In creation order.
    pub buffers: Vec<BufferPlan>,
    /// Per kernel, sorted by argument index.
    pub bindings: Vec<Vec<ArgBinding>>,
    pub validations: Vec<ValidationExpr>,
}

impl Plan {
    pub fn build(manifest: &Manifest) -> Result<Self, Vec<Diagnostic>> {
        let mut errors = Vec::new();
        let repeat = manifest.config.repeat;

        let mut classes = Vec::with_capacity(manifest.kernels.len());
        for kernel in &manifest.kernels {
            let mut row = Vec::with_capacity(kernel.variables.len());
            for var in &kernel.variables {
                match classify::classify(var, repeat) {
                    Ok(class) => row.push(class),
                    Err(e) => errors.push(e),
                }
            }
            classes.push(row);
        }

        let schedule = match Schedule::resolve(&manifest.kernels) {
            Ok(schedule) => Some(schedule),
            Err(mut errs) => {
                errors.append(&mut errs);
                None
            }
        };

        let schedule = match schedule {
            Some(schedule) if errors.is_empty() => schedule,
            _ => return Err(errors),
        };
        debug!(
            "classified {} variable(s) across {} tier(s)",
            manifest.variables().count(),
            schedule.tiers.len()
        );

        let template = manifest.config.template();
        let signature = Signature::build(manifest, &classes);
        let buffers = buffer::plan_buffers(manifest, &classes, template);
        let bindings = binding::bind_arguments(manifest, &classes, &buffers, template);
        let validations = validation::plan_validation(manifest, &classes);
        info!(
            "planned {} buffer(s), {} hook parameter(s), {} validation(s)",
            buffers.len(),
            signature.params().len(),
            validations.len()
        );

        Ok(Self {
            classes,
            signature,
            schedule,
            buffers,
            bindings,
            validations,
        })
    }

    pub fn class(&self, id: VarId) -> &VariableClass {
        &self.classes[id.kernel][id.index]
    }

    pub fn buffer(&self, id: VarId) -> Option<&BufferPlan> {
        self.buffers.iter().find(|b| b.var == id)
    }
}
