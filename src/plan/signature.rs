//! Hook call signature.
//!
//! Every hook receives the same ordered argument list: each host variable,
//! followed by its element count when it is an array, and the reference
//! copy of each validated output in the same shape. Per-iteration hooks
//! additionally receive `loopFlag`. The list is built once and shared by
//! the header documentation and every call site.

use super::classify::VariableClass;
use crate::manifest::{Manifest, Role};

/// One value handed to the hooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookParam {
    /// C identifier passed at the call site.
    pub name: String,
    /// Declared C type of the identifier (`float *` for arrays).
    pub ty: String,
    pub count: u64,
}

impl HookParam {
    pub fn is_array(&self) -> bool {
        self.count > 1
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<HookParam>,
}

impl Signature {
    /// Collect hook parameters in host-variable declaration order.
    ///
    /// `classes` is indexed like `manifest.kernels[k].variables[v]`.
    pub fn build(manifest: &Manifest, classes: &[Vec<VariableClass>]) -> Self {
        let mut params = Vec::new();
        for (k, kernel) in manifest.kernels.iter().enumerate() {
            for (v, var) in kernel.variables.iter().enumerate() {
                let class = &classes[k][v];
                if class.role == Role::Local {
                    continue;
                }
                let count = class.storage.count();
                let ty = if class.storage.is_array() {
                    format!("{} *", var.ty)
                } else {
                    var.ty.clone()
                };
                params.push(HookParam {
                    name: var.name.clone(),
                    ty: ty.clone(),
                    count,
                });
                if class.reference.is_some() {
                    params.push(HookParam {
                        name: format!("{}C", var.name),
                        ty,
                        count,
                    });
                }
            }
        }
        Self { params }
    }

    pub fn params(&self) -> &[HookParam] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Argument list at a call site: `a, 4, n, c, 4, cC, 4`.
    pub fn call_arguments(&self, loop_flag: bool) -> String {
        let mut args = Vec::new();
        for p in &self.params {
            args.push(p.name.clone());
            if p.is_array() {
                args.push(p.count.to_string());
            }
        }
        if loop_flag {
            args.push("loopFlag".to_string());
        }
        args.join(", ")
    }

    /// Formal parameter names for the header docs: `a, aSz, n, ...`.
    pub fn formal_names(&self, loop_flag: bool) -> String {
        let mut names = Vec::new();
        for p in &self.params {
            names.push(p.name.clone());
            if p.is_array() {
                names.push(format!("{}Sz", p.name));
            }
        }
        if loop_flag {
            names.push("loopFlag".to_string());
        }
        names.join(", ")
    }

    /// `(name, description)` rows documenting each formal parameter.
    pub fn formal_docs(&self) -> Vec<(String, String)> {
        let mut rows = Vec::new();
        for p in &self.params {
            rows.push((p.name.clone(), format!("variable ({})", p.ty)));
            if p.is_array() {
                rows.push((
                    format!("{}Sz", p.name),
                    "number of members in variable (unsigned int)".to_string(),
                ));
            }
        }
        rows
    }
}
