//! Kernel manifest model.
//!
//! The manifest is an XML document describing the kernels of a pipeline,
//! their argument variables and launch dimensions:
//!
//! ```xml
//! <kernels program="vadd.aocx" preamble="yes">
//!     <kernel name="vadd">
//!         <input name="a" type="float" nmemb="4" arg="0">1, 2, 3, 4</input>
//!         <input name="b" type="float" nmemb="4" arg="1"/>
//!         <output name="c" type="float" nmemb="4" arg="2" epsilon="0.001"/>
//!         <local type="float" nmemb="64" arg="3"/>
//!         <ndrange dim="1"><global>4</global><local>4</local></ndrange>
//!     </kernel>
//! </kernels>
//! ```
//!
//! Parsing is delegated to `roxmltree`; this module turns the tree into
//! typed, validated kernel and variable records. The result is immutable for the rest of the run.

use crate::config::GenConfig;
use crate::diagnostic::Diagnostic;
use crate::span::Span;

mod parse;
mod validate;

pub use parse::parse_manifest;


// ─── Data Types ────────────────────────────────────────────────────

/// What a variable is to its kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Host → device data.
    Input,
    /// Device → host data, validated against a reference unless disabled.
    Output,
    /// Work-group scratch memory; no host counterpart.
    Local,
}

impl Role {
    pub fn tag(self) -> &'static str {
        match self {
            Role::Input => "input",
            Role::Output => "output",
            Role::Local => "local",
        }
    }
}

/// Validation tolerance: the manifest text (emitted verbatim) and its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Epsilon {
    pub text: String,
    pub value: f64,
}

/// One kernel argument variable.
#[derive(Clone, Debug)]
pub struct VariableSpec {
    pub name: String,
    /// C type name (`float`, `cl_int4`, ...).
    pub ty: String,
    /// Declared element count, always >= 1.
    pub nmemb: u64,
    pub role: Role,
    /// Kernel argument index.
    pub arg: u32,
    /// Literal initializer text (element text of the declaration).
    pub literal: Option<String>,
    /// Function that fills the value at startup.
    pub generator: Option<String>,
    pub novalidation: bool,
    /// Tolerance for output validation.
    pub epsilon: Option<Epsilon>,
    pub span: Span,
}

/// Launch dimensions of a kernel.
#[derive(Clone, Debug)]
pub struct NdRange {
    /// Work dimensionality, 1..=3.
    pub dim: u32,
    /// Comma-separated global sizes (one entry per dimension).
    pub global: String,
    /// Comma-separated local sizes, present only with a `<local>` child.
    pub local: Option<String>,
    pub span: Span,
}

/// One kernel of the pipeline.
#[derive(Clone, Debug)]
pub struct KernelSpec {
    pub name: String,
    /// Dependency tier key; all kernels declare it or none does.
    pub order: Option<i64>,
    pub ndrange: NdRange,
    /// Argument variables in declaration order.
    pub variables: Vec<VariableSpec>,
    pub span: Span,
}

impl KernelSpec {
    /// Suffix used for the kernel's C identifiers (`queueVadd`, `kernelVadd`).
    pub fn ident(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

/// A parsed and validated manifest.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub config: GenConfig,
    pub kernels: Vec<KernelSpec>,
    /// Non-fatal findings collected while loading.
    pub warnings: Vec<Diagnostic>,
}

impl Manifest {
    /// All variables of all kernels, in declaration order, with their kernel index.
    pub fn variables(&self) -> impl Iterator<Item = (usize, &VariableSpec)> {
        self.kernels
            .iter()
            .enumerate()
            .flat_map(|(k, kernel)| kernel.variables.iter().map(move |v| (k, v)))
    }

    /// Host-visible variables (inputs and outputs), in declaration order.
    pub fn host_variables(&self) -> impl Iterator<Item = (usize, &VariableSpec)> {
        self.variables().filter(|(_, v)| v.role != Role::Local)
    }
}
