//! Per-variable classification: storage shape, initialization source,
//! reference copy and print format.

use crate::ctype::{self, VectorType};
use crate::diagnostic::Diagnostic;
use crate::manifest::{Role, VariableSpec};

/// Host storage shape of a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    /// Exactly one element.
    Scalar,
    /// `count` elements, count >= 2.
    Array { count: u64 },
}

impl Storage {
    pub fn from_count(count: u64) -> Self {
        if count == 1 {
            Storage::Scalar
        } else {
            Storage::Array { count }
        }
    }

    pub fn count(self) -> u64 {
        match self {
            Storage::Scalar => 1,
            Storage::Array { count } => count,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Storage::Array { .. })
    }
}

/// Where a host value gets its initial contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Init {
    /// Initializer text from the manifest, emitted verbatim.
    Literal(String),
    /// Named function called at startup with the storage and its count.
    Generator(String),
    /// Left to the preamble hook (or to the device, for outputs).
    External,
}

impl Init {
    fn of(var: &VariableSpec) -> Self {
        match (&var.literal, &var.generator) {
            (Some(text), _) => Init::Literal(text.clone()),
            (None, Some(function)) => Init::Generator(function.clone()),
            (None, None) => Init::External,
        }
    }
}

/// Everything the emitter needs to know about one variable's host side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableClass {
    pub role: Role,
    pub storage: Storage,
    /// Initialization of the host value itself.
    pub init: Init,
    /// Reference copy for validated outputs and how it is filled.
    pub reference: Option<Init>,
    pub vector: Option<VectorType>,
    /// printf conversion of one (lane) element.
    pub format: &'static str,
}

impl VariableClass {
    /// Host array allocated on the heap (freed in cleanup).
    pub fn heap_value(&self) -> bool {
        self.role != Role::Local && self.storage.is_array() && !matches!(self.init, Init::Literal(_))
    }

    /// Reference array allocated on the heap (freed in cleanup).
    pub fn heap_reference(&self) -> bool {
        self.storage.is_array() && matches!(self.reference, Some(Init::Generator(_) | Init::External))
    }
}

/// Classify one variable. `repeat` scales host-visible element counts;
/// scratch memory keeps its declared size.
pub fn classify(var: &VariableSpec, repeat: u64) -> Result<VariableClass, Diagnostic> {
    let vector = match ctype::vector_type(&var.ty) {
        Some(v) => Some(v),
        None if ctype::looks_like_vector(&var.ty) => {
            return Err(Diagnostic::error(
                format!("unknown OpenCL vector type '{}'", var.ty),
                var.span,
            )
            .with_help(
                "vector types are cl_<char|uchar|short|ushort|int|uint|long|ulong|half|float|double><2|3|4|8|16>"
                    .to_string(),
            ));
        }
        None => None,
    };

    let count = match var.role {
        Role::Local => var.nmemb,
        Role::Input | Role::Output => var.nmemb.checked_mul(repeat).ok_or_else(|| {
            Diagnostic::error(
                format!("element count of '{}' overflows after repeat", var.name),
                var.span,
            )
        })?,
    };

    let format = match vector {
        Some(v) => ctype::format_token(v.base),
        None => ctype::format_token(&var.ty),
    };

    let (init, reference) = match var.role {
        Role::Input => (Init::of(var), None),
        Role::Output if var.novalidation => (Init::External, None),
        Role::Output => (Init::External, Some(Init::of(var))),
        Role::Local => (Init::External, None),
    };

    Ok(VariableClass {
        role: var.role,
        storage: Storage::from_count(count),
        init,
        reference,
        vector,
        format,
    })
}
