//! Kernel argument bindings.

use super::buffer::BufferPlan;
use super::classify::VariableClass;
use super::VarId;
use crate::config::Template;
use crate::manifest::{Manifest, Role};

/// What gets passed for one kernel argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    /// Scalar input passed by value.
    Value { host: String, ty: String },
    /// Device buffer handle.
    Handle { handle: String },
    /// Work-group scratch memory of the given size, no host data.
    Scratch { elements: u64, ty: String },
}

impl Binding {
    /// `arg_size` expression of `clSetKernelArg`.
    pub fn size_expr(&self) -> String {
        match self {
            Binding::Value { ty, .. } => format!("sizeof({})", ty),
            Binding::Handle { .. } => "sizeof(cl_mem)".to_string(),
            Binding::Scratch { elements, ty } => format!("{} * sizeof({})", elements, ty),
        }
    }

    /// `arg_value` expression of `clSetKernelArg`.
    pub fn value_expr(&self) -> String {
        match self {
            Binding::Value { host, .. } => format!("&{}", host),
            Binding::Handle { handle } => format!("&{}", handle),
            Binding::Scratch { .. } => "NULL".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgBinding {
    pub var: VarId,
    pub index: u32,
    /// Name used in failure messages.
    pub label: String,
    pub binding: Binding,
    /// Bound again before every launch (loop template, by-value inputs).
    pub rebind_each_iteration: bool,
}

/// Plan the argument bindings of every kernel, sorted by argument index.
///
/// Handles refer to buffers from `buffers`; the emitter creates all
/// buffers before any argument is set.
pub fn bind_arguments(
    manifest: &Manifest,
    classes: &[Vec<VariableClass>],
    buffers: &[BufferPlan],
    template: Template,
) -> Vec<Vec<ArgBinding>> {
    manifest
        .kernels
        .iter()
        .enumerate()
        .map(|(k, kernel)| {
            let mut args: Vec<ArgBinding> = kernel
                .variables
                .iter()
                .enumerate()
                .map(|(v, var)| {
                    let id = VarId { kernel: k, index: v };
                    let class = &classes[k][v];
                    let buffer = buffers.iter().find(|b| b.var == id);
                    let (binding, label) = match (var.role, buffer) {
                        (Role::Local, _) => (
                            Binding::Scratch {
                                elements: class.storage.count(),
                                ty: var.ty.clone(),
                            },
                            format!("__local {}", var.arg),
                        ),
                        (_, Some(b)) => (
                            Binding::Handle {
                                handle: b.handle.clone(),
                            },
                            b.handle.clone(),
                        ),
                        (_, None) => (
                            Binding::Value {
                                host: var.name.clone(),
                                ty: var.ty.clone(),
                            },
                            var.name.clone(),
                        ),
                    };
                    let rebind_each_iteration =
                        template == Template::Loop && matches!(binding, Binding::Value { .. });
                    ArgBinding {
                        var: id,
                        index: var.arg,
                        label,
                        binding,
                        rebind_each_iteration,
                    }
                })
                .collect();
            args.sort_by_key(|a| a.index);
            args
        })
        .collect()
}
