//! Device buffer planning.

use super::classify::{Storage, VariableClass};
use super::VarId;
use crate::config::Template;
use crate::ctype;
use crate::manifest::{Manifest, Role};

/// Creation flags of a device buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemFlags {
    ReadOnly,
    ReadWrite,
    /// Read-write, initialized from the host value at creation.
    ReadWriteCopyHost,
}

impl MemFlags {
    pub fn as_c(self) -> &'static str {
        match self {
            MemFlags::ReadOnly => "CL_MEM_READ_ONLY",
            MemFlags::ReadWrite => "CL_MEM_READ_WRITE",
            MemFlags::ReadWriteCopyHost => "CL_MEM_READ_WRITE | CL_MEM_COPY_HOST_PTR",
        }
    }

    pub fn copies_host(self) -> bool {
        self == MemFlags::ReadWriteCopyHost
    }
}

/// When a host ↔ device transfer happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transfer {
    Never,
    Once,
    EveryIteration,
}

impl Transfer {
    pub fn happens(self) -> bool {
        self != Transfer::Never
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferPlan {
    pub var: VarId,
    /// Host variable name.
    pub host: String,
    /// Device handle name (`{host}K`).
    pub handle: String,
    pub elem_type: String,
    pub storage: Storage,
    pub flags: MemFlags,
    /// Buffer size in bytes when the element type is known.
    pub byte_size: Option<u64>,
    pub upload: Transfer,
    pub download: Transfer,
    /// Ident of the kernel whose queue carries the transfers.
    pub queue: String,
}

impl BufferPlan {
    /// C size expression: `4 * sizeof(float)`.
    pub fn size_expr(&self) -> String {
        format!("{} * sizeof({})", self.storage.count(), self.elem_type)
    }

    /// Host pointer expression for transfers.
    pub fn host_ptr(&self) -> String {
        if self.storage.is_array() {
            self.host.clone()
        } else {
            format!("&{}", self.host)
        }
    }
}

/// Decide buffers for every host variable that needs device memory.
///
/// Array inputs and all outputs get a buffer; scalar inputs are passed by
/// value. Buffers are listed in declaration order, which is also their
/// creation order.
pub fn plan_buffers(
    manifest: &Manifest,
    classes: &[Vec<VariableClass>],
    template: Template,
) -> Vec<BufferPlan> {
    let mut buffers = Vec::new();
    for (k, kernel) in manifest.kernels.iter().enumerate() {
        for (v, var) in kernel.variables.iter().enumerate() {
            let class = &classes[k][v];
            let (flags, upload, download) = match (var.role, template) {
                (Role::Local, _) => continue,
                (Role::Input, _) if !class.storage.is_array() => continue,
                (Role::Input, Template::Single) => (MemFlags::ReadOnly, Transfer::Once, Transfer::Never),
                (Role::Input, Template::Loop) => {
                    (MemFlags::ReadOnly, Transfer::EveryIteration, Transfer::Never)
                }
                (Role::Output, Template::Single) => {
                    (MemFlags::ReadWriteCopyHost, Transfer::Never, Transfer::Once)
                }
                (Role::Output, Template::Loop) => (
                    MemFlags::ReadWrite,
                    Transfer::EveryIteration,
                    Transfer::EveryIteration,
                ),
            };
            let byte_size = ctype::size_of(&var.ty).and_then(|s| s.checked_mul(class.storage.count()));
            buffers.push(BufferPlan {
                var: VarId { kernel: k, index: v },
                host: var.name.clone(),
                handle: format!("{}K", var.name),
                elem_type: var.ty.clone(),
                storage: class.storage,
                flags,
                byte_size,
                upload,
                download,
                queue: kernel.ident(),
            });
        }
    }
    buffers
}
