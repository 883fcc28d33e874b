//! Shared exit path.
//!
//! Success and every failure reach the `_err` label. Each resource is
//! released only if it was acquired, in reverse order of acquisition.

use super::HostEmitter;
use crate::config::Hook;
use crate::manifest::Role;
use crate::plan::VarId;

impl HostEmitter<'_> {
    pub(super) fn emit_cleanup(&mut self) {
        let manifest = self.manifest;
        let plan = self.plan;

        self.blank();
        self.line(0, "_err:");

        if plan.schedule.sync_points() > 0 {
            self.blank();
            self.line(1, "/* Dealloc events */");
            for tier in (0..plan.schedule.sync_points()).rev() {
                self.emit_release_list(1, tier);
            }
        }

        if !plan.buffers.is_empty() {
            self.blank();
            self.line(1, "/* Dealloc buffers */");
            for buffer in plan.buffers.iter().rev() {
                self.release(&buffer.handle, "clReleaseMemObject");
            }
        }

        if !manifest.kernels.is_empty() {
            self.blank();
            self.line(1, "/* Dealloc kernels */");
            for kernel in manifest.kernels.iter().rev() {
                self.release(&format!("kernel{}", kernel.ident()), "clReleaseKernel");
            }
        }

        self.blank();
        self.line(1, "/* Dealloc program */");
        self.release("program", "clReleaseProgram");
        self.release("programContent", "free");
        self.release("programFile", "fclose");

        if !manifest.kernels.is_empty() {
            self.blank();
            self.line(1, "/* Dealloc queues */");
            for kernel in manifest.kernels.iter().rev() {
                self.release(&format!("queue{}", kernel.ident()), "clReleaseCommandQueue");
            }
        }

        self.blank();
        self.line(1, "/* Last OpenCL variables */");
        self.release("context", "clReleaseContext");
        self.release("devices", "free");
        self.release("platforms", "free");

        self.emit_hook(1, Hook::Cleanup);

        let mut heap = Vec::new();
        for (k, kernel) in manifest.kernels.iter().enumerate() {
            for (v, var) in kernel.variables.iter().enumerate() {
                if var.role == Role::Local {
                    continue;
                }
                let class = plan.class(VarId { kernel: k, index: v });
                if class.heap_value() {
                    heap.push(var.name.clone());
                }
                if class.heap_reference() {
                    heap.push(format!("{}C", var.name));
                }
            }
        }
        if !heap.is_empty() {
            self.blank();
            self.line(1, "/* Dealloc variables */");
            for name in heap.iter().rev() {
                self.release(name, "free");
            }
        }

        self.blank();
        self.line(1, "return rv;");
        self.line(0, "}");
    }

    /// `if(handle) release(handle);`
    fn release(&mut self, handle: &str, function: &str) {
        self.line(1, format!("if({})", handle));
        self.line(2, format!("{}({});", function, handle));
    }
}
