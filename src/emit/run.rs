//! Execution section: uploads, launches and readback.
//!
//! The single template runs each step once. The loop template wraps the
//! same steps in `do { ... } while(loopFlag);`, re-uploading inputs and
//! outputs and re-binding by-value arguments on every pass.

use super::HostEmitter;
use crate::config::{Hook, Template};
use crate::plan::Schedule;

impl HostEmitter<'_> {
    pub(super) fn emit_run(&mut self) {
        match self.manifest.config.template() {
            Template::Single => self.emit_iteration(1, false),
            Template::Loop => {
                self.blank();
                self.line(1, "/* Kernel loop */");
                self.line(1, "do {");
                self.emit_hook(2, Hook::LoopPreamble);
                self.emit_iteration(2, true);
                self.emit_hook(2, Hook::LoopPostamble);
                self.line(1, "} while(loopFlag);");
            }
        }
    }

    fn emit_iteration(&mut self, depth: usize, in_loop: bool) {
        self.emit_uploads(depth, in_loop);
        self.emit_launches(depth, in_loop);
        self.emit_readback(depth, in_loop);
        self.emit_event_release(depth);
        self.blank();
        self.line(depth, "iterations++;");
    }

    fn emit_uploads(&mut self, depth: usize, in_loop: bool) {
        let plan = self.plan;
        let uploads: Vec<_> = plan.buffers.iter().filter(|b| b.upload.happens()).collect();
        let rebinds: Vec<_> = self
            .manifest
            .kernels
            .iter()
            .zip(&plan.bindings)
            .flat_map(|(kernel, args)| {
                args.iter()
                    .filter(|a| a.rebind_each_iteration)
                    .map(move |a| (kernel.ident(), a))
            })
            .collect();
        if uploads.is_empty() && rebinds.is_empty() {
            return;
        }

        self.blank();
        self.line(depth, "/* Set buffers and arguments */");
        self.print_step(depth, in_loop, "Setting buffers...");
        for buffer in uploads {
            self.line(
                depth,
                format!(
                    "fRet = clEnqueueWriteBuffer(queue{}, {}, CL_TRUE, 0, {}, {}, 0, NULL, NULL);",
                    buffer.queue,
                    buffer.handle,
                    buffer.size_expr(),
                    buffer.host_ptr()
                ),
            );
            self.check_call(depth, &format!("clEnqueueWriteBuffer ({})", buffer.handle));
        }
        for (ident, arg) in rebinds {
            self.emit_set_arg(depth, &ident, arg.index, &arg.binding, &arg.label);
        }
        self.line(depth, "PRINT_SUCCESS();");
    }

    fn emit_launches(&mut self, depth: usize, in_loop: bool) {
        let plan = self.plan;
        let manifest = self.manifest;
        let profiling = manifest.config.profiling();
        let schedule = &plan.schedule;

        self.blank();
        self.line(depth, "/* Run kernels */");
        self.print_step(depth, in_loop, "Running kernels...");
        if profiling {
            self.line(depth, "gettimeofday(&then, NULL);");
        }
        for launch in schedule.launches() {
            let kernel = &manifest.kernels[launch.kernel];
            let ident = kernel.ident();
            let local = if kernel.ndrange.local.is_some() {
                format!("localSize{}", ident)
            } else {
                "NULL".to_string()
            };
            let wait = match launch.wait {
                Some(tier) => format!("{}, {}", schedule.list_len(tier), Schedule::list_name(tier)),
                None => "0, NULL".to_string(),
            };
            let signal = match launch.signal {
                Some((tier, slot)) => format!("&{}[{}]", Schedule::list_name(tier), slot),
                None => "NULL".to_string(),
            };
            self.line(
                depth,
                format!(
                    "fRet = clEnqueueNDRangeKernel(queue{0}, kernel{0}, workDim{0}, NULL, globalSize{0}, {1}, {2}, {3});",
                    ident, local, wait, signal
                ),
            );
            self.check_call(depth, &format!("clEnqueueNDRangeKernel ({})", kernel.name));
        }
        for kernel in &manifest.kernels {
            self.line(depth, format!("fRet = clFinish(queue{});", kernel.ident()));
            self.check_call(depth, "clFinish");
        }
        if profiling {
            self.line(depth, "gettimeofday(&now, NULL);");
            self.line(
                depth,
                "execTime += (now.tv_sec - then.tv_sec) * 1000000 + (now.tv_usec - then.tv_usec);",
            );
        }
        self.line(depth, "PRINT_SUCCESS();");
    }

    fn emit_readback(&mut self, depth: usize, in_loop: bool) {
        let plan = self.plan;
        let downloads: Vec<_> = plan.buffers.iter().filter(|b| b.download.happens()).collect();
        if downloads.is_empty() {
            return;
        }
        self.blank();
        self.line(depth, "/* Get output buffers */");
        self.print_step(depth, in_loop, "Getting output buffers...");
        for buffer in downloads {
            self.line(
                depth,
                format!(
                    "fRet = clEnqueueReadBuffer(queue{}, {}, CL_TRUE, 0, {}, {}, 0, NULL, NULL);",
                    buffer.queue,
                    buffer.handle,
                    buffer.size_expr(),
                    buffer.host_ptr()
                ),
            );
            self.check_call(depth, &format!("clEnqueueReadBuffer ({})", buffer.handle));
        }
        self.line(depth, "PRINT_SUCCESS();");
    }

    /// Release the tier completion events of this pass.
    fn emit_event_release(&mut self, depth: usize) {
        let plan = self.plan;
        let schedule = &plan.schedule;
        if schedule.sync_points() == 0 {
            return;
        }
        self.blank();
        self.line(depth, "/* Release synchronization events */");
        for tier in 0..schedule.sync_points() {
            self.emit_release_list(depth, tier);
        }
    }

    /// Release one completion list, resetting each slot to `NULL`.
    pub(super) fn emit_release_list(&mut self, depth: usize, tier: usize) {
        let plan = self.plan;
        let name = Schedule::list_name(tier);
        let len = plan.schedule.list_len(tier);
        self.line(depth, format!("for(i = 0; i < {}; i++) {{", len));
        self.line(depth + 1, format!("if({}[i]) {{", name));
        self.line(depth + 2, format!("clReleaseEvent({}[i]);", name));
        self.line(depth + 2, format!("{}[i] = NULL;", name));
        self.line(depth + 1, "}");
        self.line(depth, "}");
    }
}
