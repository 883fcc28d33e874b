//! C host program emitter.
//!
//! Renders a [`Plan`] into a single C translation unit. Sections are
//! emitted in a fixed order, each by its own submodule:
//!
//! 1. prelude: header, includes, macros, declarations, preamble hook
//! 2. setup: discovery, context, queues, program, kernels, buffers, arguments
//! 3. run: uploads, launches, readback (once or in a hook-driven loop)
//! 4. check: postamble hook, profiling report, output validation
//! 5. cleanup: reverse-order release at the shared `_err` label
//!
//! The emitter holds no decisions of its own; everything it writes is
//! read off the manifest and the plan.

mod check;
mod cleanup;
mod prelude;
mod run;
mod setup;


use log::debug;

use crate::config::Hook;
use crate::manifest::Manifest;
use crate::plan::Plan;

/// Line-oriented C writer.
pub struct HostEmitter<'a> {
    manifest: &'a Manifest,
    plan: &'a Plan,
    output: Vec<String>,
}

impl<'a> HostEmitter<'a> {
    pub fn new(manifest: &'a Manifest, plan: &'a Plan) -> Self {
        Self {
            manifest,
            plan,
            output: Vec::new(),
        }
    }

    /// Emit the complete program.
    pub fn emit_program(mut self) -> String {
        debug!("emitting prelude");
        self.emit_header();
        self.emit_declarations();
        self.emit_host_variables();
        self.emit_preamble();

        debug!("emitting setup");
        self.emit_discovery();
        self.emit_queues();
        self.emit_program_load();
        self.emit_kernels();
        self.emit_buffers();
        self.emit_arguments();

        debug!("emitting run ({:?} template)", self.manifest.config.template());
        self.emit_run();

        debug!("emitting checks");
        self.emit_postamble();
        self.emit_profiling_report();
        self.emit_validation();

        debug!("emitting cleanup");
        self.emit_cleanup();

        let mut text = self.output.join("\n");
        text.push('\n');
        text
    }

    /// One line at `depth` tabs.
    fn line(&mut self, depth: usize, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.output.push(String::new());
        } else {
            self.output.push(format!("{}{}", "\t".repeat(depth), text));
        }
    }

    fn blank(&mut self) {
        self.output.push(String::new());
    }

    /// `fRet` check after an API call.
    fn check_call(&mut self, depth: usize, what: &str) {
        self.line(
            depth,
            format!(
                "ASSERT_CALL(CL_SUCCESS == fRet, FUNCTION_ERROR_STATEMENTS(\"{}\"));",
                what
            ),
        );
    }

    /// Hook invocation when the hook is enabled. Per-iteration hooks
    /// prefix their step with the iteration number.
    fn emit_hook(&mut self, depth: usize, hook: Hook) {
        if !self.manifest.config.hooks.enabled(hook) {
            return;
        }
        let in_loop = hook.takes_loop_flag();
        let args = self.plan.signature.call_arguments(in_loop);
        let what = match hook {
            Hook::Preamble => "preamble",
            Hook::Postamble => "postamble",
            Hook::LoopPreamble => "loop preamble",
            Hook::LoopPostamble => "loop postamble",
            Hook::Cleanup => "cleanup",
        };
        self.blank();
        self.line(depth, format!("/* Calling {} function */", what));
        self.print_step(depth, in_loop, &format!("Calling {} function...", what));
        self.line(depth, format!("{}({});", hook.macro_name(), args));
        self.line(depth, "PRINT_SUCCESS();");
    }

    /// `PRINT_STEP`, prefixed with the iteration number inside the loop.
    fn print_step(&mut self, depth: usize, in_loop: bool, message: &str) {
        if in_loop {
            self.line(
                depth,
                format!("PRINT_STEP(\"[%u] {}\", iterations);", message),
            );
        } else {
            self.line(depth, format!("PRINT_STEP(\"{}\");", message));
        }
    }
}

/// Render a manifest into C source.
pub fn emit(manifest: &Manifest, plan: &Plan) -> String {
    HostEmitter::new(manifest, plan).emit_program()
}

/// Quote `text` as a C string literal.
fn c_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
