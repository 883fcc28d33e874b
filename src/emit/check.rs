//! Postamble, profiling report and output validation.

use super::HostEmitter;
use crate::config::Hook;
use crate::plan::ValidationExpr;

impl HostEmitter<'_> {
    pub(super) fn emit_postamble(&mut self) {
        self.emit_hook(1, Hook::Postamble);
    }

    pub(super) fn emit_profiling_report(&mut self) {
        if !self.manifest.config.profiling() {
            return;
        }
        self.blank();
        self.line(1, "/* Print profiling results */");
        self.line(
            1,
            "printf(\"Elapsed time spent on kernels: %ld us; Average time per iteration: %lf us.\\n\", execTime, execTime / (double) iterations);",
        );
    }

    /// Compare every validated output against its reference copy.
    pub(super) fn emit_validation(&mut self) {
        let plan = self.plan;
        if plan.validations.is_empty() {
            return;
        }
        self.blank();
        self.line(1, "/* Validate received data */");
        self.line(1, "PRINT_STEP(\"Validating received data...\");");
        for check in &plan.validations {
            self.emit_check(check);
        }
        self.line(1, "if(!invalidDataFound) {");
        self.line(2, "PRINT_SUCCESS();");
        self.line(1, "} else {");
        self.line(2, "rv = EXIT_FAILURE;");
        self.line(1, "}");
    }

    fn emit_check(&mut self, check: &ValidationExpr) {
        let loops = check.loops();
        let mut depth = 1;
        for (index, bound) in &loops {
            self.line(
                depth,
                format!("for({0} = 0; {0} < {1}; {0}++) {{", index, bound),
            );
            depth += 1;
        }

        let mut args: Vec<String> = check.location_args().into_iter().map(String::from).collect();
        args.push(check.expected());
        args.push(check.actual());

        self.line(depth, format!("if({}) {{", check.test()));
        self.line(depth + 1, "if(!invalidDataFound) {");
        self.line(depth + 2, "PRINT_FAIL();");
        self.line(depth + 2, "invalidDataFound = true;");
        self.line(depth + 1, "}");
        self.line(
            depth + 1,
            format!(
                "printf(\"Variable {}: expected %{} got %{}{}.\\n\", {});",
                check.location(),
                check.format,
                check.format,
                check.comparison.note(),
                args.join(", ")
            ),
        );
        self.line(depth, "}");

        for _ in &loops {
            depth -= 1;
            self.line(depth, "}");
        }
    }
}
