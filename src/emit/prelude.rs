//! File header, declarations and host variables.

use super::{c_string, HostEmitter};
use crate::config::{Hook, Template};
use crate::manifest::{Role, VariableSpec};
use crate::plan::{Init, Schedule, VarId, VariableClass};

const INCLUDES: &[&str] = &[
    "CL/opencl.h",
    "errno.h",
    "stdbool.h",
    "stdio.h",
    "stdlib.h",
    "string.h",
    "sys/time.h",
];

const MACROS: &str = r#"/**
 * @brief Test if two operands are outside an epsilon range.
 *
 * @param a First operand.
 * @param b Second operand.
 * @param e Epsilon value.
 */
#define TEST_EPSILON(a, b, e) (((a > b) && (a - b > e)) || ((b >= a) && (b - a > e)))

/**
 * @brief Statements executed when an OpenCL call fails.
 *
 * @param funcName Name of the failed call.
 */
#define FUNCTION_ERROR_STATEMENTS(funcName) {\
	rv = EXIT_FAILURE;\
	PRINT_FAIL();\
	fprintf(stderr, "Error: %s failed with return code %d.\n", funcName, fRet);\
}

/**
 * @brief Statements executed when a libc call fails.
 *
 * @param arg Name of the failed object.
 */
#define POSIX_ERROR_STATEMENTS(arg) {\
	rv = EXIT_FAILURE;\
	PRINT_FAIL();\
	fprintf(stderr, "Error: %s: %s.\n", arg, strerror(errno));\
}

/**
 * @brief Statements executed when a platform or device index is out of range.
 *
 * @param what Kind of the missing object.
 * @param index Requested index.
 * @param count Number of objects available.
 */
#define LOOKUP_ERROR_STATEMENTS(what, index, count) {\
	rv = EXIT_FAILURE;\
	PRINT_FAIL();\
	fprintf(stderr, "Error: %s %u not found (%u available).\n", what, index, count);\
}"#;

impl HostEmitter<'_> {
    pub(super) fn emit_header(&mut self) {
        let manifest = self.manifest;
        let config = &manifest.config;
        self.line(0, "/*");
        self.line(0, " * OpenCL host program generated by hostgen.");
        self.line(0, " * Regenerate it from the kernel manifest instead of editing it.");
        self.line(0, " */");
        self.blank();
        self.line(
            0,
            format!("#define CL_TARGET_OPENCL_VERSION {}", config.api.target_define()),
        );
        self.blank();
        for header in INCLUDES {
            self.line(0, format!("#include <{}>", header));
        }
        self.blank();
        self.line(0, "#include \"common.h\"");

        if config.hooks.any() {
            self.blank();
            self.emit_hook_docs();
            let include = format!("#include {}", c_string(&config.hook_header));
            self.line(0, include);
        }

        self.blank();
        for line in MACROS.lines() {
            self.line(0, line);
        }
    }

    /// Documentation block listing each enabled hook and its parameters.
    fn emit_hook_docs(&mut self) {
        let plan = self.plan;
        let hooks = self.manifest.config.hooks.active();
        let signature = &plan.signature;
        let mut lines = vec![
            "/**".to_string(),
            " * @brief Header where the hook macro functions are located.".to_string(),
            " *        Function headers:".to_string(),
        ];
        for hook in &hooks {
            lines.push(format!(
                " *            {}({});",
                hook.macro_name(),
                signature.formal_names(hook.takes_loop_flag())
            ));
        }
        let rows = signature.formal_docs();
        let loop_flag = hooks.iter().any(|h| h.takes_loop_flag());
        if !rows.is_empty() || loop_flag {
            lines.push(" *        where:".to_string());
            for (name, description) in rows {
                lines.push(format!(" *            {}: {};", name, description));
            }
            if loop_flag {
                lines.push(" *            loopFlag: loop condition variable (bool).".to_string());
            }
        }
        lines.push(" */".to_string());
        for line in lines {
            self.line(0, line);
        }
    }

    /// Opening of `main` and every fixed-name local.
    pub(super) fn emit_declarations(&mut self) {
        let plan = self.plan;
        let manifest = self.manifest;
        let config = &manifest.config;

        self.blank();
        self.line(0, "int main(void) {");
        self.line(1, "/* Return variable */");
        self.line(1, "int rv = EXIT_SUCCESS;");
        self.blank();
        self.line(1, "/* OpenCL and aux variables */");
        self.line(1, "int i = 0, j = 0;");
        self.line(1, "cl_int fRet;");
        self.line(1, "cl_uint platformsLen, devicesLen;");
        self.line(1, "cl_platform_id *platforms = NULL;");
        self.line(1, "cl_device_id *devices = NULL;");
        self.line(1, "cl_context context = NULL;");
        for kernel in &manifest.kernels {
            self.line(1, format!("cl_command_queue queue{} = NULL;", kernel.ident()));
        }
        self.line(1, "FILE *programFile = NULL;");
        self.line(1, "size_t programSz;");
        self.line(1, "char *programContent = NULL;");
        self.line(1, "cl_int programRet;");
        self.line(1, "cl_program program = NULL;");
        for kernel in &manifest.kernels {
            self.line(1, format!("cl_kernel kernel{} = NULL;", kernel.ident()));
        }
        if config.template() == Template::Loop {
            self.line(1, "bool loopFlag = false;");
        }
        self.line(1, "bool invalidDataFound = false;");
        self.line(1, "unsigned int iterations = 0;");
        if config.profiling() {
            self.line(1, "struct timeval then, now;");
            self.line(1, "long execTime = 0;");
        }
        let schedule = &plan.schedule;
        for tier in 0..schedule.sync_points() {
            let len = schedule.list_len(tier);
            let nulls = vec!["NULL"; len].join(", ");
            self.line(
                1,
                format!(
                    "cl_event {}[{}] = {{{}}};",
                    Schedule::list_name(tier),
                    len,
                    nulls
                ),
            );
        }

        for kernel in &manifest.kernels {
            let ident = kernel.ident();
            let range = &kernel.ndrange;
            self.line(1, format!("cl_uint workDim{} = {};", ident, range.dim));
            self.emit_size_array(&format!("globalSize{}", ident), range.dim, &range.global);
            if let Some(local) = &range.local {
                self.emit_size_array(&format!("localSize{}", ident), range.dim, local);
            }
        }
    }

    fn emit_size_array(&mut self, name: &str, dim: u32, sizes: &str) {
        self.line(1, format!("size_t {}[{}] = {{", name, dim));
        self.line(2, sizes);
        self.line(1, "};");
    }

    /// Host values, reference copies, tolerances and device handles.
    pub(super) fn emit_host_variables(&mut self) {
        let manifest = self.manifest;
        let plan = self.plan;

        self.blank();
        self.line(1, "/* Input/output variables */");
        let mut heap = Vec::new();
        let mut generated = Vec::new();
        for (k, kernel) in manifest.kernels.iter().enumerate() {
            for (v, var) in kernel.variables.iter().enumerate() {
                if var.role == Role::Local {
                    continue;
                }
                let id = VarId { kernel: k, index: v };
                let class = plan.class(id);

                self.declare_storage(var, class, &var.name, &class.init);
                if class.heap_value() {
                    heap.push(var.name.clone());
                }
                if let Init::Generator(function) = &class.init {
                    generated.push((function.clone(), var.name.clone(), class.storage.count()));
                }

                if let Some(reference) = &class.reference {
                    let name = format!("{}C", var.name);
                    self.declare_storage(var, class, &name, reference);
                    if class.heap_reference() {
                        heap.push(name.clone());
                    }
                    if let Init::Generator(function) = reference {
                        generated.push((function.clone(), name, class.storage.count()));
                    }
                    if let Some(eps) = &var.epsilon {
                        self.line(1, format!("double {}Epsilon = {};", var.name, eps.text));
                    }
                }

                if let Some(buffer) = plan.buffer(id) {
                    self.line(1, format!("cl_mem {} = NULL;", buffer.handle));
                }
            }
        }

        if !heap.is_empty() {
            self.blank();
            self.line(1, "/* Check host allocations */");
            self.line(1, "PRINT_STEP(\"Allocating host variables...\");");
            for name in &heap {
                self.line(
                    1,
                    format!("ASSERT_CALL({}, POSIX_ERROR_STATEMENTS(\"{}\"));", name, name),
                );
            }
            self.line(1, "PRINT_SUCCESS();");
        }

        if !generated.is_empty() {
            self.blank();
            self.line(1, "/* Generate variable contents */");
            self.line(1, "PRINT_STEP(\"Generating variable contents...\");");
            for (function, name, count) in generated {
                if count > 1 {
                    self.line(1, format!("{}({}, {});", function, name, count));
                } else {
                    self.line(1, format!("{}(&{}, 1);", function, name));
                }
            }
            self.line(1, "PRINT_SUCCESS();");
        }
    }

    /// Declare one host storage (value or reference copy) named `name`.
    fn declare_storage(&mut self, var: &VariableSpec, class: &VariableClass, name: &str, init: &Init) {
        let ty = &var.ty;
        let count = class.storage.count();
        let braced = class.storage.is_array() || class.vector.is_some();
        match init {
            Init::Literal(text) if braced => {
                let dims = if class.storage.is_array() {
                    format!("[{}]", count)
                } else {
                    String::new()
                };
                self.line(1, format!("{} {}{} = {{", ty, name, dims));
                self.line(2, text);
                self.line(1, "};");
            }
            Init::Literal(text) => self.line(1, format!("{} {} = {};", ty, name, text)),
            _ if class.storage.is_array() => self.line(
                1,
                format!("{} *{} = malloc({} * sizeof({}));", ty, name, count, ty),
            ),
            _ => self.line(1, format!("{} {};", ty, name)),
        }
    }

    pub(super) fn emit_preamble(&mut self) {
        self.emit_hook(1, Hook::Preamble);
    }
}
