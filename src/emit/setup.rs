//! Runtime setup: discovery, context, queues, program, kernels, buffers
//! and argument bindings.

use super::{c_string, HostEmitter};
use crate::config::ProgramSource;
use crate::plan::Binding;

impl HostEmitter<'_> {
    /// Platform and device discovery, then the context.
    pub(super) fn emit_discovery(&mut self) {
        let device = self.manifest.config.device;
        let (p, d) = (device.platform, device.device);

        self.blank();
        self.line(1, "/* Get platforms IDs */");
        self.line(1, "PRINT_STEP(\"Getting platforms IDs...\");");
        self.line(1, "fRet = clGetPlatformIDs(0, NULL, &platformsLen);");
        self.check_call(1, "clGetPlatformIDs");
        self.line(1, "platforms = malloc(platformsLen * sizeof(cl_platform_id));");
        self.line(1, "ASSERT_CALL(platforms, POSIX_ERROR_STATEMENTS(\"platforms\"));");
        self.line(1, "fRet = clGetPlatformIDs(platformsLen, platforms, NULL);");
        self.check_call(1, "clGetPlatformIDs");
        self.line(
            1,
            format!(
                "ASSERT_CALL({} < platformsLen, LOOKUP_ERROR_STATEMENTS(\"platform\", {}u, platformsLen));",
                p, p
            ),
        );
        self.line(1, "PRINT_SUCCESS();");

        self.blank();
        self.line(1, format!("/* Get devices IDs for platform {} */", p));
        self.line(
            1,
            format!("PRINT_STEP(\"Getting devices IDs for platform {}...\");", p),
        );
        self.line(
            1,
            format!(
                "fRet = clGetDeviceIDs(platforms[{}], CL_DEVICE_TYPE_ALL, 0, NULL, &devicesLen);",
                p
            ),
        );
        self.check_call(1, "clGetDeviceIDs");
        self.line(1, "devices = malloc(devicesLen * sizeof(cl_device_id));");
        self.line(1, "ASSERT_CALL(devices, POSIX_ERROR_STATEMENTS(\"devices\"));");
        self.line(
            1,
            format!(
                "fRet = clGetDeviceIDs(platforms[{}], CL_DEVICE_TYPE_ALL, devicesLen, devices, NULL);",
                p
            ),
        );
        self.check_call(1, "clGetDeviceIDs");
        self.line(
            1,
            format!(
                "ASSERT_CALL({} < devicesLen, LOOKUP_ERROR_STATEMENTS(\"device\", {}u, devicesLen));",
                d, d
            ),
        );
        self.line(1, "PRINT_SUCCESS();");

        self.blank();
        self.line(1, "/* Create context */");
        self.line(1, "PRINT_STEP(\"Creating context...\");");
        self.line(
            1,
            format!(
                "context = clCreateContext(NULL, 1, &devices[{}], NULL, NULL, &fRet);",
                d
            ),
        );
        self.check_call(1, "clCreateContext");
        self.line(1, "PRINT_SUCCESS();");
    }

    /// One command queue per kernel.
    pub(super) fn emit_queues(&mut self) {
        let manifest = self.manifest;
        let api = self.manifest.config.api;
        let device = format!("devices[{}]", self.manifest.config.device.device);
        for kernel in &manifest.kernels {
            let ident = kernel.ident();
            self.blank();
            self.line(1, format!("/* Create command queue for {} kernel */", kernel.name));
            self.line(
                1,
                format!("PRINT_STEP(\"Creating command queue for \\\"{}\\\"...\");", kernel.name),
            );
            self.line(1, format!("queue{} = {};", ident, api.create_queue_call(&device)));
            self.check_call(1, api.queue_function());
            self.line(1, "PRINT_SUCCESS();");
        }
    }

    /// Read the program file, create the program and build it.
    pub(super) fn emit_program_load(&mut self) {
        let manifest = self.manifest;
        let program = &manifest.config.program;
        let d = self.manifest.config.device.device;
        let path = c_string(program.path());
        let (kind, mode) = match program {
            ProgramSource::Binary(_) => ("binary", "rb"),
            ProgramSource::Source(_) => ("source", "r"),
        };

        self.blank();
        self.line(1, "/* Open program file */");
        self.line(1, format!("PRINT_STEP(\"Opening program {}...\");", kind));
        self.line(1, format!("programFile = fopen({}, \"{}\");", path, mode));
        self.line(1, format!("ASSERT_CALL(programFile, POSIX_ERROR_STATEMENTS({}));", path));
        self.line(1, "PRINT_SUCCESS();");

        self.blank();
        self.line(1, "/* Get size and read file */");
        self.line(1, format!("PRINT_STEP(\"Reading program {}...\");", kind));
        self.line(1, "fseek(programFile, 0, SEEK_END);");
        self.line(1, "programSz = ftell(programFile);");
        self.line(1, "fseek(programFile, 0, SEEK_SET);");
        self.line(1, "programContent = malloc(programSz + 1);");
        self.line(1, format!("ASSERT_CALL(programContent, POSIX_ERROR_STATEMENTS({}));", path));
        self.line(
            1,
            format!(
                "ASSERT_CALL(1 == fread(programContent, programSz, 1, programFile), POSIX_ERROR_STATEMENTS({}));",
                path
            ),
        );
        self.line(1, "programContent[programSz] = '\\0';");
        self.line(1, "fclose(programFile);");
        self.line(1, "programFile = NULL;");
        self.line(1, "PRINT_SUCCESS();");

        self.blank();
        self.line(1, "/* Create program */");
        self.line(1, format!("PRINT_STEP(\"Creating program from {}...\");", kind));
        match program {
            ProgramSource::Binary(_) => {
                self.line(
                    1,
                    format!(
                        "program = clCreateProgramWithBinary(context, 1, &devices[{}], &programSz, (const unsigned char **) &programContent, &programRet, &fRet);",
                        d
                    ),
                );
                self.check_call(1, "clCreateProgramWithBinary");
            }
            ProgramSource::Source(_) => {
                self.line(
                    1,
                    "program = clCreateProgramWithSource(context, 1, (const char **) &programContent, &programSz, &fRet);",
                );
                self.check_call(1, "clCreateProgramWithSource");
            }
        }
        self.line(1, "PRINT_SUCCESS();");

        self.blank();
        self.line(1, "/* Build program */");
        self.line(1, "PRINT_STEP(\"Building program...\");");
        self.line(
            1,
            format!(
                "fRet = clBuildProgram(program, 1, &devices[{}], NULL, NULL, NULL);",
                d
            ),
        );
        self.check_call(1, "clBuildProgram");
        self.line(1, "PRINT_SUCCESS();");
    }

    pub(super) fn emit_kernels(&mut self) {
        let manifest = self.manifest;
        for kernel in &manifest.kernels {
            self.blank();
            self.line(1, format!("/* Create {} kernel */", kernel.name));
            self.line(
                1,
                format!("PRINT_STEP(\"Creating kernel \\\"{}\\\" from program...\");", kernel.name),
            );
            self.line(
                1,
                format!(
                    "kernel{} = clCreateKernel(program, \"{}\", &fRet);",
                    kernel.ident(),
                    kernel.name
                ),
            );
            self.check_call(1, "clCreateKernel");
            self.line(1, "PRINT_SUCCESS();");
        }
    }

    /// Every planned buffer, in plan order.
    pub(super) fn emit_buffers(&mut self) {
        let plan = self.plan;
        let buffers = &plan.buffers;
        if buffers.is_empty() {
            return;
        }
        self.blank();
        self.line(1, "/* Create input and output buffers */");
        self.line(1, "PRINT_STEP(\"Creating buffers...\");");
        for buffer in buffers {
            let host = if buffer.flags.copies_host() {
                buffer.host_ptr()
            } else {
                "NULL".to_string()
            };
            self.line(
                1,
                format!(
                    "{} = clCreateBuffer(context, {}, {}, {}, &fRet);",
                    buffer.handle,
                    buffer.flags.as_c(),
                    buffer.size_expr(),
                    host
                ),
            );
            self.check_call(1, &format!("clCreateBuffer ({})", buffer.handle));
        }
        self.line(1, "PRINT_SUCCESS();");
    }

    /// Bind every kernel argument once, after all buffers exist.
    pub(super) fn emit_arguments(&mut self) {
        let manifest = self.manifest;
        let plan = self.plan;
        for (k, kernel) in manifest.kernels.iter().enumerate() {
            let args = &plan.bindings[k];
            if args.is_empty() {
                continue;
            }
            let ident = kernel.ident();
            self.blank();
            self.line(1, format!("/* Set kernel arguments for {} */", kernel.name));
            self.line(
                1,
                format!("PRINT_STEP(\"Setting kernel arguments for \\\"{}\\\"...\");", kernel.name),
            );
            for arg in args {
                self.emit_set_arg(1, &ident, arg.index, &arg.binding, &arg.label);
            }
            self.line(1, "PRINT_SUCCESS();");
        }
    }

    pub(super) fn emit_set_arg(
        &mut self,
        depth: usize,
        ident: &str,
        index: u32,
        binding: &Binding,
        label: &str,
    ) {
        self.line(
            depth,
            format!(
                "fRet = clSetKernelArg(kernel{}, {}, {}, {});",
                ident,
                index,
                binding.size_expr(),
                binding.value_expr()
            ),
        );
        self.check_call(depth, &format!("clSetKernelArg ({})", label));
    }
}
