//! Generator configuration resolved from the manifest root element.
//!
//! Every string-valued flag is validated once, here, and turned into a
//! typed value. Emission code never looks at raw attribute text.

use crate::diagnostic::Diagnostic;
use crate::span::Span;


/// A yes/no manifest flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Toggle {
    #[default]
    Off,
    On,
}

impl Toggle {
    /// Accepts `yes`/`true` and `no`/`false` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" => Some(Toggle::On),
            "no" | "false" => Some(Toggle::Off),
            _ => None,
        }
    }

    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

/// Externally supplied functions the generated program calls at fixed points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hook {
    Preamble,
    Postamble,
    LoopPreamble,
    LoopPostamble,
    Cleanup,
}

impl Hook {
    pub const ALL: [Hook; 5] = [
        Hook::Preamble,
        Hook::Postamble,
        Hook::LoopPreamble,
        Hook::LoopPostamble,
        Hook::Cleanup,
    ];

    /// Root attribute that enables the hook.
    pub fn attribute(self) -> &'static str {
        match self {
            Hook::Preamble => "preamble",
            Hook::Postamble => "postamble",
            Hook::LoopPreamble => "looppreamble",
            Hook::LoopPostamble => "looppostamble",
            Hook::Cleanup => "cleanup",
        }
    }

    /// Macro name the hook header must define.
    pub fn macro_name(self) -> &'static str {
        match self {
            Hook::Preamble => "PREAMBLE",
            Hook::Postamble => "POSTAMBLE",
            Hook::LoopPreamble => "LOOPPREAMBLE",
            Hook::LoopPostamble => "LOOPPOSTAMBLE",
            Hook::Cleanup => "CLEANUP",
        }
    }

    /// Per-iteration hooks also receive the `loopFlag` loop condition.
    pub fn takes_loop_flag(self) -> bool {
        matches!(self, Hook::LoopPreamble | Hook::LoopPostamble)
    }
}

/// Enabled state of each hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hooks {
    pub preamble: Toggle,
    pub postamble: Toggle,
    pub loop_preamble: Toggle,
    pub loop_postamble: Toggle,
    pub cleanup: Toggle,
}

impl Hooks {
    pub fn get(&self, hook: Hook) -> Toggle {
        match hook {
            Hook::Preamble => self.preamble,
            Hook::Postamble => self.postamble,
            Hook::LoopPreamble => self.loop_preamble,
            Hook::LoopPostamble => self.loop_postamble,
            Hook::Cleanup => self.cleanup,
        }
    }

    fn set(&mut self, hook: Hook, value: Toggle) {
        match hook {
            Hook::Preamble => self.preamble = value,
            Hook::Postamble => self.postamble = value,
            Hook::LoopPreamble => self.loop_preamble = value,
            Hook::LoopPostamble => self.loop_postamble = value,
            Hook::Cleanup => self.cleanup = value,
        }
    }

    pub fn enabled(&self, hook: Hook) -> bool {
        self.get(hook).is_on()
    }

    /// Hooks that are switched on, in pipeline declaration order.
    pub fn active(&self) -> Vec<Hook> {
        Hook::ALL
            .into_iter()
            .filter(|&h| self.enabled(h))
            .collect()
    }

    pub fn any(&self) -> bool {
        Hook::ALL.into_iter().any(|h| self.enabled(h))
    }
}

/// Shape of the execution section of the generated program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    /// Bind, upload, launch and read back exactly once.
    Single,
    /// `do { ... } while(loopFlag)` driven by the per-iteration hooks.
    Loop,
}

/// Where the kernel program comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgramSource {
    /// Precompiled device binary (`clCreateProgramWithBinary`).
    Binary(String),
    /// OpenCL C source file (`clCreateProgramWithSource`).
    Source(String),
}

impl ProgramSource {
    pub fn path(&self) -> &str {
        match self {
            ProgramSource::Binary(p) | ProgramSource::Source(p) => p,
        }
    }
}

/// Platform and device indices used for discovery and queue creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceSelection {
    pub platform: u32,
    pub device: u32,
}

/// Runtime API version the generated program targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RuntimeApi {
    #[default]
    OpenCl12,
    OpenCl20,
}

impl RuntimeApi {
    /// Resolve a version string (`1.2`, `2.0`).
    pub fn resolve(version: &str) -> Option<Self> {
        match version.trim() {
            "1.2" | "120" => Some(RuntimeApi::OpenCl12),
            "2.0" | "200" => Some(RuntimeApi::OpenCl20),
            _ => None,
        }
    }

    pub fn version(self) -> &'static str {
        match self {
            RuntimeApi::OpenCl12 => "1.2",
            RuntimeApi::OpenCl20 => "2.0",
        }
    }

    /// Value for `CL_TARGET_OPENCL_VERSION`.
    pub fn target_define(self) -> u32 {
        match self {
            RuntimeApi::OpenCl12 => 120,
            RuntimeApi::OpenCl20 => 200,
        }
    }

    /// Name of the queue-creation entry point.
    pub fn queue_function(self) -> &'static str {
        match self {
            RuntimeApi::OpenCl12 => "clCreateCommandQueue",
            RuntimeApi::OpenCl20 => "clCreateCommandQueueWithProperties",
        }
    }

    /// Full queue-creation call expression for `device`.
    pub fn create_queue_call(self, device: &str) -> String {
        match self {
            RuntimeApi::OpenCl12 => format!(
                "clCreateCommandQueue(context, {}, 0, &fRet)",
                device
            ),
            RuntimeApi::OpenCl20 => format!(
                "clCreateCommandQueueWithProperties(context, {}, NULL, &fRet)",
                device
            ),
        }
    }
}

/// Global generator configuration, one value per manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenConfig {
    pub program: ProgramSource,
    pub profiling: Toggle,
    pub hooks: Hooks,
    /// Multiplier applied to every variable's element count.
    pub repeat: u64,
    pub device: DeviceSelection,
    pub api: RuntimeApi,
    /// Header providing the hook macros.
    pub hook_header: String,
}

/// Default hook header name.
pub const DEFAULT_HOOK_HEADER: &str = "prepostambles.h";

impl GenConfig {
    /// Built-in configuration for a program binary, everything else off.
    pub fn with_program(program: ProgramSource) -> Self {
        Self {
            program,
            profiling: Toggle::Off,
            hooks: Hooks::default(),
            repeat: 1,
            device: DeviceSelection::default(),
            api: RuntimeApi::default(),
            hook_header: DEFAULT_HOOK_HEADER.to_string(),
        }
    }

    /// Resolve the configuration from root-element attributes.
    ///
    /// `attr` looks up an attribute by name; `span` locates the root element
    /// for diagnostics. All problems are reported together.
    pub fn from_attributes<'a>(
        attr: impl Fn(&str) -> Option<&'a str>,
        span: Span,
    ) -> Result<Self, Vec<Diagnostic>> {
        let mut errors = Vec::new();
        let err = |msg: String| Diagnostic::error(msg, span);

        let program = match (attr("program"), attr("source")) {
            (Some(binary), _) => Some(ProgramSource::Binary(binary.to_string())),
            (None, Some(source)) => Some(ProgramSource::Source(source.to_string())),
            (None, None) => {
                errors.push(
                    err("manifest root declares no kernel program".to_string()).with_help(
                        "set program=\"<binary>\" or source=\"<file.cl>\" on the root element"
                            .to_string(),
                    ),
                );
                None
            }
        };

        let mut toggle = |name: &str| -> Toggle {
            match attr(name) {
                None => Toggle::Off,
                Some(value) => Toggle::parse(value).unwrap_or_else(|| {
                    errors.push(
                        err(format!("invalid value '{}' for '{}'", value, name))
                            .with_help("expected 'yes', 'true', 'no' or 'false'".to_string()),
                    );
                    Toggle::Off
                }),
            }
        };

        let profiling = toggle("profile");
        let mut hooks = Hooks::default();
        for hook in Hook::ALL {
            hooks.set(hook, toggle(hook.attribute()));
        }

        let repeat = match attr("repeat") {
            None => 1,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    errors.push(err(format!(
                        "invalid repeat factor '{}' (expected an integer >= 1)",
                        value
                    )));
                    1
                }
            },
        };

        let api = match attr("api") {
            None => RuntimeApi::default(),
            Some(value) => RuntimeApi::resolve(value).unwrap_or_else(|| {
                errors.push(
                    err(format!("unknown runtime API version '{}'", value))
                        .with_help("available versions: 1.2, 2.0".to_string()),
                );
                RuntimeApi::default()
            }),
        };

        let hook_header = attr("hookheader")
            .map(|h| h.to_string())
            .unwrap_or_else(|| DEFAULT_HOOK_HEADER.to_string());

        match program {
            Some(program) if errors.is_empty() => Ok(Self {
                program,
                profiling,
                hooks,
                repeat,
                device: DeviceSelection::default(),
                api,
                hook_header,
            }),
            _ => Err(errors),
        }
    }

    /// Loop template when any per-iteration hook is on.
    pub fn template(&self) -> Template {
        if self.hooks.enabled(Hook::LoopPreamble) || self.hooks.enabled(Hook::LoopPostamble) {
            Template::Loop
        } else {
            Template::Single
        }
    }

    pub fn profiling(&self) -> bool {
        self.profiling.is_on()
    }
}
