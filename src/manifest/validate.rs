use std::collections::{HashMap, HashSet};

use super::{Manifest, Role};
use crate::ctype;
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Identifiers the generated program declares itself.
const RESERVED: &[&str] = &[
    "main",
    "rv",
    "i",
    "j",
    "fRet",
    "platforms",
    "platformsLen",
    "devices",
    "devicesLen",
    "context",
    "programFile",
    "programSz",
    "programContent",
    "programRet",
    "program",
    "loopFlag",
    "invalidDataFound",
    "iterations",
    "then",
    "now",
    "execTime",
    "errno",
    "stderr",
    "malloc",
    "free",
    "printf",
    "fprintf",
    "fopen",
    "fseek",
    "ftell",
    "fread",
    "fclose",
    "strerror",
    "gettimeofday",
    "timeval",
    "NULL",
    "EXIT_SUCCESS",
    "EXIT_FAILURE",
    "TEST_EPSILON",
    "FUNCTION_ERROR_STATEMENTS",
    "POSIX_ERROR_STATEMENTS",
    "LOOKUP_ERROR_STATEMENTS",
    "ASSERT_CALL",
    "PRINT_STEP",
    "PRINT_SUCCESS",
    "PRINT_FAIL",
    "PREAMBLE",
    "POSTAMBLE",
    "LOOPPREAMBLE",
    "LOOPPOSTAMBLE",
    "CLEANUP",
];

/// Record a derived identifier, reporting it when another derivation
/// already produced the same name.
fn claim(
    derived: &mut HashMap<String, String>,
    name: String,
    what: String,
    span: Span,
    errors: &mut Vec<Diagnostic>,
) {
    match derived.get(&name) {
        Some(first) => errors.push(
            Diagnostic::error(format!("generated name '{}' is ambiguous", name), span)
                .with_note(format!("it is {} and {}", first, what))
                .with_help("rename the kernel or the variable".to_string()),
        ),
        None => {
            derived.insert(name, what);
        }
    }
}

/// Identifiers the program derives from manifest names, mapped to what
/// they hold.
fn derived_names(manifest: &Manifest, errors: &mut Vec<Diagnostic>) -> HashMap<String, String> {
    let mut derived = HashMap::new();
    // duplicates are reported on their own
    let mut seen = HashSet::new();
    for kernel in &manifest.kernels {
        let ident = kernel.ident();
        if !seen.insert(ident.clone()) {
            continue;
        }
        let mut prefixes = vec![
            ("queue", "command queue"),
            ("kernel", "kernel object"),
            ("workDim", "work dimension"),
            ("globalSize", "global size"),
        ];
        if kernel.ndrange.local.is_some() {
            prefixes.push(("localSize", "local size"));
        }
        for (prefix, what) in prefixes {
            claim(
                &mut derived,
                format!("{}{}", prefix, ident),
                format!("the {} of kernel '{}'", what, kernel.name),
                kernel.span,
                errors,
            );
        }
    }
    let mut seen = HashSet::new();
    for (_, var) in manifest.host_variables() {
        if !seen.insert(var.name.as_str()) {
            continue;
        }
        let mut suffixes = Vec::new();
        let count = var.nmemb.saturating_mul(manifest.config.repeat);
        if var.role == Role::Output || count > 1 {
            suffixes.push(("K", "buffer"));
        }
        if var.role == Role::Output && !var.novalidation {
            suffixes.push(("C", "reference copy"));
            if var.epsilon.is_some() {
                suffixes.push(("Epsilon", "tolerance"));
            }
        }
        for (suffix, what) in suffixes {
            claim(
                &mut derived,
                format!("{}{}", var.name, suffix),
                format!("the {} of '{}'", what, var.name),
                var.span,
                errors,
            );
        }
    }
    derived
}

/// `tier<N>Done` completion lists.
fn is_tier_list(name: &str) -> bool {
    name.strip_prefix("tier")
        .and_then(|rest| rest.strip_suffix("Done"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Why `name` cannot name a host variable or generator, if it cannot.
fn clash(name: &str, derived: &HashMap<String, String>) -> Option<String> {
    if ctype::is_keyword(name) {
        Some(format!("'{}' is a C keyword or type name", name))
    } else if name.starts_with("cl_") || name.starts_with("CL_") {
        Some(format!("'{}' uses the OpenCL 'cl_'/'CL_' prefix", name))
    } else if RESERVED.contains(&name) || is_tier_list(name) {
        Some(format!("'{}' is reserved by the host program", name))
    } else {
        derived
            .get(name)
            .map(|what| format!("'{}' clashes with {}", name, what))
    }
}

/// Cross-element checks that a single element cannot see on its own.
pub(super) fn check(manifest: &Manifest) -> Result<(), Vec<Diagnostic>> {
    let mut errors = Vec::new();

    let mut kernel_idents: HashMap<String, &str> = HashMap::new();
    for kernel in &manifest.kernels {
        if let Some(first) = kernel_idents.insert(kernel.ident(), &kernel.name) {
            errors.push(
                Diagnostic::error(format!("duplicate kernel '{}'", kernel.name), kernel.span)
                    .with_note(format!("clashes with kernel '{}'", first)),
            );
        }

        let mut args: HashMap<u32, &str> = HashMap::new();
        for var in &kernel.variables {
            if let Some(first) = args.insert(var.arg, &var.name) {
                errors.push(
                    Diagnostic::error(
                        format!(
                            "argument {} of kernel '{}' is bound twice",
                            var.arg, kernel.name
                        ),
                        var.span,
                    )
                    .with_note(format!("already bound to '{}'", first)),
                );
            }
        }
    }

    let derived = derived_names(manifest, &mut errors);
    let mut names: HashMap<&str, &str> = HashMap::new();
    for (k, var) in manifest.host_variables() {
        let kernel = &manifest.kernels[k].name;
        if let Some(reason) = clash(&var.name, &derived) {
            errors.push(
                Diagnostic::error(format!("variable name {}", reason), var.span)
                    .with_help("rename the variable".to_string()),
            );
        }
        if let Some(first) = names.insert(&var.name, kernel) {
            errors.push(
                Diagnostic::error(format!("duplicate variable '{}'", var.name), var.span)
                    .with_note(format!("first declared in kernel '{}'", first)),
            );
        }
    }

    for (_, var) in manifest.host_variables() {
        let Some(generator) = &var.generator else {
            continue;
        };
        let reason = match clash(generator, &derived) {
            Some(reason) => Some(reason),
            None if names.contains_key(generator.as_str()) => {
                Some(format!("'{}' is also a variable", generator))
            }
            None => None,
        };
        if let Some(reason) = reason {
            errors.push(
                Diagnostic::error(format!("generator name {}", reason), var.span)
                    .with_help("rename the generator function".to_string()),
            );
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
