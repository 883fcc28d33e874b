//! OpenCL host program generator.
//!
//! Reads an XML kernel manifest and writes a self-contained C program that
//! discovers a device, loads the kernel program, moves data, launches the
//! kernels in dependency tiers, validates outputs and releases everything
//! on a single exit path.
//!
//! The pipeline is manifest → plan → emit; each stage is pure and the only
//! I/O happens in [`generate_file`].

pub mod config;
pub mod ctype;
pub mod diagnostic;
pub mod emit;
pub mod manifest;
pub mod plan;
pub mod span;

use std::fs;
use std::path::Path;

use log::{debug, info};

use diagnostic::{render_diagnostics, Diagnostic};
use manifest::{parse_manifest, Manifest};
use plan::Plan;
use span::Span;

/// Generated program text plus the warnings collected on the way.
#[derive(Clone, Debug)]
pub struct Generated {
    pub program: String,
    pub warnings: Vec<Diagnostic>,
}

/// Generate a host program from manifest text without rendering anything.
pub fn generate_silent(source: &str) -> Result<Generated, Vec<Diagnostic>> {
    let manifest = parse_manifest(source)?;
    debug!(
        "manifest: {} kernel(s), {} variable(s)",
        manifest.kernels.len(),
        manifest.variables().count()
    );
    let plan = Plan::build(&manifest)?;
    let program = emit::emit(&manifest, &plan);
    let Manifest { warnings, .. } = manifest;
    Ok(Generated { program, warnings })
}

/// Generate a host program, rendering warnings and errors to stderr.
pub fn generate(source: &str, filename: &str) -> Result<String, Vec<Diagnostic>> {
    match generate_silent(source) {
        Ok(generated) => {
            render_diagnostics(&generated.warnings, filename, source);
            Ok(generated.program)
        }
        Err(errors) => {
            render_diagnostics(&errors, filename, source);
            Err(errors)
        }
    }
}

/// Read `manifest_path`, generate, and write the program to `output_path`.
///
/// Nothing is written unless generation succeeds.
pub fn generate_file(manifest_path: &Path, output_path: &Path) -> Result<(), Vec<Diagnostic>> {
    let filename = manifest_path.display().to_string();
    let source = fs::read_to_string(manifest_path).map_err(|e| {
        let diag = Diagnostic::error(format!("cannot read '{}': {}", filename, e), Span::dummy());
        render_diagnostics(std::slice::from_ref(&diag), &filename, "");
        vec![diag]
    })?;
    let program = generate(&source, &filename)?;

    fs::write(output_path, &program).map_err(|e| {
        let diag = Diagnostic::error(
            format!("cannot write '{}': {}", output_path.display(), e),
            Span::dummy(),
        );
        render_diagnostics(std::slice::from_ref(&diag), &filename, &source);
        vec![diag]
    })?;
    info!(
        "wrote {} ({} lines)",
        output_path.display(),
        program.lines().count()
    );
    Ok(())
}
