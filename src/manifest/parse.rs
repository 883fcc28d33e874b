use std::str::FromStr;

use roxmltree::{Document, Node};

use super::{validate, Epsilon, KernelSpec, Manifest, NdRange, Role, VariableSpec};
use crate::config::{DeviceSelection, GenConfig, Toggle};
use crate::ctype::is_identifier;
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// Parse and validate a manifest document.
///
/// Errors from independent elements are collected; the first pass that
/// fails stops the load.
pub fn parse_manifest(source: &str) -> Result<Manifest, Vec<Diagnostic>> {
    let doc = Document::parse(source).map_err(|e| {
        let pos = e.pos();
        vec![Diagnostic::error(
            format!("malformed manifest: {}", e),
            Span::at_position(source, pos.row, pos.col),
        )]
    })?;
    let root = doc.root_element();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let config = GenConfig::from_attributes(|name| root.attribute(name), span_of(root));
    let mut device = None;
    let mut kernels = Vec::new();

    for child in root.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "kernel" => match parse_kernel(child, &mut warnings) {
                Ok(kernel) => kernels.push(kernel),
                Err(mut errs) => errors.append(&mut errs),
            },
            "devinfo" => {
                if device.is_some() {
                    warnings.push(Diagnostic::warning(
                        "repeated <devinfo>; the last one wins".to_string(),
                        span_of(child),
                    ));
                }
                match parse_devinfo(child) {
                    Ok(d) => device = Some(d),
                    Err(e) => errors.push(e),
                }
            }
            other => warnings.push(
                Diagnostic::warning(format!("unknown element <{}>", other), span_of(child))
                    .with_note("only <kernel> and <devinfo> are read".to_string()),
            ),
        }
    }

    let mut config = match config {
        Ok(config) => config,
        Err(mut errs) => {
            errs.append(&mut errors);
            return Err(errs);
        }
    };
    if !errors.is_empty() {
        return Err(errors);
    }
    config.device = device.unwrap_or_default();

    let manifest = Manifest {
        config,
        kernels,
        warnings,
    };
    validate::check(&manifest)?;
    Ok(manifest)
}

fn span_of(node: Node) -> Span {
    Span::from_range(node.range())
}

fn missing_attr(node: Node, name: &str) -> Diagnostic {
    Diagnostic::error(
        format!(
            "<{}> is missing the '{}' attribute",
            node.tag_name().name(),
            name
        ),
        span_of(node),
    )
}

fn required_attr<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, Diagnostic> {
    node.attribute(name).ok_or_else(|| missing_attr(node, name))
}

fn parse_number<T: FromStr>(node: Node, name: &str, value: &str) -> Result<T, Diagnostic> {
    value.trim().parse().map_err(|_| {
        Diagnostic::error(
            format!(
                "invalid '{}' value '{}' on <{}>",
                name,
                value,
                node.tag_name().name()
            ),
            span_of(node),
        )
    })
}

/// Trimmed element text, `None` when absent or blank.
fn element_text(node: Node) -> Option<String> {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn parse_devinfo(node: Node) -> Result<DeviceSelection, Diagnostic> {
    let platform = match node.attribute("platform") {
        Some(v) => parse_number(node, "platform", v)?,
        None => 0,
    };
    let device = match node.attribute("device") {
        Some(v) => parse_number(node, "device", v)?,
        None => 0,
    };
    Ok(DeviceSelection { platform, device })
}

fn parse_kernel(node: Node, warnings: &mut Vec<Diagnostic>) -> Result<KernelSpec, Vec<Diagnostic>> {
    let mut errors = Vec::new();
    let span = span_of(node);

    let name = match required_attr(node, "name") {
        Ok(name) if is_identifier(name) => name.to_string(),
        Ok(name) => {
            errors.push(Diagnostic::error(
                format!("kernel name '{}' is not a valid C identifier", name),
                span,
            ));
            name.to_string()
        }
        Err(e) => {
            errors.push(e);
            String::new()
        }
    };

    let order = match node.attribute("order") {
        Some(v) => match parse_number::<i64>(node, "order", v) {
            Ok(order) => Some(order),
            Err(e) => {
                errors.push(e);
                None
            }
        },
        None => None,
    };

    let mut variables = Vec::new();
    let mut ndrange: Option<NdRange> = None;
    let mut saw_ndrange = false;
    for child in node.children().filter(|n| n.is_element()) {
        let role = match child.tag_name().name() {
            "input" => Role::Input,
            "output" => Role::Output,
            "local" => Role::Local,
            "ndrange" => {
                if saw_ndrange {
                    errors.push(Diagnostic::error(
                        format!("kernel '{}' declares more than one <ndrange>", name),
                        span_of(child),
                    ));
                    continue;
                }
                saw_ndrange = true;
                match parse_ndrange(child) {
                    Ok(range) => ndrange = Some(range),
                    Err(e) => errors.push(e),
                }
                continue;
            }
            other => {
                warnings.push(Diagnostic::warning(
                    format!("unknown element <{}> in kernel '{}'", other, name),
                    span_of(child),
                ));
                continue;
            }
        };
        match parse_variable(child, role, warnings) {
            Ok(var) => variables.push(var),
            Err(e) => errors.push(e),
        }
    }

    let Some(ndrange) = ndrange else {
        if saw_ndrange {
            return Err(errors);
        }
        errors.push(
            Diagnostic::error(format!("kernel '{}' has no <ndrange>", name), span).with_help(
                "add <ndrange dim=\"1\"><global>N</global></ndrange>".to_string(),
            ),
        );
        return Err(errors);
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(KernelSpec {
        name,
        order,
        ndrange,
        variables,
        span,
    })
}

fn parse_ndrange(node: Node) -> Result<NdRange, Diagnostic> {
    let span = span_of(node);
    let dim: u32 = match node.attribute("dim") {
        Some(v) => parse_number(node, "dim", v)?,
        None => 1,
    };
    if !(1..=3).contains(&dim) {
        return Err(Diagnostic::error(
            format!("work dimensionality must be 1, 2 or 3 (got {})", dim),
            span,
        ));
    }

    let mut global = None;
    let mut local = None;
    for child in node.children().filter(|n| n.is_element()) {
        let slot = match child.tag_name().name() {
            "global" => &mut global,
            "local" => &mut local,
            _ => continue,
        };
        let text = element_text(child).ok_or_else(|| {
            Diagnostic::error(
                format!("<{}> sizes are empty", child.tag_name().name()),
                span_of(child),
            )
        })?;
        let entries = text.split(',').filter(|s| !s.trim().is_empty()).count();
        if entries != dim as usize {
            return Err(Diagnostic::error(
                format!(
                    "<{}> lists {} size(s) but the range has {} dimension(s)",
                    child.tag_name().name(),
                    entries,
                    dim
                ),
                span_of(child),
            ));
        }
        *slot = Some(text);
    }

    let global = global.ok_or_else(|| {
        Diagnostic::error("<ndrange> has no <global> sizes".to_string(), span)
    })?;

    Ok(NdRange {
        dim,
        global,
        local,
        span,
    })
}

fn parse_variable(
    node: Node,
    role: Role,
    warnings: &mut Vec<Diagnostic>,
) -> Result<VariableSpec, Diagnostic> {
    let span = span_of(node);
    let ty = required_attr(node, "type")?.trim().to_string();
    let nmemb: u64 = parse_number(node, "nmemb", required_attr(node, "nmemb")?)?;
    let arg: u32 = parse_number(node, "arg", required_attr(node, "arg")?)?;

    if nmemb == 0 {
        return Err(Diagnostic::error(
            format!("<{}> must have nmemb >= 1", role.tag()),
            span,
        ));
    }

    let name = match (role, node.attribute("name")) {
        (_, Some(name)) => {
            if !is_identifier(name) {
                return Err(Diagnostic::error(
                    format!("variable name '{}' is not a valid C identifier", name),
                    span,
                ));
            }
            name.to_string()
        }
        (Role::Local, None) => format!("local{}", arg),
        (_, None) => return Err(missing_attr(node, "name")),
    };

    let novalidation = match node.attribute("novalidation") {
        Some(v) => Toggle::parse(v)
            .ok_or_else(|| {
                Diagnostic::error(format!("invalid value '{}' for 'novalidation'", v), span)
                    .with_help("expected 'yes', 'true', 'no' or 'false'".to_string())
            })?
            .is_on(),
        None => false,
    };

    let epsilon = match node.attribute("epsilon") {
        Some(v) => {
            let value: f64 = parse_number(node, "epsilon", v)?;
            if !value.is_finite() || value < 0.0 {
                return Err(Diagnostic::error(
                    format!("epsilon must be a non-negative number (got '{}')", v),
                    span,
                ));
            }
            Some(Epsilon {
                text: v.trim().to_string(),
                value,
            })
        }
        None => None,
    };

    let generator = match node.attribute("generator") {
        Some(g) if is_identifier(g) => Some(g.to_string()),
        Some(g) => {
            return Err(Diagnostic::error(
                format!("generator '{}' is not a valid C function name", g),
                span,
            ))
        }
        None => None,
    };

    let literal = element_text(node);

    let ignored = |attr: &str| {
        Diagnostic::warning(
            format!("'{}' has no effect on <{}> '{}'", attr, role.tag(), name),
            span,
        )
    };
    if role != Role::Output {
        if node.attribute("novalidation").is_some() {
            warnings.push(ignored("novalidation"));
        }
        if epsilon.is_some() {
            warnings.push(ignored("epsilon"));
        }
    } else if novalidation && epsilon.is_some() {
        warnings.push(ignored("epsilon").with_note("validation is disabled".to_string()));
    }
    if role == Role::Local {
        if generator.is_some() {
            warnings.push(ignored("generator"));
        }
        if literal.is_some() {
            warnings.push(ignored("initializer text"));
        }
    }
    if literal.is_some() && generator.is_some() {
        warnings.push(
            Diagnostic::warning(
                format!("'{}' has both initializer text and a generator", name),
                span,
            )
            .with_note("the initializer text is used".to_string()),
        );
    }

    Ok(VariableSpec {
        name,
        ty,
        nmemb,
        role,
        arg,
        literal,
        generator,
        novalidation,
        epsilon,
        span,
    })
}
