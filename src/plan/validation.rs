//! Output validation planning.
//!
//! Each validated output is compared against its reference copy element
//! by element and, for vector types, lane by lane. The element loop uses
//! `i`; a lane loop uses `j` when nested, `i` on its own.

use super::classify::VariableClass;
use crate::manifest::{Manifest, Role};

/// How two values are compared.
#[derive(Clone, Debug, PartialEq)]
pub enum Comparison {
    Exact,
    /// Tolerance stored in a `double` named `var`.
    Epsilon { var: String, text: String, value: f64 },
}

impl Comparison {
    /// C expression that is true on mismatch.
    pub fn condition(&self, expected: &str, actual: &str) -> String {
        match self {
            Comparison::Exact => format!("{} != {}", expected, actual),
            Comparison::Epsilon { var, .. } => {
                format!("TEST_EPSILON({}, {}, {})", expected, actual, var)
            }
        }
    }

    /// Host-side evaluation of the generated mismatch test.
    pub fn mismatches(&self, expected: f64, actual: f64) -> bool {
        match self {
            Comparison::Exact => expected != actual,
            Comparison::Epsilon { value, .. } => {
                (expected > actual && expected - actual > *value)
                    || (actual >= expected && actual - expected > *value)
            }
        }
    }

    /// Suffix of the mismatch message.
    pub fn note(&self) -> &'static str {
        match self {
            Comparison::Exact => "",
            Comparison::Epsilon { .. } => " (with epsilon)",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidationExpr {
    pub variable: String,
    pub comparison: Comparison,
    /// printf conversion of one compared value.
    pub format: &'static str,
    /// Element loop bound, for arrays.
    pub elements: Option<u64>,
    /// Lane loop bound, for vector types.
    pub lanes: Option<u32>,
}

impl ValidationExpr {
    fn element_index(&self) -> Option<&'static str> {
        self.elements.map(|_| "i")
    }

    fn lane_index(&self) -> Option<&'static str> {
        match (self.elements, self.lanes) {
            (_, None) => None,
            (Some(_), Some(_)) => Some("j"),
            (None, Some(_)) => Some("i"),
        }
    }

    /// Loop nest as `(index, bound)` pairs, outermost first.
    pub fn loops(&self) -> Vec<(&'static str, u64)> {
        let mut loops = Vec::new();
        if let (Some(index), Some(bound)) = (self.element_index(), self.elements) {
            loops.push((index, bound));
        }
        if let (Some(index), Some(bound)) = (self.lane_index(), self.lanes) {
            loops.push((index, bound as u64));
        }
        loops
    }

    fn access(&self, base: &str) -> String {
        let mut expr = base.to_string();
        if let Some(i) = self.element_index() {
            expr.push_str(&format!("[{}]", i));
        }
        if let Some(j) = self.lane_index() {
            expr.push_str(&format!(".s[{}]", j));
        }
        expr
    }

    pub fn expected(&self) -> String {
        self.access(&format!("{}C", self.variable))
    }

    pub fn actual(&self) -> String {
        self.access(&self.variable)
    }

    pub fn test(&self) -> String {
        self.comparison.condition(&self.expected(), &self.actual())
    }

    /// printf template naming the compared location: `c[%d].s[%d]`.
    pub fn location(&self) -> String {
        let mut label = self.variable.clone();
        if self.element_index().is_some() {
            label.push_str("[%d]");
        }
        if self.lane_index().is_some() {
            label.push_str(".s[%d]");
        }
        label
    }

    /// printf arguments matching [`Self::location`], in order.
    pub fn location_args(&self) -> Vec<&'static str> {
        self.loops().into_iter().map(|(index, _)| index).collect()
    }

    /// Total number of scalar comparisons.
    pub fn comparisons(&self) -> u64 {
        self.elements.unwrap_or(1) * self.lanes.unwrap_or(1) as u64
    }
}

/// One validation per output with a reference copy, in declaration order.
pub fn plan_validation(manifest: &Manifest, classes: &[Vec<VariableClass>]) -> Vec<ValidationExpr> {
    let mut checks = Vec::new();
    for (k, kernel) in manifest.kernels.iter().enumerate() {
        for (v, var) in kernel.variables.iter().enumerate() {
            let class = &classes[k][v];
            if var.role != Role::Output || class.reference.is_none() {
                continue;
            }
            let comparison = match &var.epsilon {
                Some(eps) => Comparison::Epsilon {
                    var: format!("{}Epsilon", var.name),
                    text: eps.text.clone(),
                    value: eps.value,
                },
                None => Comparison::Exact,
            };
            checks.push(ValidationExpr {
                variable: var.name.clone(),
                comparison,
                format: class.format,
                elements: class.storage.is_array().then(|| class.storage.count()),
                lanes: class.vector.map(|v| v.lanes),
            });
        }
    }
    checks
}
