//! Kernel launch schedule.
//!
//! Kernels sharing an `order` key form a tier and launch concurrently on
//! their own queues. Tiers run in ascending key order: every kernel of a
//! tier signals one slot of that tier's completion list, and every kernel
//! of the next tier waits on the whole list.

use std::collections::BTreeMap;

use crate::diagnostic::Diagnostic;
use crate::manifest::KernelSpec;

/// Kernels that launch together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
    pub key: Option<i64>,
    /// Kernel indices in declaration order.
    pub kernels: Vec<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    pub tiers: Vec<Tier>,
}

/// Where a kernel launch sits in the schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchSlot {
    pub kernel: usize,
    /// Completion list waited on before launching.
    pub wait: Option<usize>,
    /// Completion list and slot this launch signals.
    pub signal: Option<(usize, usize)>,
}

impl Schedule {
    /// Group kernels into tiers.
    ///
    /// Without order keys every kernel lands in a single tier. Mixing
    /// ordered and unordered kernels is rejected.
    pub fn resolve(kernels: &[KernelSpec]) -> Result<Self, Vec<Diagnostic>> {
        if kernels.is_empty() {
            return Ok(Self::default());
        }

        let ordered: Vec<&KernelSpec> = kernels.iter().filter(|k| k.order.is_some()).collect();
        if ordered.is_empty() {
            return Ok(Self {
                tiers: vec![Tier {
                    key: None,
                    kernels: (0..kernels.len()).collect(),
                }],
            });
        }

        if ordered.len() != kernels.len() {
            let witness = &ordered[0].name;
            let errors = kernels
                .iter()
                .filter(|k| k.order.is_none())
                .map(|k| {
                    Diagnostic::error(
                        format!("kernel '{}' has no 'order' but other kernels do", k.name),
                        k.span,
                    )
                    .with_note(format!("kernel '{}' declares an order", witness))
                    .with_help("give every kernel an order, or none of them".to_string())
                })
                .collect();
            return Err(errors);
        }

        let mut by_key: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, kernel) in kernels.iter().enumerate() {
            if let Some(key) = kernel.order {
                by_key.entry(key).or_default().push(i);
            }
        }
        let tiers = by_key
            .into_iter()
            .map(|(key, kernels)| Tier {
                key: Some(key),
                kernels,
            })
            .collect();
        Ok(Self { tiers })
    }

    /// Number of tier boundaries (completion lists).
    pub fn sync_points(&self) -> usize {
        self.tiers.len().saturating_sub(1)
    }

    /// C name of the completion list signalled by tier `tier`.
    pub fn list_name(tier: usize) -> String {
        format!("tier{}Done", tier)
    }

    /// Length of the completion list signalled by tier `tier`.
    pub fn list_len(&self, tier: usize) -> usize {
        self.tiers.get(tier).map_or(0, |t| t.kernels.len())
    }

    /// Launches in execution order with their wait/signal wiring.
    pub fn launches(&self) -> Vec<LaunchSlot> {
        let last = self.tiers.len().saturating_sub(1);
        let mut slots = Vec::new();
        for (t, tier) in self.tiers.iter().enumerate() {
            for (slot, &kernel) in tier.kernels.iter().enumerate() {
                slots.push(LaunchSlot {
                    kernel,
                    wait: if t > 0 { Some(t - 1) } else { None },
                    signal: if t < last { Some((t, slot)) } else { None },
                });
            }
        }
        slots
    }
}
