// 📊 Category Statistics - Aggregation for the statistics screen
// Tallies equipment records per category and keeps chart legend colors
// stable across recomputations.

use crate::db::Equipo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// PALETTE
// ============================================================================

/// Fixed, ordered legend palette. Colors are assigned to categories in the
/// order they are first seen and wrap around once all 12 are taken.
pub const PALETTE: [&str; 12] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40",
    "#C9CBCF", "#8AC926", "#FF595E", "#1982C4", "#6A4C93", "#FFCA3A",
];

// ============================================================================
// CATEGORY TALLY (one aggregation pass)
// ============================================================================

/// Snapshot produced by one `recompute` pass.
///
/// `labels` and `counts` run parallel, in the order categories were first
/// encountered in the input. `colors` maps every label to its assigned
/// palette color, including categories from earlier passes that no longer
/// have records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTally {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
    pub colors: HashMap<String, String>,
}

impl CategoryTally {
    /// Total number of categorized records in this pass
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Share of the given category slot, as a percentage of the total.
    /// Returns None when there is nothing to divide by (no categorized
    /// records) or the index is out of range.
    pub fn percentage(&self, index: usize) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let count = *self.counts.get(index)?;
        Some(count as f64 / total as f64 * 100.0)
    }

    /// Assigned color for a label
    pub fn color_for(&self, label: &str) -> Option<&str> {
        self.colors.get(label).map(|c| c.as_str())
    }

    /// One legend line per category: "{label}: {count} equipos ({pct}%)"
    pub fn legend(&self) -> Vec<String> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                format!(
                    "{}: {} equipos ({:.1}%)",
                    label,
                    self.counts[i],
                    self.percentage(i).unwrap_or(0.0)
                )
            })
            .collect()
    }
}

// ============================================================================
// CATEGORY AGGREGATOR
// ============================================================================

/// Aggregates equipment records into per-category counts.
///
/// Counts are rebuilt from scratch on every call; the color assignment is an
/// accumulator that only ever grows, so a category keeps its legend color
/// for the lifetime of this instance even as records come and go.
///
/// Category strings are opaque and case-sensitive here; any normalization
/// happens at data entry. Single-threaded: callers serialize invocations,
/// each snapshot replaces the previous one.
pub struct CategoryAggregator {
    /// category → palette color, grow-only
    color_assignment: HashMap<String, String>,
}

impl CategoryAggregator {
    pub fn new() -> Self {
        CategoryAggregator {
            color_assignment: HashMap::new(),
        }
    }

    /// Recompute the tally from a full record snapshot.
    ///
    /// Records with an empty category are excluded, not rejected. New
    /// categories are assigned the palette color at index
    /// `assignment_size mod palette_len`, in first-encounter order.
    pub fn recompute(&mut self, records: &[Equipo]) -> CategoryTally {
        let mut labels: Vec<String> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for equipo in records {
            let categoria = equipo.categoria.as_str();
            if categoria.is_empty() {
                continue;
            }

            match index.get(categoria) {
                Some(&slot) => counts[slot] += 1,
                None => {
                    index.insert(categoria.to_string(), labels.len());
                    labels.push(categoria.to_string());
                    counts.push(1);

                    if !self.color_assignment.contains_key(categoria) {
                        let color = PALETTE[self.color_assignment.len() % PALETTE.len()];
                        self.color_assignment
                            .insert(categoria.to_string(), color.to_string());
                    }
                }
            }
        }

        CategoryTally {
            labels,
            counts,
            colors: self.color_assignment.clone(),
        }
    }

    /// Number of categories ever assigned a color
    pub fn assigned_count(&self) -> usize {
        self.color_assignment.len()
    }
}

impl Default for CategoryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
