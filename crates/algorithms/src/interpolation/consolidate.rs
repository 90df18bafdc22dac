//! Bin consolidation: one reduced value per distinct bin index.

use serde::{Deserialize, Serialize};
use smrf_core::{Error, Result};

/// Reduction applied to the values that share a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Min,
    Max,
    Mean,
    /// Middle value; the mean of the two middle values for even counts
    Median,
}

impl Aggregation {
    fn reduce(self, values: &mut [f64]) -> f64 {
        match self {
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Median => {
                values.sort_unstable_by(f64::total_cmp);
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            }
        }
    }
}

/// Group `values` by `indices` and reduce each group with `rule`.
///
/// Returns `(bin index, reduced value)` pairs in ascending bin order.
/// NaN values are skipped; a bin holding only NaN values is omitted.
pub fn consolidate(
    indices: &[usize],
    values: &[f64],
    rule: Aggregation,
) -> Result<Vec<(usize, f64)>> {
    if indices.len() != values.len() {
        return Err(Error::InvalidParameter {
            name: "values",
            value: values.len().to_string(),
            reason: format!("expected one value per index ({})", indices.len()),
        });
    }

    let mut pairs: Vec<(usize, f64)> = indices
        .iter()
        .copied()
        .zip(values.iter().copied())
        .filter(|(_, v)| !v.is_nan())
        .collect();
    pairs.sort_unstable_by_key(|&(i, _)| i);

    let mut out = Vec::new();
    let mut group: Vec<f64> = Vec::new();
    let mut start = 0;
    while start < pairs.len() {
        let bin = pairs[start].0;
        let end = pairs[start..]
            .iter()
            .position(|&(i, _)| i != bin)
            .map_or(pairs.len(), |p| start + p);

        group.clear();
        group.extend(pairs[start..end].iter().map(|&(_, v)| v));
        out.push((bin, rule.reduce(&mut group)));
        start = end;
    }

    Ok(out)
}
