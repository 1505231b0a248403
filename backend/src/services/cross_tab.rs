//! Row-percentage cross tabulation of two outcomes of the same record.

use crate::api::{CrossTab, CrossTabRow};
use crate::error::{ErrorContext, StatsError, StatsResult};

/// Allowed drift of a non-empty row's percentages from 100.
pub const ROW_TOLERANCE: f64 = 1e-6;

/// Ordered bins of one axis. Headers follow bin order, never the data.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisBins {
    /// One bin per listed value.
    Categories(Vec<u32>),
    /// Half-open ranges between ascending lower edges; the last bin is
    /// open-ended.
    Edges(Vec<u32>),
}

impl AxisBins {
    /// One bin per value in `0..=max`.
    pub fn counts_up_to(max: u32) -> Self {
        AxisBins::Categories((0..=max).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            AxisBins::Categories(values) => values.len(),
            AxisBins::Edges(edges) => edges.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the bin holding `value`, if any.
    pub fn bin_of(&self, value: u32) -> Option<usize> {
        match self {
            AxisBins::Categories(values) => values.iter().position(|&v| v == value),
            AxisBins::Edges(edges) => edges.iter().rposition(|&lower| value >= lower),
        }
    }

    /// Labels such as `"3"` for categories or `"60-79"` / `"140+"` for edges.
    pub fn labels(&self) -> Vec<String> {
        match self {
            AxisBins::Categories(values) => values.iter().map(|v| v.to_string()).collect(),
            AxisBins::Edges(edges) => edges
                .iter()
                .enumerate()
                .map(|(i, lower)| match edges.get(i + 1) {
                    Some(next) => format!("{}-{}", lower, next - 1),
                    None => format!("{}+", lower),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrossTabBuilder {
    row_name: String,
    rows: AxisBins,
    columns: AxisBins,
}

impl CrossTabBuilder {
    pub fn new(row_name: impl Into<String>, rows: AxisBins, columns: AxisBins) -> Self {
        Self {
            row_name: row_name.into(),
            rows,
            columns,
        }
    }

    /// Tabulate `(row value, column value)` pairs.
    pub fn build(&self, pairs: &[(u32, u32)]) -> StatsResult<CrossTab> {
        let mut counts = vec![vec![0u64; self.columns.len()]; self.rows.len()];
        let mut unbinned = 0u64;

        for &(a, b) in pairs {
            match (self.rows.bin_of(a), self.columns.bin_of(b)) {
                (Some(row), Some(col)) => counts[row][col] += 1,
                _ => unbinned += 1,
            }
        }

        let rows = self
            .rows
            .labels()
            .into_iter()
            .zip(counts)
            .map(|(label, row)| self.percentage_row(label, row))
            .collect::<StatsResult<Vec<_>>>()?;

        let mut header = vec![self.row_name.clone()];
        header.extend(self.columns.labels());

        Ok(CrossTab {
            header,
            rows,
            unbinned,
        })
    }

    fn percentage_row(&self, label: String, counts: Vec<u64>) -> StatsResult<CrossTabRow> {
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return Ok(CrossTabRow {
                label,
                total,
                cells: vec![None; counts.len()],
            });
        }

        let cells: Vec<Option<f64>> = counts
            .iter()
            .map(|&c| Some(100.0 * c as f64 / total as f64))
            .collect();
        let sum: f64 = cells.iter().flatten().sum();
        if (sum - 100.0).abs() > ROW_TOLERANCE {
            return Err(StatsError::consistency(
                format!("row {} sums to {}%", label, sum),
                ErrorContext::new("cross_tab"),
            ));
        }

        Ok(CrossTabRow {
            label,
            total,
            cells,
        })
    }
}
