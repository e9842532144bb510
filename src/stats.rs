use bevy::prelude::*;
use serde::Serialize;

use crate::scheduler::EpochReport;

/// Lost-agent counts gathered over a run.
#[derive(Resource, Debug, Default, Clone)]
pub struct RunStats {
    pub lost_counts: Vec<usize>,
    pub last_population: usize,
}

/// Descriptive statistics over one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Summary {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Some(Self {
            mean,
            median,
            std_dev: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[count - 1],
            count,
        })
    }
}

impl RunStats {
    pub fn record(&mut self, report: &EpochReport) {
        self.lost_counts.push(report.lost_count);
        self.last_population = report.population;
    }

    pub fn epochs(&self) -> usize {
        self.lost_counts.len()
    }

    pub fn last_lost(&self) -> Option<usize> {
        self.lost_counts.last().copied()
    }

    pub fn lost_summary(&self) -> Option<Summary> {
        let values: Vec<f64> = self.lost_counts.iter().map(|&c| c as f64).collect();
        Summary::of(&values)
    }
}
