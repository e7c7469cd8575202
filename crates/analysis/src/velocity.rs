use std::collections::BTreeMap;

use chrono::Datelike;
use normalizer::RawPullRequest;
use serde::Serialize;

use crate::rank::first_min_by;
use crate::window::YearWindow;

const TREND_THRESHOLD: f64 = 0.15;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekCount {
    pub week: String,
    pub count: u64,
}

impl WeekCount {
    fn new(week: impl Into<String>, count: u64) -> Self {
        Self {
            week: week.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct QuarterlyComparison {
    pub q1: u64,
    pub q2: u64,
    pub q3: u64,
    pub q4: u64,
}

impl QuarterlyComparison {
    fn record(&mut self, month0: u32) {
        match month0 {
            0..=2 => self.q1 += 1,
            3..=5 => self.q2 += 1,
            6..=8 => self.q3 += 1,
            _ => self.q4 += 1,
        }
    }

    fn trend(&self) -> Trend {
        let first_half = self.q1 + self.q2;
        let second_half = self.q3 + self.q4;
        let total = first_half + second_half;
        if total == 0 {
            return Trend::Stable;
        }
        let diff = second_half as f64 - first_half as f64;
        let threshold = total as f64 * TREND_THRESHOLD;
        if diff > threshold {
            Trend::Increasing
        } else if diff < -threshold {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VelocityStats {
    pub prs_per_week: Vec<WeekCount>,
    pub trend: Trend,
    pub busiest_week: WeekCount,
    pub slowest_week: WeekCount,
    pub quarterly_comparison: QuarterlyComparison,
}

/// 1-based week counted in whole 7-day blocks from Jan 1. Not ISO numbering.
fn week_number(pr: &RawPullRequest, window: &YearWindow) -> i64 {
    let days = (pr.created_at - window.start()).num_seconds().div_euclid(86_400);
    days.div_euclid(7) + 1
}

pub fn velocity_stats(prs: &[RawPullRequest], window: &YearWindow) -> VelocityStats {
    let mut per_week: BTreeMap<i64, u64> = BTreeMap::new();
    let mut quarters = QuarterlyComparison::default();
    for pr in prs {
        *per_week.entry(week_number(pr, window)).or_default() += 1;
        quarters.record(pr.created_at.month0());
    }

    let prs_per_week: Vec<WeekCount> = per_week
        .into_iter()
        .map(|(week, count)| WeekCount::new(format!("W{week}"), count))
        .collect();

    let mut busiest_week = WeekCount::new("W1", 0);
    for week in &prs_per_week {
        if week.count > busiest_week.count {
            busiest_week = week.clone();
        }
    }
    let slowest_week = first_min_by(prs_per_week.iter(), |week| week.count)
        .cloned()
        .unwrap_or_else(|| WeekCount::new("N/A", 0));

    VelocityStats {
        trend: quarters.trend(),
        prs_per_week,
        busiest_week,
        slowest_week,
        quarterly_comparison: quarters,
    }
}
