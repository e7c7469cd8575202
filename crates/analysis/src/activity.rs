use normalizer::RawCommitActivity;
use serde::Serialize;

use crate::calendar::{DAY_NAMES, MONTH_NAMES};
use crate::rank::first_max_by;
use crate::window::{epoch_month, YearWindow};

const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthCount {
    pub month: String,
    pub month_index: usize,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayCount {
    pub day: String,
    pub day_index: usize,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusiestMonth {
    pub month: String,
    pub month_index: usize,
    pub commits: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusiestDayOfWeek {
    pub day: String,
    pub day_index: usize,
    pub average_commits: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub busiest_month: BusiestMonth,
    pub busiest_day_of_week: BusiestDayOfWeek,
    /// Consecutive active weeks, not days.
    pub longest_streak: u64,
    pub commits_by_month: Vec<MonthCount>,
    pub commits_by_day_of_week: Vec<WeekdayCount>,
}

pub fn activity_stats(activity: &[RawCommitActivity], window: &YearWindow) -> ActivityStats {
    let mut year_weeks: Vec<&RawCommitActivity> = activity
        .iter()
        .filter(|week| window.contains_epoch(week.week))
        .collect();
    year_weeks.sort_by_key(|week| week.week);

    let mut by_month = [0u64; 12];
    let mut by_day = [0u64; 7];
    for week in &year_weeks {
        if let Some(month) = epoch_month(week.week) {
            by_month[month] += week.total;
        }
        for (slot, commits) in by_day.iter_mut().zip(week.days) {
            *slot += commits;
        }
    }

    let (month_index, month_commits) =
        first_max_by(by_month.iter().copied().enumerate(), |(_, count)| *count).unwrap_or((0, 0));
    let (day_index, day_commits) =
        first_max_by(by_day.iter().copied().enumerate(), |(_, count)| *count).unwrap_or((0, 0));
    let weeks = year_weeks.len().max(1);

    ActivityStats {
        busiest_month: BusiestMonth {
            month: MONTH_NAMES[month_index].to_string(),
            month_index,
            commits: month_commits,
        },
        busiest_day_of_week: BusiestDayOfWeek {
            day: DAY_NAMES[day_index].to_string(),
            day_index,
            average_commits: (day_commits as f64 / weeks as f64).round() as u64,
        },
        longest_streak: longest_streak(&year_weeks),
        commits_by_month: by_month
            .iter()
            .enumerate()
            .map(|(index, count)| MonthCount {
                month: MONTH_NAMES[index].to_string(),
                month_index: index,
                count: *count,
            })
            .collect(),
        commits_by_day_of_week: by_day
            .iter()
            .enumerate()
            .map(|(index, count)| WeekdayCount {
                day: DAY_NAMES[index].to_string(),
                day_index: index,
                count: *count,
            })
            .collect(),
    }
}

/// Weeks must be sorted by start; a gap in the series breaks the run.
fn longest_streak(weeks: &[&RawCommitActivity]) -> u64 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<i64> = None;
    for week in weeks {
        if week.total == 0 {
            current = 0;
        } else if previous.is_some_and(|prev| week.week - prev == WEEK_SECS) && current > 0 {
            current += 1;
        } else {
            current = 1;
        }
        longest = longest.max(current);
        previous = Some(week.week);
    }
    longest
}
