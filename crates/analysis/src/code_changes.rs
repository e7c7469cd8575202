use chrono::{DateTime, Utc};
use normalizer::{LanguageBytes, RawCodeFrequencyWeek, RawPullRequest};
use serde::Serialize;

use crate::calendar::language_color;
use crate::rank::{first_max_by, sort_desc_by_key};
use crate::window::{epoch_to_datetime, YearWindow};

const TOP_LANGUAGES: usize = 8;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LanguageShare {
    pub name: String,
    pub percentage: u64,
    pub color: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusiestWeek {
    pub week_start: DateTime<Utc>,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeChangeStats {
    pub additions: u64,
    pub deletions: u64,
    pub net_change: i64,
    pub languages: Vec<LanguageShare>,
    pub busiest_week: Option<BusiestWeek>,
}

fn churn(week: &RawCodeFrequencyWeek) -> u64 {
    week.additions.unsigned_abs() + week.deletions.unsigned_abs()
}

/// `fallback_prs` is consulted only when the frequency series has nothing for the year.
pub fn code_change_stats(
    frequency: &[RawCodeFrequencyWeek],
    languages: &[LanguageBytes],
    window: &YearWindow,
    fallback_prs: Option<&[RawPullRequest]>,
) -> CodeChangeStats {
    let year_weeks: Vec<&RawCodeFrequencyWeek> = frequency
        .iter()
        .filter(|week| window.contains_epoch(week.week))
        .collect();

    let mut additions: u64 = year_weeks
        .iter()
        .map(|week| week.additions.max(0) as u64)
        .sum();
    let mut deletions: u64 = year_weeks
        .iter()
        .map(|week| week.deletions.unsigned_abs())
        .sum();

    if additions == 0 && deletions == 0 {
        if let Some(prs) = fallback_prs.filter(|prs| !prs.is_empty()) {
            additions = prs.iter().map(|pr| pr.additions.unwrap_or(0)).sum();
            deletions = prs.iter().map(|pr| pr.deletions.unwrap_or(0)).sum();
        }
    }

    let busiest_week = first_max_by(year_weeks.iter(), |week| churn(week)).and_then(|week| {
        Some(BusiestWeek {
            week_start: epoch_to_datetime(week.week)?,
            additions: week.additions.max(0) as u64,
            deletions: week.deletions.unsigned_abs(),
        })
    });

    CodeChangeStats {
        additions,
        deletions,
        net_change: additions as i64 - deletions as i64,
        languages: language_shares(languages),
        busiest_week,
    }
}

fn language_shares(languages: &[LanguageBytes]) -> Vec<LanguageShare> {
    let total_bytes: u64 = languages.iter().map(|language| language.bytes).sum();
    let mut shares: Vec<LanguageShare> = languages
        .iter()
        .map(|language| LanguageShare {
            name: language.name.clone(),
            percentage: if total_bytes == 0 {
                0
            } else {
                (language.bytes as f64 / total_bytes as f64 * 100.0).round() as u64
            },
            color: language_color(&language.name).to_string(),
            bytes: language.bytes,
        })
        .collect();
    sort_desc_by_key(&mut shares, |share| share.bytes);
    shares.truncate(TOP_LANGUAGES);
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use normalizer::{Identity, ItemState};

    const JAN_07_2024: i64 = 1_704_585_600;
    const WEEK: i64 = 604_800;

    fn freq(week: i64, additions: i64, deletions: i64) -> RawCodeFrequencyWeek {
        RawCodeFrequencyWeek {
            week,
            additions,
            deletions,
        }
    }

    fn pr(additions: Option<u64>, deletions: Option<u64>) -> RawPullRequest {
        RawPullRequest {
            number: 1,
            title: "change".into(),
            state: ItemState::Closed,
            author: Identity::new("dev", ""),
            url: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            closed_at: None,
            merged_at: None,
            additions,
            deletions,
            comments: 0,
            review_comments: 0,
            commits: None,
        }
    }

    #[test]
    fn sums_year_weeks_with_absolute_deletions() {
        let window = YearWindow::for_year(2024).unwrap();
        let series = vec![
            freq(JAN_07_2024 - 2 * WEEK, 1000, -1000),
            freq(JAN_07_2024, 120, -20),
            freq(JAN_07_2024 + WEEK, 30, -200),
        ];
        let stats = code_change_stats(&series, &[], &window, None);
        assert_eq!(stats.additions, 150);
        assert_eq!(stats.deletions, 220);
        assert_eq!(stats.net_change, -70);
        let busiest = stats.busiest_week.unwrap();
        assert_eq!(busiest.deletions, 200);
        assert_eq!(busiest.week_start.timestamp(), JAN_07_2024 + WEEK);
    }

    #[test]
    fn empty_frequency_falls_back_to_pull_requests() {
        let window = YearWindow::for_year(2024).unwrap();
        let series = vec![freq(JAN_07_2024, 0, 0)];
        let prs = vec![pr(Some(40), Some(5)), pr(None, None), pr(Some(10), Some(15))];
        let stats = code_change_stats(&series, &[], &window, Some(prs.as_slice()));
        assert_eq!(stats.additions, 50);
        assert_eq!(stats.deletions, 20);
        assert_eq!(stats.net_change, 30);
    }

    #[test]
    fn languages_are_ranked_and_colored() {
        let window = YearWindow::for_year(2024).unwrap();
        let mut languages: Vec<LanguageBytes> = (0..10)
            .map(|i| LanguageBytes {
                name: format!("Lang{i}"),
                bytes: 10,
            })
            .collect();
        languages.push(LanguageBytes {
            name: "Rust".into(),
            bytes: 900,
        });
        let stats = code_change_stats(&[], &languages, &window, None);
        assert_eq!(stats.languages.len(), 8);
        assert_eq!(stats.languages[0].name, "Rust");
        assert_eq!(stats.languages[0].percentage, 90);
        assert_eq!(stats.languages[0].color, "#dea584");
        assert_eq!(stats.languages[1].name, "Lang0");
        assert_eq!(stats.languages[1].percentage, 1);
        assert_eq!(stats.languages[1].color, "#8b8b8b");
    }
}
