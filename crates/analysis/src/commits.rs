use normalizer::{RawCommitActivity, RawContributor, RawContributorStat};
use serde::Serialize;

use crate::rank::sort_desc_by_key;
use crate::window::YearWindow;

const TOP_COMMITTERS: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Committer {
    pub login: String,
    pub avatar_url: String,
    pub commits: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommitStats {
    /// Lifetime commits according to the flat contributors listing.
    pub total: u64,
    pub total_this_year: u64,
    pub top_committers: Vec<Committer>,
    pub weekly_activity: Vec<u64>,
    pub average_per_week: u64,
}

pub(crate) fn yearly_commits(stat: &RawContributorStat, window: &YearWindow) -> u64 {
    stat.weeks
        .iter()
        .filter(|week| window.contains_epoch(week.week))
        .map(|week| week.commits)
        .sum()
}

pub fn commit_stats(
    activity: &[RawCommitActivity],
    contributor_stats: &[RawContributorStat],
    contributors: &[RawContributor],
    window: &YearWindow,
) -> CommitStats {
    let weekly_activity: Vec<u64> = activity
        .iter()
        .filter(|week| window.contains_epoch(week.week))
        .map(|week| week.total)
        .collect();

    let mut top_committers: Vec<Committer> = contributor_stats
        .iter()
        .map(|stat| Committer {
            login: stat.author.login.clone(),
            avatar_url: stat.author.avatar_url.clone(),
            commits: yearly_commits(stat, window),
        })
        .filter(|committer| committer.commits > 0)
        .collect();
    sort_desc_by_key(&mut top_committers, |committer| committer.commits);
    top_committers.truncate(TOP_COMMITTERS);

    // Lifetime totals are a coarse stand-in until GitHub has computed the weekly stats.
    if contributor_stats.is_empty() {
        top_committers = contributors
            .iter()
            .take(TOP_COMMITTERS)
            .map(|contributor| Committer {
                login: contributor.login.clone(),
                avatar_url: contributor.avatar_url.clone(),
                commits: contributor.contributions,
            })
            .collect();
    }

    let total_this_year = if contributor_stats.is_empty() {
        weekly_activity.iter().sum()
    } else {
        contributor_stats
            .iter()
            .map(|stat| yearly_commits(stat, window))
            .sum()
    };

    let average_per_week = if weekly_activity.is_empty() {
        0
    } else {
        (total_this_year as f64 / weekly_activity.len() as f64).round() as u64
    };

    CommitStats {
        total: contributors.iter().map(|c| c.contributions).sum(),
        total_this_year,
        top_committers,
        weekly_activity,
        average_per_week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use normalizer::{Identity, RawContributorWeek};

    const JAN_07_2024: i64 = 1_704_585_600;
    const DEC_28_2023: i64 = 1_703_721_600;
    const WEEK: i64 = 604_800;

    fn week(at: i64, total: u64) -> RawCommitActivity {
        RawCommitActivity {
            week: at,
            total,
            days: [0, total, 0, 0, 0, 0, 0],
        }
    }

    fn stat(login: &str, weeks: &[(i64, u64)]) -> RawContributorStat {
        RawContributorStat {
            author: Identity::new(login, format!("{login}.png")),
            total: weeks.iter().map(|(_, c)| c).sum(),
            weeks: weeks
                .iter()
                .map(|(w, c)| RawContributorWeek {
                    week: *w,
                    additions: 0,
                    deletions: 0,
                    commits: *c,
                })
                .collect(),
        }
    }

    #[test]
    fn year_totals_ignore_previous_december() {
        let window = YearWindow::for_year(2024).unwrap();
        let activity = vec![
            week(DEC_28_2023, 50),
            week(JAN_07_2024, 4),
            week(JAN_07_2024 + WEEK, 6),
        ];
        let stats = vec![
            stat("old", &[(DEC_28_2023, 50)]),
            stat("a", &[(JAN_07_2024, 4)]),
            stat("b", &[(JAN_07_2024 + WEEK, 6)]),
        ];
        let result = commit_stats(&activity, &stats, &[], &window);
        assert_eq!(result.weekly_activity, vec![4, 6]);
        assert_eq!(result.total_this_year, 10);
        assert_eq!(result.average_per_week, 5);
        let logins: Vec<_> = result.top_committers.iter().map(|c| c.login.as_str()).collect();
        assert_eq!(logins, vec!["b", "a"]);
    }

    #[test]
    fn falls_back_to_lifetime_contributors() {
        let window = YearWindow::for_year(2024).unwrap();
        let contributors = vec![
            RawContributor {
                login: "x".into(),
                avatar_url: String::new(),
                contributions: 30,
            },
            RawContributor {
                login: "y".into(),
                avatar_url: String::new(),
                contributions: 12,
            },
        ];
        let activity = vec![week(JAN_07_2024, 7)];
        let result = commit_stats(&activity, &[], &contributors, &window);
        assert_eq!(result.top_committers.len(), 2);
        assert_eq!(result.top_committers[0].commits, 30);
        assert_eq!(result.total, 42);
        assert_eq!(result.total_this_year, 7);
    }

    #[test]
    fn stats_without_year_commits_leave_top_committers_empty() {
        let window = YearWindow::for_year(2024).unwrap();
        let contributors = vec![RawContributor {
            login: "alice".into(),
            avatar_url: String::new(),
            contributions: 500,
        }];
        // Mid-2023 week only.
        let stats = vec![stat("alice", &[(1_690_000_000, 500)])];
        let result = commit_stats(&[], &stats, &contributors, &window);
        assert_eq!(result.total_this_year, 0);
        assert!(result.top_committers.is_empty());
        assert_eq!(result.total, 500);
    }

    #[test]
    fn no_weeks_means_zero_average() {
        let window = YearWindow::for_year(2024).unwrap();
        let result = commit_stats(&[], &[], &[], &window);
        assert_eq!(result.average_per_week, 0);
        assert!(result.top_committers.is_empty());
    }
}
