use chrono::Datelike;
use normalizer::{ItemState, RawPullRequest};
use serde::Serialize;

use crate::calendar::DAY_NAMES;
use crate::rank::{first_max_by, first_min_by, mean, minutes};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrHighlight {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub author_avatar: String,
    pub url: String,
}

impl PrHighlight {
    fn from_pr(pr: &RawPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.clone(),
            author: pr.author.login.clone(),
            author_avatar: pr.author.avatar_url.clone(),
            url: pr
                .url
                .clone()
                .unwrap_or_else(|| format!("#{}", pr.number)),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FastestMerge {
    #[serde(flatten)]
    pub pr: PrHighlight,
    pub merge_time_minutes: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlowestMerge {
    #[serde(flatten)]
    pub pr: PrHighlight,
    pub merge_time_days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BiggestPr {
    #[serde(flatten)]
    pub pr: PrHighlight,
    pub additions: u64,
    pub deletions: u64,
    pub total_lines: u64,
}

/// Older flat shape of the biggest PR, kept for existing readers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LargestPr {
    pub number: u64,
    pub title: String,
    pub additions: u64,
    pub deletions: u64,
}

impl From<&BiggestPr> for LargestPr {
    fn from(biggest: &BiggestPr) -> Self {
        Self {
            number: biggest.pr.number,
            title: biggest.pr.title.clone(),
            additions: biggest.additions,
            deletions: biggest.deletions,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MostCommentedPr {
    #[serde(flatten)]
    pub pr: PrHighlight,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MostRevisedPr {
    #[serde(flatten)]
    pub pr: PrHighlight,
    pub commits: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SizeDistribution {
    pub tiny: u64,
    pub small: u64,
    pub medium: u64,
    pub large: u64,
    pub huge: u64,
}

impl SizeDistribution {
    fn record(&mut self, lines: u64) {
        match lines {
            0..=9 => self.tiny += 1,
            10..=99 => self.small += 1,
            100..=499 => self.medium += 1,
            500..=999 => self.large += 1,
            _ => self.huge += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayCount {
    pub day: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestStats {
    pub opened: u64,
    pub merged: u64,
    pub closed: u64,
    pub average_merge_time_hours: f64,
    pub fastest_merge: Option<FastestMerge>,
    pub slowest_merge: Option<SlowestMerge>,
    #[serde(rename = "biggestPR")]
    pub biggest_pr: Option<BiggestPr>,
    #[serde(rename = "mostCommentedPR")]
    pub most_commented_pr: Option<MostCommentedPr>,
    #[serde(rename = "mostRevisedPR")]
    pub most_revised_pr: Option<MostRevisedPr>,
    #[serde(rename = "largestPR")]
    pub largest_pr: Option<LargestPr>,
    pub size_distribution: SizeDistribution,
    #[serde(rename = "avgLinesPerPR")]
    pub avg_lines_per_pr: u64,
    pub prs_by_day_of_week: Vec<DayCount>,
    pub busiest_day: String,
}

/// Merge time in minutes, or `None` for unmerged PRs and merges stamped before creation.
pub(crate) fn merge_minutes(pr: &RawPullRequest) -> Option<f64> {
    let merged_at = pr.merged_at?;
    let elapsed = minutes(merged_at - pr.created_at);
    (elapsed >= 0.0).then_some(elapsed)
}

pub fn pull_request_stats(prs: &[RawPullRequest]) -> PullRequestStats {
    let opened = prs.len() as u64;
    let merged = prs.iter().filter(|pr| pr.merged_at.is_some()).count() as u64;
    // Merged PRs report `Closed` too; this counts the ones closed without merging.
    let closed = prs
        .iter()
        .filter(|pr| pr.state == ItemState::Closed && pr.merged_at.is_none())
        .count() as u64;

    let merge_times: Vec<(&RawPullRequest, f64)> = prs
        .iter()
        .filter_map(|pr| merge_minutes(pr).map(|m| (pr, m)))
        .collect();
    let total_minutes: f64 = merge_times.iter().map(|(_, m)| m).sum();
    let average_merge_time_hours = mean(total_minutes, merge_times.len()) / 60.0;

    let fastest_merge =
        first_min_by(merge_times.iter(), |(_, m)| *m).map(|(pr, m)| FastestMerge {
            pr: PrHighlight::from_pr(pr),
            merge_time_minutes: m.round() as i64,
        });
    let slowest_merge =
        first_max_by(merge_times.iter(), |(_, m)| *m).map(|(pr, m)| SlowestMerge {
            pr: PrHighlight::from_pr(pr),
            merge_time_days: (m / (60.0 * 24.0)).round() as i64,
        });

    let sized: Vec<(&RawPullRequest, u64)> = prs
        .iter()
        .filter_map(|pr| pr.changed_lines().map(|lines| (pr, lines)))
        .collect();
    let biggest_pr = first_max_by(sized.iter(), |(_, lines)| *lines).map(|(pr, lines)| BiggestPr {
        pr: PrHighlight::from_pr(pr),
        additions: pr.additions.unwrap_or(0),
        deletions: pr.deletions.unwrap_or(0),
        total_lines: *lines,
    });

    let most_commented_pr = first_max_by(
        prs.iter()
            .map(|pr| (pr, pr.comments + pr.review_comments))
            .filter(|(_, comments)| *comments > 0),
        |(_, comments)| *comments,
    )
    .map(|(pr, comments)| MostCommentedPr {
        pr: PrHighlight::from_pr(pr),
        comments,
    });

    let most_revised_pr = first_max_by(
        prs.iter()
            .filter_map(|pr| pr.commits.map(|commits| (pr, commits)))
            .filter(|(_, commits)| *commits > 1),
        |(_, commits)| *commits,
    )
    .map(|(pr, commits)| MostRevisedPr {
        pr: PrHighlight::from_pr(pr),
        commits,
    });

    let mut size_distribution = SizeDistribution::default();
    let mut total_lines = 0u64;
    for (_, lines) in &sized {
        size_distribution.record(*lines);
        total_lines += lines;
    }
    let avg_lines_per_pr = mean(total_lines as f64, sized.len()).round() as u64;

    let mut by_day = [0u64; 7];
    for pr in prs {
        by_day[pr.created_at.weekday().num_days_from_sunday() as usize] += 1;
    }
    let busiest_index = first_max_by(0..by_day.len(), |index| by_day[*index]).unwrap_or(0);
    let prs_by_day_of_week = DAY_NAMES
        .iter()
        .zip(by_day)
        .map(|(day, count)| DayCount {
            day: day.to_string(),
            count,
        })
        .collect();

    let largest_pr = biggest_pr.as_ref().map(LargestPr::from);

    PullRequestStats {
        opened,
        merged,
        closed,
        average_merge_time_hours,
        fastest_merge,
        slowest_merge,
        biggest_pr,
        most_commented_pr,
        most_revised_pr,
        largest_pr,
        size_distribution,
        avg_lines_per_pr,
        prs_by_day_of_week,
        busiest_day: DAY_NAMES[busiest_index].to_string(),
    }
}
