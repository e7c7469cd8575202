use chrono::{DateTime, Utc};
use normalizer::{RawContributor, RawContributorStat, RawPullRequest, ReviewMap, ReviewState};
use serde::Serialize;

use crate::commits::yearly_commits;
use crate::rank::{sort_desc_by_key, Tally};
use crate::window::{epoch_to_datetime, YearWindow};

const LEADERBOARD_SIZE: usize = 10;
const SPOTLIGHT_SIZE: usize = 5;
const WEEKS_PER_YEAR: u64 = 52;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopContributor {
    pub login: String,
    pub avatar_url: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrAuthor {
    pub login: String,
    pub avatar_url: String,
    pub pr_count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinesLeader {
    pub login: String,
    pub avatar_url: String,
    pub lines_changed: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLeader {
    pub login: String,
    pub avatar_url: String,
    pub review_count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RisingStar {
    pub login: String,
    pub avatar_url: String,
    pub first_contribution_date: DateTime<Utc>,
    pub total_contributions: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsistentContributor {
    pub login: String,
    pub avatar_url: String,
    pub active_weeks: u64,
    pub total_weeks: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContributorStats {
    pub total: u64,
    pub new_this_year: u64,
    pub top_contributors: Vec<TopContributor>,
    #[serde(rename = "topByPRs")]
    pub top_by_prs: Vec<PrAuthor>,
    pub top_by_lines_changed: Vec<LinesLeader>,
    pub top_by_reviews: Vec<ReviewLeader>,
    pub rising_stars: Vec<RisingStar>,
    pub most_consistent: Vec<ConsistentContributor>,
}

/// One contributor's activity inside the window.
#[derive(Debug, Clone)]
struct YearActivity<'a> {
    stat: &'a RawContributorStat,
    commits: u64,
    additions: u64,
    deletions: u64,
    active_weeks: u64,
    first_contribution: Option<DateTime<Utc>>,
}

impl YearActivity<'_> {
    fn lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }
}

fn year_activity<'a>(stat: &'a RawContributorStat, window: &YearWindow) -> YearActivity<'a> {
    let year_weeks = || stat.weeks.iter().filter(|week| window.contains_epoch(week.week));
    YearActivity {
        stat,
        commits: yearly_commits(stat, window),
        additions: year_weeks().map(|week| week.additions).sum(),
        deletions: year_weeks().map(|week| week.deletions).sum(),
        active_weeks: year_weeks().filter(|week| week.commits > 0).count() as u64,
        first_contribution: stat
            .weeks
            .iter()
            .find(|week| week.commits > 0)
            .and_then(|week| epoch_to_datetime(week.week)),
    }
}

pub fn contributor_stats(
    contributors: &[RawContributor],
    contributor_stats: &[RawContributorStat],
    prs: &[RawPullRequest],
    reviews: &ReviewMap,
    window: &YearWindow,
) -> ContributorStats {
    let active: Vec<YearActivity<'_>> = contributor_stats
        .iter()
        .map(|stat| year_activity(stat, window))
        .filter(|activity| activity.commits > 0)
        .collect();

    let mut by_commits = active.clone();
    sort_desc_by_key(&mut by_commits, |activity| activity.commits);
    let mut top_contributors: Vec<TopContributor> = by_commits
        .iter()
        .take(LEADERBOARD_SIZE)
        .map(|activity| TopContributor {
            login: activity.stat.author.login.clone(),
            avatar_url: activity.stat.author.avatar_url.clone(),
            commits: activity.commits,
            additions: activity.additions,
            deletions: activity.deletions,
        })
        .collect();
    if contributor_stats.is_empty() {
        top_contributors = contributors
            .iter()
            .take(LEADERBOARD_SIZE)
            .map(|contributor| TopContributor {
                login: contributor.login.clone(),
                avatar_url: contributor.avatar_url.clone(),
                commits: contributor.contributions,
                additions: 0,
                deletions: 0,
            })
            .collect();
    }

    let mut by_lines = active.clone();
    sort_desc_by_key(&mut by_lines, |activity| activity.lines_changed());
    let top_by_lines_changed = by_lines
        .iter()
        .take(LEADERBOARD_SIZE)
        .map(|activity| LinesLeader {
            login: activity.stat.author.login.clone(),
            avatar_url: activity.stat.author.avatar_url.clone(),
            lines_changed: activity.lines_changed(),
        })
        .collect();

    let mut rising: Vec<(&YearActivity<'_>, DateTime<Utc>, u64)> = active
        .iter()
        .filter_map(|activity| {
            let first = activity.first_contribution.filter(|at| window.contains(*at))?;
            Some((activity, first, activity.commits + activity.lines_changed() / 100))
        })
        .collect();
    sort_desc_by_key(&mut rising, |(_, _, score)| *score);
    let rising_stars: Vec<RisingStar> = rising
        .into_iter()
        .take(SPOTLIGHT_SIZE)
        .map(|(activity, first, score)| RisingStar {
            login: activity.stat.author.login.clone(),
            avatar_url: activity.stat.author.avatar_url.clone(),
            first_contribution_date: first,
            total_contributions: score,
        })
        .collect();

    let mut by_weeks = active.clone();
    sort_desc_by_key(&mut by_weeks, |activity| activity.active_weeks);
    let most_consistent = by_weeks
        .iter()
        .take(SPOTLIGHT_SIZE)
        .map(|activity| ConsistentContributor {
            login: activity.stat.author.login.clone(),
            avatar_url: activity.stat.author.avatar_url.clone(),
            active_weeks: activity.active_weeks,
            total_weeks: WEEKS_PER_YEAR,
        })
        .collect();

    let total = if contributor_stats.is_empty() {
        contributors.len() as u64
    } else {
        active.len() as u64
    };

    ContributorStats {
        total,
        new_this_year: rising_stars.len() as u64,
        top_contributors,
        top_by_prs: top_pr_authors(prs, window),
        top_by_lines_changed,
        top_by_reviews: top_reviewers(reviews),
        rising_stars,
        most_consistent,
    }
}

fn top_pr_authors(prs: &[RawPullRequest], window: &YearWindow) -> Vec<PrAuthor> {
    let mut tally: Tally<PrAuthor> = Tally::default();
    for pr in prs.iter().filter(|pr| window.contains(pr.created_at)) {
        tally
            .entry(&pr.author.login, || PrAuthor {
                login: pr.author.login.clone(),
                avatar_url: pr.author.avatar_url.clone(),
                pr_count: 0,
            })
            .pr_count += 1;
    }
    let mut authors: Vec<PrAuthor> = tally.into_entries().into_iter().map(|(_, a)| a).collect();
    sort_desc_by_key(&mut authors, |author| author.pr_count);
    authors.truncate(LEADERBOARD_SIZE);
    authors
}

fn top_reviewers(reviews: &ReviewMap) -> Vec<ReviewLeader> {
    let mut tally: Tally<ReviewLeader> = Tally::default();
    let counted = reviews
        .values()
        .flatten()
        .filter(|review| review.state != ReviewState::Pending);
    for review in counted {
        let Some(reviewer) = review.reviewer.as_ref() else {
            continue;
        };
        tally
            .entry(&reviewer.login, || ReviewLeader {
                login: reviewer.login.clone(),
                avatar_url: reviewer.avatar_url.clone(),
                review_count: 0,
            })
            .review_count += 1;
    }
    let mut leaders: Vec<ReviewLeader> = tally.into_entries().into_iter().map(|(_, l)| l).collect();
    sort_desc_by_key(&mut leaders, |leader| leader.review_count);
    leaders.truncate(LEADERBOARD_SIZE);
    leaders
}
