use serde::Serialize;

use crate::contributors::ContributorStats;
use crate::pull_requests::PullRequestStats;
use crate::rank::first_max_by;
use crate::reviews::ReviewStats;
use crate::velocity::{Trend, VelocityStats};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleOutcome {
    pub score: u32,
    pub reasons: Vec<&'static str>,
}

impl RuleOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, delta: u32, reason: &'static str) {
        self.score += delta;
        self.reasons.push(reason);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Archetype {
    Rocket,
    Institution,
    Laboratory,
    Collaborative,
    SpeedDemon,
    Careful,
}

impl Archetype {
    /// Evaluation order; earlier archetypes win ties.
    pub const ALL: [Archetype; 6] = [
        Archetype::Rocket,
        Archetype::Institution,
        Archetype::Laboratory,
        Archetype::Collaborative,
        Archetype::SpeedDemon,
        Archetype::Careful,
    ];

    pub fn evaluate(self, signals: &PersonalitySignals<'_>) -> RuleOutcome {
        match self {
            Archetype::Rocket => rocket(signals),
            Archetype::Institution => institution(signals),
            Archetype::Laboratory => laboratory(signals),
            Archetype::Collaborative => collaborative(signals),
            Archetype::SpeedDemon => speed_demon(signals),
            Archetype::Careful => careful(signals),
        }
    }

    pub fn profile(self) -> &'static Profile {
        match self {
            Archetype::Rocket => &ROCKET,
            Archetype::Institution => &INSTITUTION,
            Archetype::Laboratory => &LABORATORY,
            Archetype::Collaborative => &COLLABORATIVE,
            Archetype::SpeedDemon => &SPEED_DEMON,
            Archetype::Careful => &CAREFUL,
        }
    }
}

#[derive(Debug)]
pub struct Profile {
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
    pub traits: [&'static str; 3],
}

static ROCKET: Profile = Profile {
    title: "The Rocket",
    emoji: "🚀",
    description: "High velocity, growing fast! This repo is on fire with rapid development.",
    traits: ["Fast-growing", "High PR volume", "Expanding team"],
};

static INSTITUTION: Profile = Profile {
    title: "The Institution",
    emoji: "🏛️",
    description: "Steady and reliable. This repo delivers consistent, quality output.",
    traits: ["Consistent output", "High merge rate", "Stable contributors"],
};

static LABORATORY: Profile = Profile {
    title: "The Laboratory",
    emoji: "🔬",
    description: "Experimental and explorative. Many small PRs testing new ideas.",
    traits: ["Many small PRs", "Experimental", "Iterative development"],
};

static COLLABORATIVE: Profile = Profile {
    title: "The Hive Mind",
    emoji: "🤝",
    description: "Highly collaborative with strong review culture.",
    traits: ["High review engagement", "Strong pairs", "Team-focused"],
};

static SPEED_DEMON: Profile = Profile {
    title: "The Speed Demon",
    emoji: "⚡",
    description: "Lightning fast merge times. No PR waits long here!",
    traits: ["Fast merges", "Quick reviews", "Rapid iteration"],
};

static CAREFUL: Profile = Profile {
    title: "The Craftsman",
    emoji: "🐢",
    description: "Slow and steady wins the race. Thorough reviews, quality code.",
    traits: ["Thorough reviews", "Quality-focused", "Small PRs"],
};

/// Aggregates the archetype rules read from.
#[derive(Debug, Clone, Copy)]
pub struct PersonalitySignals<'a> {
    pub pull_requests: &'a PullRequestStats,
    pub reviews: &'a ReviewStats,
    pub velocity: &'a VelocityStats,
    pub contributors: &'a ContributorStats,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Personality {
    #[serde(rename = "type")]
    pub archetype: Archetype,
    pub title: String,
    pub emoji: String,
    pub description: String,
    pub traits: Vec<String>,
}

impl From<Archetype> for Personality {
    fn from(archetype: Archetype) -> Self {
        let profile = archetype.profile();
        Self {
            archetype,
            title: profile.title.to_string(),
            emoji: profile.emoji.to_string(),
            description: profile.description.to_string(),
            traits: profile.traits.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Every archetype's outcome, in evaluation order.
pub fn score_all(signals: &PersonalitySignals<'_>) -> Vec<(Archetype, RuleOutcome)> {
    Archetype::ALL
        .iter()
        .map(|archetype| (*archetype, archetype.evaluate(signals)))
        .collect()
}

/// Highest scoring archetype with the rules that fired for it.
pub fn winner(signals: &PersonalitySignals<'_>) -> (Archetype, RuleOutcome) {
    first_max_by(score_all(signals), |(_, outcome)| outcome.score)
        .unwrap_or((Archetype::ALL[0], RuleOutcome::new()))
}

pub fn classify(signals: &PersonalitySignals<'_>) -> Personality {
    Personality::from(winner(signals).0)
}

fn rocket(s: &PersonalitySignals<'_>) -> RuleOutcome {
    let mut outcome = RuleOutcome::new();
    if s.velocity.trend == Trend::Increasing {
        outcome.push(30, "trend_increasing");
    }
    let opened = s.pull_requests.opened;
    if opened > 50 {
        outcome.push(20, "pr_volume_high");
    } else if opened > 20 {
        outcome.push(10, "pr_volume_moderate");
    }
    let newcomers = s.contributors.new_this_year;
    if newcomers > 3 {
        outcome.push(20, "many_newcomers");
    } else if newcomers > 0 {
        outcome.push(10, "some_newcomers");
    }
    outcome
}

fn institution(s: &PersonalitySignals<'_>) -> RuleOutcome {
    let mut outcome = RuleOutcome::new();
    if s.velocity.trend == Trend::Stable {
        outcome.push(30, "trend_stable");
    }
    let steady = s
        .contributors
        .most_consistent
        .first()
        .is_some_and(|top| top.active_weeks > 40);
    if steady {
        outcome.push(30, "year_round_contributor");
    } else {
        outcome.push(10, "baseline_consistency");
    }
    let prs = s.pull_requests;
    if prs.opened > 0 && prs.merged as f64 / prs.opened as f64 > 0.8 {
        outcome.push(20, "high_merge_rate");
    }
    outcome
}

fn laboratory(s: &PersonalitySignals<'_>) -> RuleOutcome {
    let mut outcome = RuleOutcome::new();
    let prs = s.pull_requests;
    let sizes = &prs.size_distribution;
    if (sizes.tiny + sizes.small) as f64 > prs.opened as f64 * 0.5 {
        outcome.push(30, "mostly_small_prs");
    }
    if prs.opened as f64 > prs.merged as f64 * 1.5 {
        outcome.push(20, "many_unmerged");
    }
    if prs.most_revised_pr.as_ref().is_some_and(|pr| pr.commits > 10) {
        outcome.push(20, "heavy_revision");
    }
    outcome
}

fn collaborative(s: &PersonalitySignals<'_>) -> RuleOutcome {
    let mut outcome = RuleOutcome::new();
    let opened = s.pull_requests.opened;
    let total_reviews = s.reviews.total_reviews;
    if total_reviews > opened * 2 {
        outcome.push(30, "reviews_double_prs");
    } else if total_reviews > opened {
        outcome.push(15, "reviews_exceed_prs");
    }
    let pairs = s.reviews.top_reviewer_pairs.len();
    if pairs > 5 {
        outcome.push(20, "many_review_pairs");
    } else if pairs > 2 {
        outcome.push(10, "some_review_pairs");
    }
    if s.reviews.top_reviewers.len() > 5 {
        outcome.push(20, "broad_reviewer_pool");
    }
    outcome
}

fn speed_demon(s: &PersonalitySignals<'_>) -> RuleOutcome {
    let mut outcome = RuleOutcome::new();
    let merge_hours = s.pull_requests.average_merge_time_hours;
    if merge_hours < 24.0 {
        outcome.push(40, "merges_within_day");
    } else if merge_hours < 48.0 {
        outcome.push(20, "merges_within_two_days");
    }
    let quick_fastest = s
        .pull_requests
        .fastest_merge
        .as_ref()
        .is_some_and(|fastest| fastest.merge_time_minutes < 60);
    if quick_fastest {
        outcome.push(20, "sub_hour_merge");
    }
    let first_review = s.reviews.avg_time_to_first_review_hours;
    if first_review < 4.0 {
        outcome.push(20, "first_review_within_4h");
    } else if first_review < 12.0 {
        outcome.push(10, "first_review_within_12h");
    }
    outcome
}

fn careful(s: &PersonalitySignals<'_>) -> RuleOutcome {
    let mut outcome = RuleOutcome::new();
    let prs = s.pull_requests;
    if prs.average_merge_time_hours > 72.0 {
        outcome.push(20, "slow_merges");
    }
    if s.reviews.approval_rate < 50.0 {
        outcome.push(30, "low_first_approval_rate");
    }
    if prs.most_commented_pr.as_ref().is_some_and(|pr| pr.comments > 20) {
        outcome.push(20, "long_discussions");
    }
    let sizes = &prs.size_distribution;
    if ((sizes.large + sizes.huge) as f64) < prs.opened as f64 * 0.1 {
        outcome.push(20, "few_large_prs");
    }
    outcome
}
