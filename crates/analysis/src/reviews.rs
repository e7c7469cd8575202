use normalizer::{Identity, RawPullRequest, RawReview, ReviewMap, ReviewState};
use serde::Serialize;

use crate::rank::{first_max_by, first_min_by, hours, mean, sort_desc_by_key, Tally};

const TOP_REVIEWERS: usize = 10;
const TOP_PAIRS: usize = 10;
const THOROUGH_REVIEWERS: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerSummary {
    pub login: String,
    pub avatar_url: String,
    pub review_count: u64,
    pub avg_response_time_hours: f64,
}

/// Review comment counts are not fetched, so the comment fields stay zero.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThoroughReviewer {
    pub login: String,
    pub avatar_url: String,
    pub avg_comments_per_review: f64,
    pub total_comments: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerPair {
    pub author: String,
    pub author_avatar: String,
    pub reviewer: String,
    pub reviewer_avatar: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_reviews: u64,
    pub avg_time_to_first_review_hours: f64,
    pub avg_time_to_merge_after_approval_hours: f64,
    /// Percentage of reviewed PRs whose first review was an approval.
    pub approval_rate: f64,
    pub top_reviewers: Vec<ReviewerSummary>,
    pub most_thorough_reviewers: Vec<ThoroughReviewer>,
    pub top_reviewer_pairs: Vec<ReviewerPair>,
}

struct ReviewerAccumulator {
    avatar_url: String,
    review_count: u64,
    total_response_hours: f64,
}

/// Submitted reviews for one PR; drafts never count.
pub(crate) fn submitted_reviews<'a>(
    reviews: &'a ReviewMap,
    pr: &RawPullRequest,
) -> Vec<&'a RawReview> {
    reviews
        .get(&pr.number)
        .map(|list| {
            list.iter()
                .filter(|review| review.state != ReviewState::Pending)
                .collect()
        })
        .unwrap_or_default()
}

pub fn review_stats(prs: &[RawPullRequest], reviews: &ReviewMap) -> ReviewStats {
    let mut total_reviews = 0u64;
    let mut reviewers: Tally<ReviewerAccumulator> = Tally::default();
    let mut pairs: Tally<ReviewerPair> = Tally::default();

    let mut first_review_hours = 0.0;
    let mut reviewed_prs = 0usize;
    let mut first_review_approvals = 0usize;
    let mut approval_to_merge_hours = 0.0;
    let mut approved_and_merged = 0usize;

    for pr in prs {
        let submitted = submitted_reviews(reviews, pr);

        for review in &submitted {
            let Some(reviewer) = review.reviewer.as_ref() else {
                continue;
            };
            total_reviews += 1;

            let entry = reviewers.entry(&reviewer.login, || ReviewerAccumulator {
                avatar_url: reviewer.avatar_url.clone(),
                review_count: 0,
                total_response_hours: 0.0,
            });
            entry.review_count += 1;
            entry.total_response_hours += hours(review.submitted_at - pr.created_at);

            let pair_key = format!("{}:{}", pr.author.login, reviewer.login);
            pairs.entry(&pair_key, || new_pair(&pr.author, reviewer)).count += 1;
        }

        // Chronologically first review; equal timestamps keep listing order.
        if let Some(first) = first_min_by(submitted.iter(), |review| review.submitted_at) {
            reviewed_prs += 1;
            first_review_hours += hours(first.submitted_at - pr.created_at);
            if first.state == ReviewState::Approved {
                first_review_approvals += 1;
            }
        }

        if let Some(merged_at) = pr.merged_at {
            let last_approval = first_max_by(
                submitted
                    .iter()
                    .filter(|review| review.state == ReviewState::Approved),
                |review| review.submitted_at,
            );
            if let Some(approval) = last_approval {
                if merged_at > approval.submitted_at {
                    approval_to_merge_hours += hours(merged_at - approval.submitted_at);
                    approved_and_merged += 1;
                }
            }
        }
    }

    let mut top_reviewers: Vec<ReviewerSummary> = reviewers
        .into_entries()
        .into_iter()
        .map(|(login, acc)| ReviewerSummary {
            login,
            avatar_url: acc.avatar_url,
            review_count: acc.review_count,
            avg_response_time_hours: mean(acc.total_response_hours, acc.review_count as usize),
        })
        .collect();
    sort_desc_by_key(&mut top_reviewers, |reviewer| reviewer.review_count);
    top_reviewers.truncate(TOP_REVIEWERS);

    let most_thorough_reviewers = top_reviewers
        .iter()
        .take(THOROUGH_REVIEWERS)
        .map(|reviewer| ThoroughReviewer {
            login: reviewer.login.clone(),
            avatar_url: reviewer.avatar_url.clone(),
            avg_comments_per_review: 0.0,
            total_comments: 0,
        })
        .collect();

    let mut top_reviewer_pairs: Vec<ReviewerPair> = pairs
        .into_entries()
        .into_iter()
        .map(|(_, pair)| pair)
        .collect();
    sort_desc_by_key(&mut top_reviewer_pairs, |pair| pair.count);
    top_reviewer_pairs.truncate(TOP_PAIRS);

    let approval_rate = if reviewed_prs > 0 {
        first_review_approvals as f64 / reviewed_prs as f64 * 100.0
    } else {
        0.0
    };

    ReviewStats {
        total_reviews,
        avg_time_to_first_review_hours: mean(first_review_hours, reviewed_prs),
        avg_time_to_merge_after_approval_hours: mean(approval_to_merge_hours, approved_and_merged),
        approval_rate,
        top_reviewers,
        most_thorough_reviewers,
        top_reviewer_pairs,
    }
}

fn new_pair(author: &Identity, reviewer: &Identity) -> ReviewerPair {
    ReviewerPair {
        author: author.login.clone(),
        author_avatar: author.avatar_url.clone(),
        reviewer: reviewer.login.clone(),
        reviewer_avatar: reviewer.avatar_url.clone(),
        count: 0,
    }
}
