pub mod activity;
pub mod calendar;
pub mod code_changes;
pub mod commits;
pub mod community;
pub mod contributors;
pub mod issues;
pub mod personality;
pub mod pull_requests;
mod rank;
pub mod reviews;
pub mod velocity;
pub mod window;
pub mod wrapped;

pub use activity::{activity_stats, ActivityStats};
pub use code_changes::{code_change_stats, CodeChangeStats};
pub use commits::{commit_stats, CommitStats};
pub use community::{community_stats, CommunityStats};
pub use contributors::{contributor_stats, ContributorStats};
pub use issues::{issue_stats, IssueStats};
pub use personality::{
    classify, winner, Archetype, Personality, PersonalitySignals, RuleOutcome,
};
pub use pull_requests::{pull_request_stats, PullRequestStats};
pub use reviews::{review_stats, ReviewStats};
pub use velocity::{velocity_stats, Trend, VelocityStats};
pub use window::{WindowError, YearWindow};
pub use wrapped::{assemble_wrapped, RepoSummary, WrappedInputs, WrappedResult};
