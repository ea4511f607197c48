//! REVU Engine - Reviewer Allocation
//!
//! Decides who reviews a pull request and keeps that decision valid as
//! people come and go:
//! - Eligibility filtering of team members
//! - Random candidate selection
//! - Initial assignment, single reassignment and backfill
//! - Cascade reassignment on bulk deactivation
//! - Pull request lifecycle and team directory operations

pub mod eligibility;
pub mod locks;
pub mod selector;

mod allocation;
mod cascade;
mod directory;
mod lifecycle;

pub use allocation::{AllocationEngine, BackfillOutcome, Reassignment};
pub use cascade::BulkDeactivation;
pub use directory::UserReviews;
pub use eligibility::eligible;
pub use lifecycle::CreatedPullRequest;
pub use locks::PullRequestLocks;
pub use selector::{selector_from_config, CandidateSelector, RandomSelector, SeededSelector};
