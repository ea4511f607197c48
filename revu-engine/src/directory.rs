//! Teams, users, review listings and statistics.

use crate::AllocationEngine;
use revu_core::{
    AllocationError, AssignmentStats, PullRequestShort, RevuResult, Team, TeamMember,
    TeamWithMembers, User, ValidationError,
};

/// Open pull requests a user is reviewing, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

impl AllocationEngine {
    /// Create a team and upsert its members into it.
    ///
    /// Members that already exist are moved to the new team. A failure part
    /// way through leaves the team and the members written so far.
    pub async fn create_team(
        &self,
        team_name: &str,
        members: Vec<TeamMember>,
    ) -> RevuResult<TeamWithMembers> {
        if team_name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "team_name".to_string(),
            }
            .into());
        }
        if self.store.team_exists(team_name).await? {
            return Err(AllocationError::TeamExists {
                team_name: team_name.to_string(),
            }
            .into());
        }

        self.store.team_insert(&Team::new(team_name)).await?;
        let count = members.len();
        for member in members {
            self.store.user_upsert(&member.into_user(team_name)).await?;
        }
        tracing::info!(team = team_name, members = count, "Created team");

        self.get_team(team_name).await
    }

    /// A team with its members ordered by username.
    pub async fn get_team(&self, team_name: &str) -> RevuResult<TeamWithMembers> {
        let team = self
            .store
            .team_get(team_name)
            .await?
            .ok_or_else(|| AllocationError::TeamNotFound {
                team_name: team_name.to_string(),
            })?;
        let members = self
            .store
            .user_list_by_team(&team.team_name)
            .await?
            .iter()
            .map(TeamMember::from)
            .collect();
        Ok(TeamWithMembers {
            team_name: team.team_name,
            members,
        })
    }

    /// Toggle a user's active flag. Existing assignments are not touched.
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> RevuResult<User> {
        let user = self
            .store
            .user_set_active(user_id, is_active)
            .await?
            .ok_or_else(|| AllocationError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        tracing::info!(user_id, is_active, "Updated user activity");
        Ok(user)
    }

    pub async fn reviews_for(&self, user_id: &str) -> RevuResult<UserReviews> {
        if self.store.user_get(user_id).await?.is_none() {
            return Err(AllocationError::UserNotFound {
                user_id: user_id.to_string(),
            }
            .into());
        }
        let pull_requests = self
            .store
            .pull_request_list_open_for_reviewer(user_id)
            .await?
            .iter()
            .map(PullRequestShort::from)
            .collect();
        Ok(UserReviews {
            user_id: user_id.to_string(),
            pull_requests,
        })
    }

    pub async fn stats(&self) -> RevuResult<AssignmentStats> {
        self.store.assignment_stats().await
    }
}
