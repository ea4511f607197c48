//! Eligibility filter.

use revu_core::{RevuResult, User};
use revu_storage::RecordStore;

/// Team members usable as reviewer candidates.
///
/// Keeps active members of `team_name` whose ID is not in `exclude`, in
/// username order. An empty team name yields an empty pool rather than an
/// error.
pub async fn eligible(
    store: &dyn RecordStore,
    team_name: &str,
    exclude: &[&str],
) -> RevuResult<Vec<User>> {
    if team_name.is_empty() {
        return Ok(Vec::new());
    }

    let members = store.user_list_by_team(team_name).await?;
    let mut pool = Vec::with_capacity(members.len());
    for member in members {
        if !member.is_active {
            tracing::debug!(user_id = %member.user_id, team = team_name, "Excluded candidate: inactive");
        } else if exclude.contains(&member.user_id.as_str()) {
            tracing::debug!(user_id = %member.user_id, team = team_name, "Excluded candidate: excluded");
        } else {
            pool.push(member);
        }
    }
    Ok(pool)
}
