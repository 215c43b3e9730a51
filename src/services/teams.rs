//! Team and user management.
//!
//! Adding a team upserts its members: a user that already exists is moved into
//! the new team, since a member belongs to exactly one team at a time.

use crate::db::pool::DbPool;
use crate::db::{teams, users};
use crate::error::AppError;
use crate::models::{PullRequestShort, Team, User};

#[derive(Clone)]
pub struct TeamService {
    pool: DbPool,
}

impl TeamService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a team and upsert its members in one transaction.
    pub async fn add_team(&self, team: Team) -> Result<Team, AppError> {
        if team.name.trim().is_empty() {
            return Err(AppError::invalid_input_field(
                "team name is required",
                "team_name",
            ));
        }
        if team.members.iter().any(|m| m.id.trim().is_empty()) {
            return Err(AppError::invalid_input_field(
                "every member needs a user id",
                "members",
            ));
        }

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        if teams::team_exists(&mut *tx, &team.name).await? {
            log::debug!("[team] {} already exists", team.name);
            return Err(AppError::already_exists("Team", &team.name));
        }

        teams::insert_team(&mut *tx, &team.name).await?;
        for member in &team.members {
            users::upsert_user(
                &mut *tx,
                &User {
                    id: member.id.clone(),
                    username: member.username.clone(),
                    team_name: team.name.clone(),
                    is_active: member.is_active,
                },
            )
            .await
            .inspect_err(|e| log::error!("[team] Failed to save member {}: {}", member.id, e))?;
        }

        let members = teams::list_members(&mut *tx, &team.name).await?;
        tx.commit().await?;

        log::info!("[team] Created {} with {} member(s)", team.name, members.len());
        Ok(Team {
            name: team.name,
            members,
        })
    }

    pub async fn get_team(&self, name: &str) -> Result<Team, AppError> {
        if !teams::team_exists(&self.pool, name).await? {
            return Err(AppError::not_found_with_id("Team", name));
        }

        let members = teams::list_members(&self.pool, name).await?;
        Ok(Team {
            name: name.to_string(),
            members,
        })
    }

    /// Flip a user's active flag. Inactive users are never picked as reviewers.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        let user = users::set_is_active(&self.pool, user_id, is_active)
            .await?
            .ok_or_else(|| AppError::not_found_with_id("User", user_id))?;

        log::info!("[team] {} is_active = {}", user.id, user.is_active);
        Ok(user)
    }

    /// Pull requests the user currently reviews.
    pub async fn review_queue(&self, user_id: &str) -> Result<Vec<PullRequestShort>, AppError> {
        if !users::user_exists(&self.pool, user_id).await? {
            return Err(AppError::not_found_with_id("User", user_id));
        }

        Ok(users::review_queue(&self.pool, user_id).await?)
    }
}
