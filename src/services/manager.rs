// src/services/manager.rs
//
// Manager delegation: an owner invites a manager by email, the invite
// carries a random token shared out-of-band, and the manager account that
// presents the token gets accepted rights over the space.

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ManagerRepository, SpaceRepository},
    models::{
        auth::{User, UserRole},
        manager::{InviteStatus, ManagerInvite, SpaceManager},
    },
};

const INVITE_TOKEN_LEN: usize = 32;

#[derive(Clone)]
pub struct ManagerService {
    manager_repo: ManagerRepository,
    space_repo: SpaceRepository,
}

impl ManagerService {
    pub fn new(manager_repo: ManagerRepository, space_repo: SpaceRepository) -> Self {
        Self { manager_repo, space_repo }
    }

    // Only the owner of the space can invite managers for it.
    pub async fn invite(
        &self,
        owner: &User,
        space_id: Uuid,
        invite_email: &str,
    ) -> Result<ManagerInvite, AppError> {
        let space = self
            .space_repo
            .find_by_id(space_id)
            .await?
            .ok_or(AppError::NotFound("Parking space".into()))?;
        if space.owner_id != owner.id {
            return Err(AppError::Forbidden(
                "Only the space owner can invite managers".into(),
            ));
        }

        let token = generate_invite_token();
        let row = self
            .manager_repo
            .insert_invite(space_id, owner.id, invite_email, &token)
            .await?;

        // The token is returned exactly once, in the creation response.
        Ok(ManagerInvite {
            id: row.id,
            space_id: row.space_id,
            invite_email: row.invite_email,
            invite_token: token,
            invite_status: row.invite_status,
            assigned_at: row.assigned_at,
        })
    }

    pub async fn accept(&self, user: &User, token: &str) -> Result<SpaceManager, AppError> {
        if user.role != UserRole::Manager {
            return Err(AppError::Forbidden(
                "Only manager accounts can accept invites".into(),
            ));
        }

        let invite = self
            .manager_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::NotFound("Invite".into()))?;
        if invite.invite_status != InviteStatus::Pending {
            return Err(AppError::InvalidState("Invite was already accepted".into()));
        }

        self.manager_repo.accept_invite(invite.id, user.id).await
    }

    pub async fn list_for_space(
        &self,
        user: &User,
        space_id: Uuid,
    ) -> Result<Vec<SpaceManager>, AppError> {
        let space = self
            .space_repo
            .find_by_id(space_id)
            .await?
            .ok_or(AppError::NotFound("Parking space".into()))?;
        if space.owner_id != user.id {
            return Err(AppError::Forbidden(
                "Only the space owner can list managers".into(),
            ));
        }
        self.manager_repo.list_by_space(space_id).await
    }
}

fn generate_invite_token() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(INVITE_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_token_is_32_alphanumeric_chars() {
        let token = generate_invite_token();
        assert_eq!(token.len(), INVITE_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn invite_tokens_do_not_repeat() {
        assert_ne!(generate_invite_token(), generate_invite_token());
    }
}
