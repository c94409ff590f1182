//! Password change for an already-authenticated identity.
//!
//! The caller supplies the authenticated user id; identity is never
//! re-derived here. The old-password check carries no attempt counter.

use tracing::instrument;
use uuid::Uuid;

use crate::crypto::password::{hash_password, verify_password};
use crate::users::UserStore;

use super::{error::AuthError, AuthState};

#[derive(Debug)]
pub enum ChangePasswordOutcome {
    Updated,
    WrongPassword,
    UserMissing,
}

#[instrument(skip(state, old_password, new_password))]
pub async fn change_password(
    state: &AuthState,
    id: Uuid,
    old_password: &str,
    new_password: &str,
) -> Result<ChangePasswordOutcome, AuthError> {
    let Some(stored) = state
        .users()
        .find_password_hash(id)
        .await
        .map_err(AuthError::dependency)?
    else {
        return Ok(ChangePasswordOutcome::UserMissing);
    };

    if !verify_password(old_password, &stored).map_err(AuthError::confidentiality)? {
        return Ok(ChangePasswordOutcome::WrongPassword);
    }

    let new_hash = hash_password(new_password).map_err(AuthError::confidentiality)?;

    if !state
        .users()
        .update_password_hash(id, &new_hash)
        .await
        .map_err(AuthError::dependency)?
    {
        // The user disappeared between the read and the write.
        return Ok(ChangePasswordOutcome::UserMissing);
    }

    Ok(ChangePasswordOutcome::Updated)
}
