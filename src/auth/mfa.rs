//! One-time-code verification: the second leg of the login flow.
//!
//! Path: format gate → user lookup → attempt check → cached-code check →
//! token minted. Exhausting the attempt counter destroys the challenge, so
//! the correct code is useless afterwards and the caller must log in again.

use regex::Regex;
use tracing::instrument;

use crate::store::CoordinationStore;
use crate::users::UserStore;

use super::{
    best_effort_delete, challenge_key, error::AuthError, mfa_attempts_key,
    rate_limit::FailureOutcome, AuthState, UserSummary,
};

#[derive(Debug)]
pub enum MfaOutcome {
    /// Code matched; the session token is ready to hand to the caller.
    Authenticated { token: String, user: UserSummary },
    /// Wrong code, with attempts left in the window.
    Retry { remaining: u64 },
    /// Attempt threshold reached; the challenge has been invalidated.
    Blocked,
    /// No live challenge (expired or never issued); start a fresh login.
    Expired,
    /// The username resolves to nobody. Reported as invalid credentials,
    /// with no attempt counter involved.
    UnknownUser,
    /// Not a 3-digit code. Rejected before any store access.
    Malformed,
}

#[instrument(skip(state, code))]
pub async fn verify(
    state: &AuthState,
    username: &str,
    code: &str,
) -> Result<MfaOutcome, AuthError> {
    let code = code.trim();
    if !valid_code_format(code) {
        return Ok(MfaOutcome::Malformed);
    }

    let Some(user) = state
        .users()
        .find_by_username(username)
        .await
        .map_err(AuthError::dependency)?
    else {
        return Ok(MfaOutcome::UnknownUser);
    };

    let phone = state
        .field_cipher()
        .decrypt(&user.encrypted_phone)
        .map_err(AuthError::confidentiality)?;

    let attempts_key = mfa_attempts_key(user.id);
    if state
        .mfa_limiter()
        .is_blocked(state.store(), &attempts_key)
        .await
        .map_err(AuthError::dependency)?
    {
        return Ok(MfaOutcome::Blocked);
    }

    let challenge = challenge_key(user.id);
    let Some(cached) = state
        .store()
        .get(&challenge)
        .await
        .map_err(AuthError::dependency)?
    else {
        // The challenge aged out; drop any stale counter with it.
        state
            .mfa_limiter()
            .clear(state.store(), &attempts_key)
            .await;

        return Ok(MfaOutcome::Expired);
    };

    // Exact string match: "007" is only matched by "007".
    if cached != code {
        return match state
            .mfa_limiter()
            .record_failure(state.store(), &attempts_key)
            .await
            .map_err(AuthError::dependency)?
        {
            FailureOutcome::Blocked => {
                best_effort_delete(state.store(), &challenge).await;
                state
                    .mfa_limiter()
                    .clear(state.store(), &attempts_key)
                    .await;

                Ok(MfaOutcome::Blocked)
            }
            FailureOutcome::Remaining(remaining) => Ok(MfaOutcome::Retry { remaining }),
        };
    }

    best_effort_delete(state.store(), &challenge).await;
    state
        .mfa_limiter()
        .clear(state.store(), &attempts_key)
        .await;

    let token = state
        .signer()
        .mint(user.id, &user.username, &phone)
        .map_err(AuthError::confidentiality)?;

    Ok(MfaOutcome::Authenticated {
        token,
        user: UserSummary {
            id: user.id.to_string(),
            username: user.username,
            phone,
        },
    })
}

fn valid_code_format(code: &str) -> bool {
    Regex::new(r"^[0-9]{3}$").is_ok_and(|re| re.is_match(code))
}
