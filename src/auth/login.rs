//! Credential verification: the first leg of the login flow.
//!
//! Path: rate check → user lookup → phone decrypt → password verify →
//! challenge staged + SMS sent. Unknown-username and wrong-password
//! rejections run through the same counter and produce the same shape, so a
//! caller cannot probe which usernames exist.

use rand::Rng;
use tracing::{error, instrument};

use crate::sms::SmsSender;
use crate::store::CoordinationStore;
use crate::users::UserStore;

use super::{
    challenge_key, error::AuthError, login_attempts_key, rate_limit::FailureOutcome, AuthState,
    UserSummary,
};

#[derive(Debug)]
pub enum LoginOutcome {
    /// Password verified; a one-time code is on its way by SMS. The code
    /// itself is never part of the outcome.
    ChallengeIssued { user: UserSummary },
    /// Wrong password or unknown username, with attempts left in the window.
    Rejected { remaining: u64 },
    /// Attempt threshold reached; wait out the window.
    Blocked,
}

#[instrument(skip(state, password))]
pub async fn login(
    state: &AuthState,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, AuthError> {
    let attempts_key = login_attempts_key(username);

    // Blocked callers are turned away before the user store is touched and
    // without consuming a further attempt.
    if state
        .login_limiter()
        .is_blocked(state.store(), &attempts_key)
        .await
        .map_err(AuthError::dependency)?
    {
        return Ok(LoginOutcome::Blocked);
    }

    let Some(user) = state
        .users()
        .find_by_username(username)
        .await
        .map_err(AuthError::dependency)?
    else {
        return record_rejection(state, &attempts_key).await;
    };

    let phone = state
        .field_cipher()
        .decrypt(&user.encrypted_phone)
        .map_err(AuthError::confidentiality)?;

    let valid = crate::crypto::password::verify_password(password, &user.password_hash)
        .map_err(AuthError::confidentiality)?;
    if !valid {
        return record_rejection(state, &attempts_key).await;
    }

    state
        .login_limiter()
        .clear(state.store(), &attempts_key)
        .await;

    let code = generate_code();
    let challenge = challenge_key(user.id);
    state
        .store()
        .set_with_expiry(&challenge, &code, state.config().challenge_ttl())
        .await
        .map_err(AuthError::dependency)?;

    let body = format!("Your verification code is {code}. It expires in 2 minutes.");
    if let Err(err) = state.sms().send(&phone, &body).await {
        // Never leave a challenge live that the user cannot receive the
        // code for; the caller must restart the login.
        if let Err(cleanup_err) = state.store().delete(&challenge).await {
            error!("failed to roll back mfa challenge: {cleanup_err:#}");
        }

        return Err(AuthError::Delivery(err));
    }

    Ok(LoginOutcome::ChallengeIssued {
        user: UserSummary {
            id: user.id.to_string(),
            username: user.username,
            phone,
        },
    })
}

/// Shared rejection path for unknown-username and wrong-password.
async fn record_rejection(
    state: &AuthState,
    attempts_key: &str,
) -> Result<LoginOutcome, AuthError> {
    match state
        .login_limiter()
        .record_failure(state.store(), attempts_key)
        .await
        .map_err(AuthError::dependency)?
    {
        FailureOutcome::Blocked => Ok(LoginOutcome::Blocked),
        FailureOutcome::Remaining(remaining) => Ok(LoginOutcome::Rejected { remaining }),
    }
}

/// Three decimal digits with leading zeros preserved; "000" is never issued.
fn generate_code() -> String {
    let mut rng = rand::thread_rng();

    format!("{:03}", rng.gen_range(1..=999))
}
