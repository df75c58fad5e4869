use anyhow::Context;
use constant_time_eq::constant_time_eq;
use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    auth::{
        jwt::JwtKeys,
        password::{burn_password_check, ensure_acceptable, hash_password, verify_password},
    },
    config::EmailConfig,
    db::is_unique_violation,
    email::verification_email,
    error::{AppError, AppResult},
    profiles::repo_types::Profile,
    state::AppState,
    users::repo_types::User,
};

const BAD_CREDENTIALS: &str = "Incorrect email or password.";
const BAD_VERIFICATION: &str = "Invalid verification token";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// 32 random bytes, hex encoded.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn token_expiry(cfg: &EmailConfig, now: OffsetDateTime) -> OffsetDateTime {
    now + TimeDuration::minutes(cfg.token_ttl_minutes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    AlreadyVerified,
    Accept,
    Reject,
}

/// Decides a verify-email attempt for `user`.
pub fn check_verification(user: &User, token: &str, now: OffsetDateTime) -> Verification {
    if user.is_verified {
        Verification::AlreadyVerified
    } else if !constant_time_eq(user.verification_token.as_bytes(), token.as_bytes())
        || user.verification_expires_at < now
    {
        Verification::Reject
    } else {
        Verification::Accept
    }
}

async fn send_verification(st: &AppState, email: &str, token: &str) {
    let message = match verification_email(&st.config.email, email, token) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, "could not build verification email");
            return;
        }
    };
    if let Err(e) = st.mailer.send(message).await {
        warn!(error = %e, %email, "sending verification email failed");
    }
}

/// Creates the user and its profile, then mails the verification link.
pub async fn signup(st: &AppState, email: &str, password: &str) -> AppResult<User> {
    if !is_valid_email(email) {
        warn!(%email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    ensure_acceptable(password)?;

    let hash = hash_password(password)?;
    let token = generate_verification_token();
    let expires_at = token_expiry(&st.config.email, OffsetDateTime::now_utc());

    let mut tx = st.db.begin().await.context("begin tx")?;
    let user = match User::create_tx(&mut tx, email, &hash, &token, expires_at).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict(format!(
                "A user with the email \"{email}\" already exists"
            )));
        }
        Err(e) => return Err(anyhow::Error::from(e).context("create user").into()),
    };
    Profile::create_for_user_tx(&mut tx, user.id, &user.email)
        .await
        .context("create profile")?;
    tx.commit().await.context("commit tx")?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    send_verification(st, &user.email, &token).await;
    Ok(user)
}

/// Returns a signed token for a verified user with the right password.
pub async fn login(st: &AppState, email: &str, password: &str) -> AppResult<String> {
    let Some(user) = User::find_by_email(&st.db, email)
        .await
        .context("find user by email")?
    else {
        warn!(%email, "login unknown email");
        burn_password_check(password);
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    if !user.is_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(AppError::Unverified);
    }

    let token = JwtKeys::from(&st.config.jwt).sign(user.id, &user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn verify_email(st: &AppState, email: &str, token: &str) -> AppResult<()> {
    let user = User::find_by_email(&st.db, email)
        .await
        .context("find user by email")?
        .ok_or_else(|| AppError::bad_request(BAD_VERIFICATION))?;

    match check_verification(&user, token, OffsetDateTime::now_utc()) {
        Verification::AlreadyVerified => Ok(()),
        Verification::Reject => {
            warn!(user_id = %user.id, "rejected verification token");
            Err(AppError::bad_request(BAD_VERIFICATION))
        }
        Verification::Accept => {
            let mut tx = st.db.begin().await.context("begin tx")?;
            User::mark_verified_tx(&mut tx, user.id)
                .await
                .context("mark user verified")?;
            Profile::mark_email_verified_tx(&mut tx, user.id)
                .await
                .context("mark profile verified")?;
            tx.commit().await.context("commit tx")?;
            info!(user_id = %user.id, "email verified");
            Ok(())
        }
    }
}

/// Rotates the token of an unverified user and mails it again.
/// Unknown or verified addresses are a silent no-op.
pub async fn resend_verification(st: &AppState, email: &str) -> AppResult<()> {
    let Some(user) = User::find_by_email(&st.db, email)
        .await
        .context("find user by email")?
    else {
        return Ok(());
    };
    if user.is_verified {
        return Ok(());
    }

    let token = generate_verification_token();
    let expires_at = token_expiry(&st.config.email, OffsetDateTime::now_utc());
    User::set_verification_token(&st.db, user.id, &token, expires_at)
        .await
        .context("rotate verification token")?;
    send_verification(st, &user.email, &token).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(verified: bool, token: &str, expires_at: OffsetDateTime) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: String::new(),
            is_verified: verified,
            verification_token: token.into(),
            verification_expires_at: expires_at,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn tokens_are_random_hex() {
        let a = generate_verification_token();
        let b = generate_verification_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn verification_accepts_matching_unexpired_token() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, "tok", now + TimeDuration::hours(1));
        assert_eq!(check_verification(&u, "tok", now), Verification::Accept);
    }

    #[test]
    fn verification_rejects_mismatch_and_expiry() {
        let now = OffsetDateTime::now_utc();
        let fresh = user(false, "tok", now + TimeDuration::hours(1));
        assert_eq!(check_verification(&fresh, "other", now), Verification::Reject);

        let stale = user(false, "tok", now - TimeDuration::minutes(1));
        assert_eq!(check_verification(&stale, "tok", now), Verification::Reject);
    }

    #[test]
    fn verification_rejects_token_prefixes() {
        let now = OffsetDateTime::now_utc();
        let u = user(false, "cafebabe", now + TimeDuration::hours(1));
        assert_eq!(check_verification(&u, "cafe", now), Verification::Reject);
        assert_eq!(check_verification(&u, "cafebabe00", now), Verification::Reject);
        assert_eq!(check_verification(&u, "", now), Verification::Reject);
    }

    #[test]
    fn verification_is_idempotent_once_verified() {
        let now = OffsetDateTime::now_utc();
        let u = user(true, "tok", now - TimeDuration::days(3));
        assert_eq!(check_verification(&u, "anything", now), Verification::AlreadyVerified);
    }

    #[tokio::test]
    async fn verification_mail_carries_the_token() {
        use std::sync::Arc;

        use crate::email::test_support::RecordingMailer;

        let fake = AppState::fake();
        let mailer = Arc::new(RecordingMailer::default());
        let st = AppState::from_parts(fake.db, fake.config, fake.storage, mailer.clone());

        send_verification(&st, "finder@example.com", "cafebabe").await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "finder@example.com");
        assert!(sent[0].text.contains("token=cafebabe"));
        assert!(sent[0].text.contains("email=finder%40example.com"));
    }

    #[test]
    fn expiry_uses_configured_ttl() {
        let cfg = EmailConfig {
            public_url: "http://localhost".into(),
            from: "x@y.z".into(),
            token_ttl_minutes: 360,
        };
        let now = OffsetDateTime::now_utc();
        assert_eq!(token_expiry(&cfg, now) - now, TimeDuration::hours(6));
    }
}
