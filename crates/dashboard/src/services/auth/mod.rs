//! Authentication service.
//!
//! Email/password login with Argon2id hashes and password reset by emailed
//! one-time token.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::instrument;

use finboard_core::Email;

use crate::db::{PasswordResetRepository, UserRepository};
use crate::models::User;

use super::email::EmailService;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// How long a reset link stays valid.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Random bytes in a reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    resets: PasswordResetRepository<'a>,
    email: Option<&'a EmailService>,
    base_url: &'a str,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// Without an email service, reset requests are recorded but no email
    /// leaves the server.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: Option<&'a EmailService>, base_url: &'a str) -> Self {
        Self {
            users: UserRepository::new(pool),
            resets: PasswordResetRepository::new(pool),
            email,
            base_url,
        }
    }

    /// Login with email and password.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either field is blank.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let found = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = found
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        tracing::info!(user_id = %found.user.id, "User logged in");
        Ok(found.user)
    }

    /// Start a password reset for `email`.
    ///
    /// Succeeds silently for unknown addresses so the form does not reveal
    /// which emails are registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address is malformed.
    /// Returns `AuthError::Repository` or `AuthError::Email` on delivery failure.
    #[instrument(skip(self, email))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;

        let Some(found) = self.users.get_by_email(&email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.resets
            .create(found.user.id, &hash_token(&token), expires_at)
            .await?;

        let link = reset_link(self.base_url, &token);
        match self.email {
            Some(mailer) => {
                mailer
                    .send_password_reset(found.user.email.as_str(), &found.user.name, &link)
                    .await?;
            }
            None => {
                tracing::warn!(
                    user_id = %found.user.id,
                    "SMTP is not configured; password reset email not sent"
                );
            }
        }

        Ok(())
    }

    /// Whether `token` names an unused, unexpired reset.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn reset_token_is_valid(&self, token: &str) -> Result<bool, AuthError> {
        Ok(self
            .resets
            .find_valid(&hash_token(token), Utc::now())
            .await?
            .is_some())
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch`
    /// if the new password is rejected.
    /// Returns `AuthError::InvalidResetToken` if the token is unknown,
    /// expired or already used.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(password, confirm)?;

        let hash = hash_password(password)?;
        let user_id = self
            .resets
            .redeem(&hash_token(token), Utc::now(), &hash)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }
}

/// Check a new password and its confirmation.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
/// Returns `AuthError::PasswordMismatch` if the two entries differ.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), AuthError> {
    validate_password(password)?;
    if password != confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok(())
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match
/// or the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a URL-safe reset token from 32 random bytes.
#[must_use]
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a reset token, as stored in the database.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Absolute reset link for an emailed token.
#[must_use]
pub fn reset_link(base_url: &str, token: &str) -> String {
    format!("{}/auth/reset/{token}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_policy() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
        assert!(matches!(
            validate_new_password("longenough", "longenougH"),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(validate_new_password("longenough", "longenough").is_ok());
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_hash_token_is_stable_hex() {
        let digest = hash_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(digest, hash_token("abc"));
    }

    #[test]
    fn test_reset_link_joins_base_url() {
        assert_eq!(
            reset_link("https://finance.example.com/", "tok"),
            "https://finance.example.com/auth/reset/tok"
        );
    }
}
