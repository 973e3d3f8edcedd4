//! Login, logout and password reset handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{Flash, take_flash};
use crate::error::clear_sentry_user;
use crate::filters;
use crate::i18n::MessageKey;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

use super::redirect_with;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotForm {
    #[serde(default)]
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub flash: Option<Flash>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot.html")]
pub struct ForgotTemplate {
    pub flash: Option<Flash>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub flash: Option<Flash>,
    pub token: String,
    pub token_valid: bool,
    pub min_length: usize,
}

/// Translated message for an auth failure.
#[must_use]
pub const fn auth_message(err: &AuthError) -> MessageKey {
    match err {
        AuthError::MissingFields => MessageKey::RequiredFieldsEmpty,
        AuthError::InvalidEmail(_) => MessageKey::InvalidEmail,
        AuthError::InvalidCredentials => MessageKey::InvalidCredentials,
        AuthError::WeakPassword(_) => MessageKey::PasswordTooShort,
        AuthError::PasswordMismatch => MessageKey::PasswordsDoNotMatch,
        AuthError::InvalidResetToken => MessageKey::PasswordResetInvalid,
        AuthError::Repository(_) | AuthError::Email(_) | AuthError::PasswordHash => {
            MessageKey::ServerError
        }
    }
}

fn log_auth_failure(err: &AuthError, action: &str) {
    match err {
        AuthError::Repository(_) | AuthError::Email(_) | AuthError::PasswordHash => {
            tracing::error!(error = %err, action, "Auth request failed");
        }
        _ => tracing::info!(error = %err, action, "Auth request rejected"),
    }
}

/// Display the login page, or send signed-in users to their dashboard.
#[instrument(skip_all)]
pub async fn login_page(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if let Some(user) = user {
        return Redirect::to(user.roles.home_path()).into_response();
    }

    LoginTemplate {
        flash: take_flash(&session).await,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let auth = AuthService::new(state.pool(), state.email(), &state.config().base_url);

    let user = match auth.login(&form.email, &form.password).await {
        Ok(user) => user,
        Err(e) => {
            log_auth_failure(&e, "login");
            return redirect_with(&session, "/", Flash::error(state.t(auth_message(&e)))).await;
        }
    };

    // Rotate the session ID to prevent fixation
    if let Err(e) = session.cycle_id().await {
        tracing::error!(error = %e, "Failed to rotate session ID");
        return redirect_with(&session, "/", Flash::error(state.t(MessageKey::ServerError))).await;
    }

    let current = CurrentUser::from(&user);
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "Failed to store session user");
        return redirect_with(&session, "/", Flash::error(state.t(MessageKey::ServerError))).await;
    }

    Redirect::to(current.roles.home_path())
}

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    redirect_with(&session, "/", Flash::info(state.t(MessageKey::LoggedOut))).await
}

/// Display the forgot password form.
#[instrument(skip_all)]
pub async fn forgot_page(session: Session) -> ForgotTemplate {
    ForgotTemplate {
        flash: take_flash(&session).await,
    }
}

/// Send a password reset link.
///
/// The response is the same whether or not the email is registered.
#[instrument(skip_all)]
pub async fn forgot(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ForgotForm>,
) -> Redirect {
    if form.email.trim().is_empty() {
        return redirect_with(
            &session,
            "/auth/forgot",
            Flash::error(state.t(MessageKey::RequiredFieldsEmpty)),
        )
        .await;
    }

    let auth = AuthService::new(state.pool(), state.email(), &state.config().base_url);
    match auth.request_password_reset(&form.email).await {
        Ok(()) => {
            redirect_with(
                &session,
                "/",
                Flash::info(state.t(MessageKey::PasswordResetSent)),
            )
            .await
        }
        Err(e) => {
            log_auth_failure(&e, "forgot");
            redirect_with(&session, "/auth/forgot", Flash::error(state.t(auth_message(&e)))).await
        }
    }
}

/// Display the reset password form.
#[instrument(skip_all)]
pub async fn reset_page(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> ResetTemplate {
    let auth = AuthService::new(state.pool(), state.email(), &state.config().base_url);
    let token_valid = auth.reset_token_is_valid(&token).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to check reset token");
        false
    });

    let mut flash = take_flash(&session).await;
    if !token_valid && flash.is_none() {
        flash = Some(Flash::error(state.t(MessageKey::PasswordResetInvalid)));
    }

    ResetTemplate {
        flash,
        token,
        token_valid,
        min_length: crate::services::auth::MIN_PASSWORD_LENGTH,
    }
}

/// Set a new password from a reset link.
#[instrument(skip_all)]
pub async fn reset(
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<ResetForm>,
) -> Redirect {
    let auth = AuthService::new(state.pool(), state.email(), &state.config().base_url);
    match auth
        .reset_password(&token, &form.password, &form.password_confirm)
        .await
    {
        Ok(()) => {
            redirect_with(
                &session,
                "/",
                Flash::success(state.t(MessageKey::PasswordResetDone)),
            )
            .await
        }
        Err(e) => {
            log_auth_failure(&e, "reset");
            redirect_with(
                &session,
                &format!("/auth/reset/{token}"),
                Flash::error(state.t(auth_message(&e))),
            )
            .await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    #[test]
    fn test_login_template_renders_notice() {
        let html = LoginTemplate {
            flash: Some(Flash::error("Invalid email or password.")),
        }
        .render()
        .unwrap();
        assert!(html.contains("notice-error"));
        assert!(html.contains("Invalid email or password."));
        assert!(html.contains("action=\"/auth/login\""));
    }

    #[test]
    fn test_reset_template_hides_form_for_invalid_token() {
        let template = |token_valid| ResetTemplate {
            flash: None,
            token: "abc123".into(),
            token_valid,
            min_length: 8,
        };
        assert!(template(true).render().unwrap().contains("/auth/reset/abc123"));
        assert!(!template(false).render().unwrap().contains("/auth/reset/abc123"));
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(
            auth_message(&AuthError::MissingFields),
            MessageKey::RequiredFieldsEmpty
        );
        assert_eq!(
            auth_message(&AuthError::InvalidCredentials),
            MessageKey::InvalidCredentials
        );
        assert_eq!(
            auth_message(&AuthError::WeakPassword("short".into())),
            MessageKey::PasswordTooShort
        );
        assert_eq!(
            auth_message(&AuthError::Repository(RepositoryError::NotFound)),
            MessageKey::ServerError
        );
    }
}
