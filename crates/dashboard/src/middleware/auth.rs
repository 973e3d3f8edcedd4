//! Authentication and role extractors.
//!
//! The session only identifies the user. Every guarded request reloads the
//! user row, so role and unit changes made by a super admin apply on the
//! next request and deleted users are signed out.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use finboard_core::{Role, RoleSet};

use crate::db::UserRepository;
use crate::error::set_sentry_user;
use crate::i18n::MessageKey;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// Logged-out HTML requests are redirected to the login page at `/`; API
/// requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Rejection for the auth extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page (HTML requests).
    RedirectToLogin,
    /// 401 for API requests.
    Unauthorized,
    /// Signed in, but the roles do not allow the page.
    Forbidden(&'static str),
    /// The user could not be loaded.
    ServerError(&'static str),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
            Self::ServerError(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

fn logged_out(parts: &Parts) -> AuthRejection {
    if parts.uri.path().starts_with("/api/") {
        AuthRejection::Unauthorized
    } else {
        AuthRejection::RedirectToLogin
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::Unauthorized)?;

        let stored: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| logged_out(parts))?;

        let user = UserRepository::new(state.pool())
            .get_by_id(stored.id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %stored.id, "Failed to reload session user");
                AuthRejection::ServerError(state.t(MessageKey::ServerError))
            })?;

        let Some(user) = user else {
            tracing::info!(user_id = %stored.id, "Session user no longer exists; signing out");
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "Failed to flush stale session");
            }
            return Err(logged_out(parts));
        };

        let current = CurrentUser::from(&user);
        if current.roles != stored.roles || current.unit_ids != stored.unit_ids {
            if let Err(e) = set_current_user(&session, &current).await {
                tracing::warn!(error = %e, "Failed to refresh session user");
            }
        }

        set_sentry_user(current.id.as_i32(), Some(current.email.as_str()));
        Ok(Self(current))
    }
}

/// Extractor that optionally gets the current user from the session.
///
/// Does not touch the database; used by the login page to skip straight to
/// the user's home.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Which role sets a [`RequireRole`] extractor admits.
pub trait RolePolicy: Send + Sync + 'static {
    /// Whether `roles` passes the policy.
    fn allows(roles: &RoleSet) -> bool;
}

/// Super Admin only.
pub struct SuperAdminOnly;

impl RolePolicy for SuperAdminOnly {
    fn allows(roles: &RoleSet) -> bool {
        roles.contains(Role::SuperAdmin)
    }
}

/// Roles that may upload and edit unit data.
pub struct DataEditors;

impl RolePolicy for DataEditors {
    fn allows(roles: &RoleSet) -> bool {
        roles.can_edit_data()
    }
}

/// Extractor that requires a signed-in user whose roles pass `P`.
///
/// ```rust,ignore
/// async fn handler(RequireSuperAdmin(admin, _): RequireSuperAdmin) -> impl IntoResponse {
///     format!("Hello super admin {}!", admin.name)
/// }
/// ```
pub struct RequireRole<P: RolePolicy>(pub CurrentUser, pub PhantomData<P>);

/// Requires the Super Admin role.
pub type RequireSuperAdmin = RequireRole<SuperAdminOnly>;

/// Requires Super Admin or Manager.
pub type RequireDataEditor = RequireRole<DataEditors>;

impl<P: RolePolicy> FromRequestParts<AppState> for RequireRole<P> {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !P::allows(&user.roles) {
            tracing::warn!(
                user_id = %user.id,
                path = %parts.uri.path(),
                "Role check failed"
            );
            return Err(AuthRejection::Forbidden(state.t(MessageKey::Forbidden)));
        }

        Ok(Self(user, PhantomData))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_super_admin_policy() {
        assert!(SuperAdminOnly::allows(&RoleSet::single(Role::SuperAdmin)));
        assert!(!SuperAdminOnly::allows(&RoleSet::single(Role::Manager)));
    }

    #[test]
    fn test_data_editor_policy() {
        assert!(DataEditors::allows(&RoleSet::single(Role::SuperAdmin)));
        assert!(DataEditors::allows(&RoleSet::single(Role::Manager)));
        assert!(!DataEditors::allows(&RoleSet::single(Role::Supervisor)));
        assert!(!DataEditors::allows(&RoleSet::single(Role::GaFs)));
    }

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(
            AuthRejection::RedirectToLogin.into_response().status(),
            StatusCode::SEE_OTHER
        );
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden("no").into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
