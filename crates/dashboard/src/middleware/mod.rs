//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is not a layer: handlers take [`RequireAuth`] or a
//! [`RequireRole`] extractor.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, DataEditors, OptionalAuth, RequireAuth, RequireDataEditor, RequireRole,
    RequireSuperAdmin, RolePolicy, SuperAdminOnly, clear_current_user, set_current_user,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, create_session_store};
