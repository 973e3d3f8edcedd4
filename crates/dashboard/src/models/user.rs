//! Dashboard user domain types.

use chrono::{DateTime, Utc};

use finboard_core::{Email, RoleSet, UnitId, UserId};

/// A dashboard user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: Email,
    /// Roles held by the user.
    pub roles: RoleSet,
    /// Business units assigned to the user.
    pub unit_ids: Vec<UnitId>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A user together with the stored password hash, for login only.
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: Option<String>,
}

/// Profile fields written by create and update.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub name: String,
    pub email: Email,
    pub roles: RoleSet,
}
