//! Dashboard roles and role sets.
//!
//! A user holds one or more roles. Older records store a single role string
//! (`"Manager"`), newer ones a list; both parse into a [`RoleSet`]. Access
//! checks are plain membership tests over the set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    /// The string does not name a known role.
    #[error("unknown role: {0}")]
    Unknown(String),
    /// A role set must contain at least one role.
    #[error("at least one role is required")]
    Empty,
}

/// A dashboard role.
///
/// Variants are ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access, including unit, user and code management.
    SuperAdmin,
    /// Uploads and edits data for assigned units.
    Manager,
    /// Reviews data and reports for assigned units.
    Supervisor,
    /// Views dashboards for assigned units.
    User,
    /// General affairs / finance staff.
    GaFs,
}

impl Role {
    /// Every role, most privileged first.
    pub const ALL: [Self; 5] = [
        Self::SuperAdmin,
        Self::Manager,
        Self::Supervisor,
        Self::User,
        Self::GaFs,
    ];

    /// Storage key (`super_admin`, `manager`, ...).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Manager => "manager",
            Self::Supervisor => "supervisor",
            Self::User => "user",
            Self::GaFs => "ga_fs",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::Manager => "Manager",
            Self::Supervisor => "Supervisor",
            Self::User => "User",
            Self::GaFs => "GA/FS",
        }
    }

    /// Landing route for the role's dashboard.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::SuperAdmin => "/admin",
            Self::Manager => "/manager",
            Self::Supervisor => "/supervisor",
            Self::User | Self::GaFs => "/user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    /// Accepts storage keys and labels, ignoring case, spaces, dashes,
    /// underscores and slashes (`"Super Admin"`, `"super_admin"`, `"GA/FS"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-' | '/'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "superadmin" | "admin" => Ok(Self::SuperAdmin),
            "manager" => Ok(Self::Manager),
            "supervisor" => Ok(Self::Supervisor),
            "user" => Ok(Self::User),
            "gafs" => Ok(Self::GaFs),
            _ => Err(RoleError::Unknown(s.trim().to_owned())),
        }
    }
}

/// A non-empty, ordered, de-duplicated set of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Role>", into = "Vec<Role>")]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// Build a role set from any iterator of roles.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError::Empty`] if the iterator yields nothing.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, RoleError> {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort_unstable();
        roles.dedup();
        if roles.is_empty() {
            return Err(RoleError::Empty);
        }
        Ok(Self(roles))
    }

    /// A set holding a single role.
    #[must_use]
    pub fn single(role: Role) -> Self {
        Self(vec![role])
    }

    /// Parse role strings as stored by any version of the app.
    ///
    /// Each entry may itself be comma-separated. Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown role or when no role remains.
    pub fn parse_all<S: AsRef<str>>(values: &[S]) -> Result<Self, RoleError> {
        let mut roles = Vec::new();
        for value in values {
            for part in value.as_ref().split(',') {
                if part.trim().is_empty() {
                    continue;
                }
                roles.push(part.parse()?);
            }
        }
        Self::new(roles)
    }

    /// Most privileged role in the set.
    #[must_use]
    pub fn primary(&self) -> Role {
        self.0.first().copied().unwrap_or(Role::User)
    }

    /// Whether the set contains `role`.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Whether the set contains any of `roles`.
    #[must_use]
    pub fn any_of(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.contains(*r))
    }

    /// Iterate over the roles, most privileged first.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Storage keys for persisting the set.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.iter().map(|r| r.key().to_owned()).collect()
    }

    /// Comma-separated labels for display.
    #[must_use]
    pub fn labels(&self) -> String {
        self.0
            .iter()
            .map(|r| r.label())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Landing route for the most privileged role.
    #[must_use]
    pub fn home_path(&self) -> &'static str {
        self.primary().home_path()
    }

    /// Whether the set grants access to the dashboard at `home`.
    #[must_use]
    pub fn can_open_home(&self, home: &str) -> bool {
        self.iter().any(|r| r.home_path() == home)
    }

    /// Sees every business unit regardless of assignment.
    #[must_use]
    pub fn sees_all_units(&self) -> bool {
        self.contains(Role::SuperAdmin)
    }

    /// May create, rename and delete business units.
    #[must_use]
    pub fn can_manage_units(&self) -> bool {
        self.contains(Role::SuperAdmin)
    }

    /// May create, edit and delete users.
    #[must_use]
    pub fn can_manage_users(&self) -> bool {
        self.contains(Role::SuperAdmin)
    }

    /// May edit the master code table.
    #[must_use]
    pub fn can_manage_master_codes(&self) -> bool {
        self.contains(Role::SuperAdmin)
    }

    /// May import and clear library codes.
    #[must_use]
    pub fn can_manage_library_codes(&self) -> bool {
        self.contains(Role::SuperAdmin)
    }

    /// May upload spreadsheets of unit data.
    #[must_use]
    pub fn can_upload_data(&self) -> bool {
        self.any_of(&[Role::SuperAdmin, Role::Manager])
    }

    /// May edit and delete individual unit data items.
    #[must_use]
    pub fn can_edit_data(&self) -> bool {
        self.any_of(&[Role::SuperAdmin, Role::Manager])
    }

    /// May open the aggregated reports.
    #[must_use]
    pub fn can_view_reports(&self) -> bool {
        !self.0.is_empty()
    }
}

impl TryFrom<Vec<Role>> for RoleSet {
    type Error = RoleError;

    fn try_from(roles: Vec<Role>) -> Result<Self, Self::Error> {
        Self::new(roles)
    }
}

impl From<RoleSet> for Vec<Role> {
    fn from(set: RoleSet) -> Self {
        set.0
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parses_labels_and_keys() {
        assert_eq!("Super Admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("GA/FS".parse::<Role>().unwrap(), Role::GaFs);
        assert_eq!("ga_fs".parse::<Role>().unwrap(), Role::GaFs);
        assert_eq!(" manager ".parse::<Role>().unwrap(), Role::Manager);
        assert!(matches!(
            "auditor".parse::<Role>(),
            Err(RoleError::Unknown(ref s)) if s == "auditor"
        ));
    }

    #[test]
    fn test_role_display_is_storage_key() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
            assert_eq!(role.label().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_home_paths() {
        assert_eq!(Role::SuperAdmin.home_path(), "/admin");
        assert_eq!(Role::Manager.home_path(), "/manager");
        assert_eq!(Role::Supervisor.home_path(), "/supervisor");
        assert_eq!(Role::User.home_path(), "/user");
        assert_eq!(Role::GaFs.home_path(), "/user");
    }

    #[test]
    fn test_role_set_parses_legacy_single_string() {
        let set = RoleSet::parse_all(&["Manager"]).unwrap();
        assert_eq!(set.primary(), Role::Manager);
        assert_eq!(set.home_path(), "/manager");
    }

    #[test]
    fn test_role_set_parses_arrays_and_comma_lists() {
        let set = RoleSet::parse_all(&["User", "Supervisor, Manager", ""]).unwrap();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Role::Manager, Role::Supervisor, Role::User]
        );
        assert_eq!(set.primary(), Role::Manager);
    }

    #[test]
    fn test_role_set_rejects_empty() {
        assert_eq!(RoleSet::parse_all::<&str>(&[]), Err(RoleError::Empty));
        assert_eq!(RoleSet::parse_all(&[" ", ","]), Err(RoleError::Empty));
    }

    #[test]
    fn test_role_set_deduplicates() {
        let set = RoleSet::new([Role::User, Role::User, Role::GaFs]).unwrap();
        assert_eq!(set.keys(), vec!["user".to_owned(), "ga_fs".to_owned()]);
        assert_eq!(set.labels(), "User, GA/FS");
    }

    #[test]
    fn test_capabilities_follow_membership() {
        let admin = RoleSet::single(Role::SuperAdmin);
        let manager = RoleSet::single(Role::Manager);
        let viewer = RoleSet::new([Role::Supervisor, Role::User]).unwrap();

        assert!(admin.can_manage_units() && admin.can_manage_users());
        assert!(admin.sees_all_units());

        assert!(!manager.can_manage_units());
        assert!(manager.can_upload_data() && manager.can_edit_data());
        assert!(!manager.sees_all_units());

        assert!(!viewer.can_upload_data());
        assert!(viewer.can_view_reports());
    }

    #[test]
    fn test_can_open_home_checks_every_role() {
        let set = RoleSet::new([Role::Manager, Role::User]).unwrap();
        assert!(set.can_open_home("/manager"));
        assert!(set.can_open_home("/user"));
        assert!(!set.can_open_home("/admin"));
        assert!(!set.can_open_home("/supervisor"));
    }

    #[test]
    fn test_role_set_serde_rejects_empty_list() {
        let parsed: Result<RoleSet, _> = serde_json::from_str("[]");
        assert!(parsed.is_err());
        let parsed: RoleSet = serde_json::from_str(r#"["user","super_admin"]"#).unwrap();
        assert_eq!(parsed.primary(), Role::SuperAdmin);
    }
}
