//! Sidebar navigation derived from the user's roles.

use finboard_core::{Role, RoleSet};

/// A sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
}

impl NavItem {
    const fn new(label: &'static str, href: &'static str) -> Self {
        Self { label, href }
    }

    /// Whether this entry should be highlighted for `current_path`.
    #[must_use]
    pub fn is_active(&self, current_path: &str) -> bool {
        current_path == self.href
            || current_path
                .strip_prefix(self.href)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Menu entries for a role set: a dashboard link per role home, then the
/// pages the roles may open.
#[must_use]
pub fn menu_for(roles: &RoleSet) -> Vec<NavItem> {
    let mut items = Vec::new();

    for role in Role::ALL {
        if !roles.contains(role) {
            continue;
        }
        let item = match role {
            Role::SuperAdmin => NavItem::new("Admin Dashboard", "/admin"),
            Role::Manager => NavItem::new("Manager Dashboard", "/manager"),
            Role::Supervisor => NavItem::new("Supervisor Dashboard", "/supervisor"),
            Role::User | Role::GaFs => NavItem::new("Dashboard", "/user"),
        };
        if !items.contains(&item) {
            items.push(item);
        }
    }

    if roles.can_manage_units() {
        items.push(NavItem::new("Business Units", "/units"));
    }
    if roles.can_manage_users() {
        items.push(NavItem::new("Users", "/users"));
    }
    if roles.can_manage_master_codes() {
        items.push(NavItem::new("Master Codes", "/master-codes"));
    }
    items.push(NavItem::new("Unit Data", "/data"));
    if roles.can_view_reports() {
        items.push(NavItem::new("Reports", "/reports"));
    }
    if roles.can_manage_library_codes() {
        items.push(NavItem::new("Library Codes", "/library-codes"));
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hrefs(roles: &RoleSet) -> Vec<&'static str> {
        menu_for(roles).iter().map(|i| i.href).collect()
    }

    #[test]
    fn test_super_admin_menu() {
        assert_eq!(
            hrefs(&RoleSet::single(Role::SuperAdmin)),
            vec![
                "/admin",
                "/units",
                "/users",
                "/master-codes",
                "/data",
                "/reports",
                "/library-codes"
            ]
        );
    }

    #[test]
    fn test_user_menu_has_no_management_pages() {
        assert_eq!(
            hrefs(&RoleSet::single(Role::User)),
            vec!["/user", "/data", "/reports"]
        );
        assert_eq!(
            hrefs(&RoleSet::single(Role::GaFs)),
            vec!["/user", "/data", "/reports"]
        );
    }

    #[test]
    fn test_multi_role_menu_lists_each_home_once() {
        let roles = RoleSet::new([Role::Manager, Role::User, Role::GaFs]).unwrap_or_else(|_| {
            RoleSet::single(Role::Manager)
        });
        assert_eq!(
            hrefs(&roles),
            vec!["/manager", "/user", "/data", "/reports"]
        );
    }

    #[test]
    fn test_is_active_matches_prefix_segments() {
        let item = NavItem::new("Users", "/users");
        assert!(item.is_active("/users"));
        assert!(item.is_active("/users/3/edit"));
        assert!(!item.is_active("/users-export"));
    }
}
