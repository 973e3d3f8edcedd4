//! Session-stored identity of the signed-in user.

use serde::{Deserialize, Serialize};

use finboard_core::{Email, RoleSet, UnitId, UserId};

use super::{Unit, User};

/// Minimal data stored in the session to identify the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub roles: RoleSet,
    pub unit_ids: Vec<UnitId>,
}

impl CurrentUser {
    /// Whether the user may see data of `unit_id`.
    #[must_use]
    pub fn can_see_unit(&self, unit_id: UnitId) -> bool {
        self.roles.sees_all_units() || self.unit_ids.contains(&unit_id)
    }

    /// Filter `units` down to the ones this user may see, keeping order.
    #[must_use]
    pub fn visible_units(&self, units: Vec<Unit>) -> Vec<Unit> {
        units
            .into_iter()
            .filter(|u| self.can_see_unit(u.id))
            .collect()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            unit_ids: user.unit_ids.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the one-shot notice shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use finboard_core::Role;

    use super::*;

    fn unit(id: i32, name: &str) -> Unit {
        Unit {
            id: UnitId::new(id),
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn current(roles: &[Role], units: &[i32]) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("staff@finboard.test").unwrap(),
            name: "Staff".to_string(),
            roles: RoleSet::new(roles.iter().copied()).unwrap(),
            unit_ids: units.iter().copied().map(UnitId::new).collect(),
        }
    }

    #[test]
    fn test_super_admin_sees_every_unit() {
        let admin = current(&[Role::SuperAdmin], &[]);
        let visible = admin.visible_units(vec![unit(1, "North"), unit(2, "South")]);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_other_roles_see_assigned_units_only() {
        let manager = current(&[Role::Manager], &[2]);
        let visible = manager.visible_units(vec![unit(1, "North"), unit(2, "South")]);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.first().map(|u| u.name.as_str()), Some("South"));
        assert!(!manager.can_see_unit(UnitId::new(1)));
    }
}
