use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four user roles, from the platform operator down to call agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    CompanyAdmin,
    TeamIncharge,
    Telecaller,
}

impl Role {
    const fn rank(self) -> u8 {
        match self {
            Role::SuperAdmin => 4,
            Role::CompanyAdmin => 3,
            Role::TeamIncharge => 2,
            Role::Telecaller => 1,
        }
    }

    /// Whether this role may enter the area guarded by `area`.
    ///
    /// Areas nest: the TeamIncharge area admits CompanyAdmins and
    /// SuperAdmins too, and every role may enter the Telecaller area.
    pub fn satisfies(self, area: Role) -> bool {
        self.rank() >= area.rank()
    }

    pub fn dashboard_path(self) -> &'static str {
        match self {
            Role::SuperAdmin => "/superadmin",
            Role::CompanyAdmin => "/companyadmin",
            Role::TeamIncharge => "/teamincharge",
            Role::Telecaller => "/telecaller",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::CompanyAdmin => "CompanyAdmin",
            Role::TeamIncharge => "TeamIncharge",
            Role::Telecaller => "Telecaller",
        }
    }

    /// Roles a CompanyAdmin can give to the employees they create.
    pub fn is_employee_role(self) -> bool {
        matches!(self, Role::TeamIncharge | Role::Telecaller)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SuperAdmin" => Ok(Role::SuperAdmin),
            "CompanyAdmin" => Ok(Role::CompanyAdmin),
            "TeamIncharge" => Ok(Role::TeamIncharge),
            "Telecaller" => Ok(Role::Telecaller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub username: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_id: Option<String>,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// SuperAdmins may act in any tenant; everyone else only in their own.
    pub fn can_act_in(&self, tenant_id: Option<&str>) -> bool {
        if self.is_super_admin() {
            return true;
        }
        match (self.tenant_id.as_deref(), tenant_id) {
            (Some(own), Some(requested)) => own == requested,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_nest_by_rank() {
        assert!(Role::SuperAdmin.satisfies(Role::CompanyAdmin));
        assert!(Role::CompanyAdmin.satisfies(Role::TeamIncharge));
        assert!(!Role::TeamIncharge.satisfies(Role::CompanyAdmin));
        assert!(!Role::CompanyAdmin.satisfies(Role::SuperAdmin));
        assert!(Role::Telecaller.satisfies(Role::Telecaller));
    }

    #[test]
    fn role_names_round_trip_through_serde() {
        assert_eq!(serde_json::to_value(Role::TeamIncharge).unwrap(), "TeamIncharge");
        assert_eq!("Telecaller".parse::<Role>(), Ok(Role::Telecaller));
        assert!("telecaller".parse::<Role>().is_err());
    }

    #[test]
    fn tenant_scope() {
        let p = Principal {
            id: "e1".into(),
            role: Role::TeamIncharge,
            tenant_id: Some("t1".into()),
            username: "EMP001".into(),
            name: "Asha".into(),
            emp_id: Some("EMP001".into()),
        };
        assert!(p.can_act_in(Some("t1")));
        assert!(!p.can_act_in(Some("t2")));
        assert!(!p.can_act_in(None));
        assert_eq!(Role::TeamIncharge.dashboard_path(), "/teamincharge");
    }
}
