use crate::error::{CivicError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Every role in the platform. The four admin roles form an ordered tier
/// (super_admin outranks district_admin, and so on down to department_head);
/// field_admin, worker, and citizen are operational roles outside the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    DistrictAdmin,
    MunicipalityAdmin,
    DepartmentHead,
    FieldAdmin,
    Worker,
    Citizen,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Role::SuperAdmin,
            Role::DistrictAdmin,
            Role::MunicipalityAdmin,
            Role::DepartmentHead,
            Role::FieldAdmin,
            Role::Worker,
            Role::Citizen,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::DistrictAdmin => "district_admin",
            Role::MunicipalityAdmin => "municipality_admin",
            Role::DepartmentHead => "department_head",
            Role::FieldAdmin => "field_admin",
            Role::Worker => "worker",
            Role::Citizen => "citizen",
        }
    }

    /// Rank within the admin tier: 1 (super_admin) through 4
    /// (department_head). Operational roles have no tier.
    pub fn admin_tier(self) -> Option<u8> {
        match self {
            Role::SuperAdmin => Some(1),
            Role::DistrictAdmin => Some(2),
            Role::MunicipalityAdmin => Some(3),
            Role::DepartmentHead => Some(4),
            Role::FieldAdmin | Role::Worker | Role::Citizen => None,
        }
    }

    /// True for any role in the admin tier (tier at or above
    /// department_head).
    pub fn is_admin(self) -> bool {
        self.admin_tier().is_some()
    }

    /// Tiers above department_head act across scopes; department_head and
    /// every operational role are confined to their own scope.
    pub fn bypasses_scope(self) -> bool {
        matches!(self.admin_tier(), Some(tier) if tier < 4)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CivicError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "district_admin" => Ok(Role::DistrictAdmin),
            "municipality_admin" => Ok(Role::MunicipalityAdmin),
            "department_head" => Ok(Role::DepartmentHead),
            "field_admin" => Ok(Role::FieldAdmin),
            "worker" => Ok(Role::Worker),
            "citizen" => Ok(Role::Citizen),
            _ => Err(CivicError::UnauthorizedRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewAll,
    AssignWorker,
    UpdateStatus,
    ManageDepartments,
    CloseReport,
    ReopenReport,
    ViewOwn,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ViewAll => "view_all",
            Capability::AssignWorker => "assign_worker",
            Capability::UpdateStatus => "update_status",
            Capability::ManageDepartments => "manage_departments",
            Capability::CloseReport => "close_report",
            Capability::ReopenReport => "reopen_report",
            Capability::ViewOwn => "view_own",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Capability table
// ---------------------------------------------------------------------------

/// The single source of truth for role capabilities. Adapters must never
/// compare role strings directly.
pub fn permissions_for(role: Role) -> &'static [Capability] {
    match role {
        Role::SuperAdmin | Role::DistrictAdmin | Role::MunicipalityAdmin => &[
            Capability::ViewAll,
            Capability::AssignWorker,
            Capability::UpdateStatus,
            Capability::ManageDepartments,
            Capability::CloseReport,
            Capability::ReopenReport,
        ],
        Role::DepartmentHead => &[
            Capability::ViewAll,
            Capability::AssignWorker,
            Capability::UpdateStatus,
            Capability::CloseReport,
            Capability::ReopenReport,
        ],
        Role::FieldAdmin => &[Capability::ViewAll, Capability::UpdateStatus],
        Role::Worker => &[Capability::ViewOwn, Capability::UpdateStatus],
        Role::Citizen => &[Capability::ViewOwn],
    }
}

/// Check a role against a capability and a scope-match verdict.
///
/// `scope_match` is the caller's answer to "does the target entity's scope
/// match the principal's scope"; roles above department_head ignore it.
pub fn is_authorized(role: Role, capability: Capability, scope_match: bool) -> Result<()> {
    if !permissions_for(role).contains(&capability) {
        return Err(CivicError::Forbidden {
            role: role.to_string(),
            capability: capability.to_string(),
        });
    }
    if !role.bypasses_scope() && !scope_match {
        return Err(CivicError::ScopeMismatch {
            principal: role.to_string(),
            target: "target scope".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_roundtrip() {
        for role in Role::all() {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), *role);
        }
    }

    #[test]
    fn unknown_role_tag_fails() {
        assert!(matches!(
            Role::from_str("moderator"),
            Err(CivicError::UnauthorizedRole(_))
        ));
    }

    #[test]
    fn admin_tier_ordering() {
        assert_eq!(Role::SuperAdmin.admin_tier(), Some(1));
        assert_eq!(Role::DepartmentHead.admin_tier(), Some(4));
        assert_eq!(Role::Worker.admin_tier(), None);
        assert_eq!(Role::FieldAdmin.admin_tier(), None);
    }

    #[test]
    fn scope_bypass_above_department_head() {
        assert!(Role::SuperAdmin.bypasses_scope());
        assert!(Role::MunicipalityAdmin.bypasses_scope());
        assert!(!Role::DepartmentHead.bypasses_scope());
        assert!(!Role::Worker.bypasses_scope());
    }

    #[test]
    fn capability_table() {
        assert!(permissions_for(Role::SuperAdmin).contains(&Capability::ManageDepartments));
        assert!(permissions_for(Role::DepartmentHead).contains(&Capability::AssignWorker));
        assert!(!permissions_for(Role::DepartmentHead).contains(&Capability::ManageDepartments));
        assert!(!permissions_for(Role::FieldAdmin).contains(&Capability::AssignWorker));
        assert!(!permissions_for(Role::Citizen).contains(&Capability::UpdateStatus));
    }

    #[test]
    fn missing_capability_is_forbidden() {
        let err = is_authorized(Role::Citizen, Capability::AssignWorker, true).unwrap_err();
        assert!(matches!(err, CivicError::Forbidden { .. }));
    }

    #[test]
    fn scope_limited_role_needs_matching_scope() {
        let err = is_authorized(Role::DepartmentHead, Capability::AssignWorker, false).unwrap_err();
        assert!(matches!(err, CivicError::ScopeMismatch { .. }));
        is_authorized(Role::DepartmentHead, Capability::AssignWorker, true).unwrap();
    }

    #[test]
    fn high_tier_bypasses_scope_check() {
        is_authorized(Role::DistrictAdmin, Capability::AssignWorker, false).unwrap();
        is_authorized(Role::SuperAdmin, Capability::CloseReport, false).unwrap();
    }
}
