use serde::Serialize;

use super::domain::{CompanyId, Profile, UserId, UserRole};

/// Capabilities checked by the service before any read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageCompanies,
    ManageUsers,
    ManageCages,
    RequestStocking,
    ApproveStocking,
    RecordOperations,
    ViewFarm,
}

impl Permission {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ManageCompanies => "manage companies",
            Self::ManageUsers => "manage users",
            Self::ManageCages => "manage cages",
            Self::RequestStocking => "request stockings",
            Self::ApproveStocking => "approve stockings",
            Self::RecordOperations => "record farm operations",
            Self::ViewFarm => "view farm data",
        }
    }
}

impl UserRole {
    pub fn allows(self, permission: Permission) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Manager => permission != Permission::ManageCompanies,
            UserRole::Operator => matches!(
                permission,
                Permission::RequestStocking | Permission::RecordOperations | Permission::ViewFarm
            ),
            UserRole::Viewer => permission == Permission::ViewFarm,
        }
    }
}

/// Authenticated caller, resolved from an active profile.
#[derive(Debug, Clone)]
pub struct Actor {
    profile: Profile,
}

impl Actor {
    pub(crate) fn new(profile: Profile) -> Self {
        Self { profile }
    }

    pub fn id(&self) -> &UserId {
        &self.profile.id
    }

    pub fn role(&self) -> UserRole {
        self.profile.role
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn company_id(&self) -> Option<&CompanyId> {
        self.profile.company_id.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.profile.role == UserRole::Admin
    }

    pub fn require(&self, permission: Permission) -> Result<(), AccessError> {
        if self.profile.role.allows(permission) {
            Ok(())
        } else {
            Err(AccessError::MissingPermission {
                role: self.profile.role,
                permission,
            })
        }
    }

    /// Admins reach every company; everyone else only their own.
    pub fn can_access(&self, company_id: &CompanyId) -> bool {
        self.is_admin() || self.company_id() == Some(company_id)
    }

    pub fn require_company(&self, company_id: &CompanyId) -> Result<(), AccessError> {
        if self.can_access(company_id) {
            Ok(())
        } else {
            Err(AccessError::OutsideCompany)
        }
    }

    /// Company scope for listings: `None` means unrestricted.
    pub fn scope(&self) -> Option<&CompanyId> {
        if self.is_admin() {
            None
        } else {
            self.company_id()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("missing or unknown user credentials")]
    Unauthenticated,
    #[error("user account is disabled")]
    Inactive,
    #[error("company registration has not been approved")]
    CompanyNotApproved,
    #[error("{} cannot {}", .role.label(), .permission.label())]
    MissingPermission {
        role: UserRole,
        permission: Permission,
    },
    #[error("resource belongs to another company")]
    OutsideCompany,
    #[error("{} cannot grant the {} role", .role.label(), .granted.label())]
    CannotGrant { role: UserRole, granted: UserRole },
}
