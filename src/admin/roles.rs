/// Admin roles and the access policy derived from them
use crate::{
    admin::{AdminAccount, Module, ModulePermission, PermissionAction, PermissionMatrix},
    error::{ConsoleError, ConsoleResult},
    session::SessionData,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Admin role levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Limited to the modules granted in the permission matrix
    Admin,
    /// Full access, manages other admins
    SuperAdmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::Admin => "admin",
            AdminRole::SuperAdmin => "super_admin",
        }
    }

    pub fn from_str(s: &str) -> ConsoleResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(AdminRole::Admin),
            "super_admin" | "superadmin" => Ok(AdminRole::SuperAdmin),
            _ => Err(ConsoleError::Validation(vec![crate::error::FieldError {
                field: "role".to_string(),
                message: format!("Invalid role: {}", s),
            }])),
        }
    }

    /// Check if this role can perform actions requiring another role
    pub fn can_act_as(&self, required: AdminRole) -> bool {
        self >= &required
    }
}

/// Answers "may this admin do X in module M"
///
/// Fails closed: unknown role, inactive account, missing or failed
/// permission data all deny.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessPolicy {
    role: Option<AdminRole>,
    active: bool,
    grants: Option<PermissionMatrix>,
}

impl AccessPolicy {
    pub fn deny_all() -> Self {
        Self {
            role: None,
            active: false,
            grants: None,
        }
    }

    /// Policy for the signed-in operator, from the role the login returned
    ///
    /// No session or no role denies everything. The operator's own matrix
    /// is not loaded, so a plain admin is granted nothing here.
    pub fn for_session(session: Option<&SessionData>) -> Self {
        match session.and_then(|data| data.role) {
            Some(role) => Self {
                role: Some(role),
                active: true,
                grants: None,
            },
            None => Self::deny_all(),
        }
    }

    /// Policy from an account and its embedded permission rows
    pub fn for_account(admin: &AdminAccount) -> Self {
        Self {
            role: Some(admin.role),
            active: admin.is_active,
            grants: admin
                .permissions
                .as_deref()
                .map(PermissionMatrix::from_permissions),
        }
    }

    /// Policy from a separately fetched permission list
    pub fn from_fetch(admin: &AdminAccount, fetched: ConsoleResult<Vec<ModulePermission>>) -> Self {
        match fetched {
            Ok(rows) => Self {
                role: Some(admin.role),
                active: admin.is_active,
                grants: Some(PermissionMatrix::from_permissions(&rows)),
            },
            Err(e) => {
                warn!("Permission fetch for {} failed, denying access: {}", admin.username, e);
                Self {
                    role: Some(admin.role),
                    active: admin.is_active,
                    grants: None,
                }
            }
        }
    }

    pub fn allows(&self, module: Module, action: PermissionAction) -> bool {
        if !self.active {
            return false;
        }
        match self.role {
            Some(role) if role.can_act_as(AdminRole::SuperAdmin) => true,
            Some(_) => self
                .grants
                .as_ref()
                .map(|grants| grants.get(module).get(action))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Only super admins manage other admins' permissions
    pub fn can_manage_admins(&self) -> bool {
        self.active && self.role.map(|r| r.can_act_as(AdminRole::SuperAdmin)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::ModuleFlags;

    fn account(role: AdminRole, permissions: Option<Vec<ModulePermission>>) -> AdminAccount {
        AdminAccount {
            id: 1,
            username: "erin".to_string(),
            email: "erin@example.com".to_string(),
            role,
            is_active: true,
            tags: Vec::new(),
            admin_number: None,
            created_at: None,
            last_login_at: None,
            permissions,
        }
    }

    #[test]
    fn test_role_hierarchy() {
        assert!(AdminRole::SuperAdmin > AdminRole::Admin);
        assert!(AdminRole::SuperAdmin.can_act_as(AdminRole::Admin));
        assert!(!AdminRole::Admin.can_act_as(AdminRole::SuperAdmin));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(AdminRole::from_str("admin").unwrap(), AdminRole::Admin);
        assert_eq!(AdminRole::from_str("SUPER_ADMIN").unwrap(), AdminRole::SuperAdmin);
        assert!(AdminRole::from_str("root").is_err());
    }

    #[test]
    fn test_admin_needs_explicit_flag() {
        let admin = account(
            AdminRole::Admin,
            Some(vec![ModulePermission::new(
                Module::Banners,
                ModuleFlags::new(false, true, false, false),
            )]),
        );
        let policy = AccessPolicy::for_account(&admin);
        assert!(policy.allows(Module::Banners, PermissionAction::Create));
        // create does not imply view
        assert!(!policy.allows(Module::Banners, PermissionAction::View));
        assert!(!policy.allows(Module::Users, PermissionAction::View));
        assert!(!policy.can_manage_admins());
    }

    #[test]
    fn test_unloaded_or_failed_permissions_deny() {
        let admin = account(AdminRole::Admin, None);
        assert!(!AccessPolicy::for_account(&admin).allows(Module::Stats, PermissionAction::View));

        let failed = AccessPolicy::from_fetch(
            &admin,
            Err(ConsoleError::Connectivity("timeout".to_string())),
        );
        for module in Module::ALL {
            for action in PermissionAction::ALL {
                assert!(!failed.allows(module, action));
            }
        }
    }

    #[test]
    fn test_super_admin_and_inactive() {
        let mut admin = account(AdminRole::SuperAdmin, None);
        assert!(AccessPolicy::for_account(&admin).allows(Module::Users, PermissionAction::Delete));

        admin.is_active = false;
        assert!(!AccessPolicy::for_account(&admin).allows(Module::Users, PermissionAction::View));
        assert!(!AccessPolicy::deny_all().allows(Module::Users, PermissionAction::View));
    }

    #[test]
    fn test_session_policy() {
        let data = |role| SessionData {
            token: "t".to_string(),
            username: "erin".to_string(),
            role,
        };
        assert!(AccessPolicy::for_session(Some(&data(Some(AdminRole::SuperAdmin)))).can_manage_admins());

        let plain = AccessPolicy::for_session(Some(&data(Some(AdminRole::Admin))));
        assert!(!plain.can_manage_admins());
        assert!(!plain.allows(Module::Content, PermissionAction::View));

        assert_eq!(AccessPolicy::for_session(Some(&data(None))), AccessPolicy::deny_all());
        assert_eq!(AccessPolicy::for_session(None), AccessPolicy::deny_all());
    }
}
