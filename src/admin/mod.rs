/// Admin accounts and permissions
///
/// Handles the admin directory, the per-module CRUD permission matrix,
/// permission templates and the fail-closed access policy.

pub mod directory;
pub mod editor;
pub mod matrix;
pub mod roles;
pub mod service;
pub mod templates;

pub use directory::AdminDirectory;
pub use editor::{EditSession, EditorState, PermissionEditor, SaveOutcome};
pub use matrix::{granted_module_count, PermissionMatrix};
pub use roles::{AccessPolicy, AdminRole};
pub use service::{AdminService, LoginResult};
pub use templates::{find_template, PermissionTemplate, TEMPLATES};

use crate::dto::{default_true, lenient_string, string_list};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Functional area of the admin system; the unit of permission granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Module {
    Users,
    Content,
    Subscriptions,
    Community,
    Stats,
    Banners,
    Announcements,
    HomeModules,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Users,
        Module::Content,
        Module::Subscriptions,
        Module::Community,
        Module::Stats,
        Module::Banners,
        Module::Announcements,
        Module::HomeModules,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Users => "users",
            Module::Content => "content",
            Module::Subscriptions => "subscriptions",
            Module::Community => "community",
            Module::Stats => "stats",
            Module::Banners => "banners",
            Module::Announcements => "announcements",
            Module::HomeModules => "home-modules",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Position in [`Module::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One of the four CRUD checkboxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    View,
    Create,
    Update,
    Delete,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 4] = [
        PermissionAction::View,
        PermissionAction::Create,
        PermissionAction::Update,
        PermissionAction::Delete,
    ];
}

/// The four independent flags of one module
///
/// No flag implies another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleFlags {
    pub view: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl ModuleFlags {
    pub const NONE: ModuleFlags = ModuleFlags::new(false, false, false, false);
    pub const ALL: ModuleFlags = ModuleFlags::new(true, true, true, true);
    pub const VIEW_ONLY: ModuleFlags = ModuleFlags::new(true, false, false, false);

    pub const fn new(view: bool, create: bool, update: bool, delete: bool) -> Self {
        Self {
            view,
            create,
            update,
            delete,
        }
    }

    pub const fn uniform(value: bool) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn any(&self) -> bool {
        self.view || self.create || self.update || self.delete
    }

    pub fn get(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::View => self.view,
            PermissionAction::Create => self.create,
            PermissionAction::Update => self.update,
            PermissionAction::Delete => self.delete,
        }
    }

    pub fn set(&mut self, action: PermissionAction, value: bool) {
        match action {
            PermissionAction::View => self.view = value,
            PermissionAction::Create => self.create = value,
            PermissionAction::Update => self.update = value,
            PermissionAction::Delete => self.delete = value,
        }
    }
}

/// Wire form of one module's permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModulePermission {
    pub module: Module,
    #[serde(default)]
    pub can_view: bool,
    #[serde(default)]
    pub can_create: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}

impl ModulePermission {
    pub fn new(module: Module, flags: ModuleFlags) -> Self {
        Self {
            module,
            can_view: flags.view,
            can_create: flags.create,
            can_update: flags.update,
            can_delete: flags.delete,
        }
    }

    pub fn flags(&self) -> ModuleFlags {
        ModuleFlags::new(self.can_view, self.can_create, self.can_update, self.can_delete)
    }

    /// Counts toward "N modules granted" if any flag is set
    pub fn is_granted(&self) -> bool {
        self.can_view || self.can_create || self.can_update || self.can_delete
    }
}

/// Admin account as listed by `/admin/admins`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: AdminRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub admin_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    /// Present when the list endpoint embeds permission rows
    #[serde(default, deserialize_with = "known_permissions")]
    pub permissions: Option<Vec<ModulePermission>>,
}

impl AdminAccount {
    /// Modules with at least one granted flag; `None` when rows were not loaded
    pub fn granted_modules(&self) -> Option<usize> {
        self.permissions.as_deref().map(granted_module_count)
    }
}

/// Decode permission rows, skipping modules this client does not know
pub(crate) fn known_permissions<'de, D>(deserializer: D) -> Result<Option<Vec<ModulePermission>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::Array(rows) => rows,
        other => {
            warn!("Ignoring malformed permission list: {}", other);
            return Ok(None);
        }
    };
    Ok(Some(decode_permission_rows(rows)))
}

pub(crate) fn decode_permission_rows(rows: Vec<Value>) -> Vec<ModulePermission> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<ModulePermission>(row.clone()) {
            Ok(permission) => Some(permission),
            Err(e) => {
                warn!("Skipping permission row {}: {}", row, e);
                None
            }
        })
        .collect()
}

/// Admin action audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i64,
    #[serde(default)]
    pub admin_id: Option<i64>,
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_module_wire_names() {
        assert_eq!(serde_json::to_value(Module::HomeModules).unwrap(), json!("home-modules"));
        assert_eq!(Module::from_str("HOME-MODULES"), Some(Module::HomeModules));
        assert_eq!(Module::from_str("billing"), None);
        for (i, module) in Module::ALL.iter().enumerate() {
            assert_eq!(module.index(), i);
        }
    }

    #[test]
    fn test_admin_account_decoding() {
        let admin: AdminAccount = serde_json::from_value(json!({
            "id": 7,
            "username": "carol",
            "email": "carol@example.com",
            "role": "super_admin",
            "isActive": true,
            "tags": "[\"ops\",\"night-shift\"]",
            "adminNumber": 1007,
            "createdAt": "2024-03-01T08:00:00Z",
            "lastLoginAt": null,
            "permissions": [
                {"module": "users", "canView": true},
                {"module": "billing", "canView": true},
                {"module": "stats", "canView": false, "canCreate": false, "canUpdate": false, "canDelete": false}
            ]
        }))
        .unwrap();

        assert_eq!(admin.role, AdminRole::SuperAdmin);
        assert_eq!(admin.tags, vec!["ops", "night-shift"]);
        assert_eq!(admin.admin_number.as_deref(), Some("1007"));
        assert_eq!(admin.permissions.as_ref().map(Vec::len), Some(2));
        assert_eq!(admin.granted_modules(), Some(1));
    }

    #[test]
    fn test_missing_permissions_stay_unknown() {
        let admin: AdminAccount = serde_json::from_value(json!({
            "id": 8,
            "username": "dave",
            "role": "admin"
        }))
        .unwrap();
        assert!(admin.permissions.is_none());
        assert!(admin.is_active);
        assert!(admin.tags.is_empty());
        assert_eq!(admin.granted_modules(), None);
    }

    #[test]
    fn test_flags_are_independent() {
        let mut flags = ModuleFlags::NONE;
        flags.set(PermissionAction::Delete, true);
        assert!(flags.delete);
        assert!(!flags.view);
        assert!(flags.any());
    }
}
