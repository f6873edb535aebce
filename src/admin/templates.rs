/// Built-in permission templates
///
/// A template lists only the modules it grants; applying it overwrites the
/// whole matrix, so every module it leaves out ends up all-false.
use crate::admin::{Module, ModuleFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub grants: &'static [(Module, ModuleFlags)],
}

impl PermissionTemplate {
    pub fn flags_for(&self, module: Module) -> ModuleFlags {
        self.grants
            .iter()
            .find(|(m, _)| *m == module)
            .map(|(_, flags)| *flags)
            .unwrap_or(ModuleFlags::NONE)
    }
}

const EDIT: ModuleFlags = ModuleFlags::new(true, true, true, false);
const MODERATE: ModuleFlags = ModuleFlags::new(true, false, true, true);

pub const TEMPLATES: &[PermissionTemplate] = &[
    PermissionTemplate {
        id: "read_only",
        name: "Read only",
        description: "View every module, change nothing",
        grants: &[
            (Module::Users, ModuleFlags::VIEW_ONLY),
            (Module::Content, ModuleFlags::VIEW_ONLY),
            (Module::Subscriptions, ModuleFlags::VIEW_ONLY),
            (Module::Community, ModuleFlags::VIEW_ONLY),
            (Module::Stats, ModuleFlags::VIEW_ONLY),
            (Module::Banners, ModuleFlags::VIEW_ONLY),
            (Module::Announcements, ModuleFlags::VIEW_ONLY),
            (Module::HomeModules, ModuleFlags::VIEW_ONLY),
        ],
    },
    PermissionTemplate {
        id: "content_editor",
        name: "Content editor",
        description: "Curate papers, videos, repos and the home page",
        grants: &[
            (Module::Content, EDIT),
            (Module::Banners, EDIT),
            (Module::Announcements, EDIT),
            (Module::HomeModules, EDIT),
            (Module::Stats, ModuleFlags::VIEW_ONLY),
        ],
    },
    PermissionTemplate {
        id: "community_moderator",
        name: "Community moderator",
        description: "Moderate posts and look up users",
        grants: &[
            (Module::Community, MODERATE),
            (Module::Users, ModuleFlags::VIEW_ONLY),
            (Module::Content, ModuleFlags::VIEW_ONLY),
        ],
    },
    PermissionTemplate {
        id: "subscription_operator",
        name: "Subscription operator",
        description: "Manage subscriptions and their sync jobs",
        grants: &[
            (Module::Subscriptions, ModuleFlags::ALL),
            (Module::Users, ModuleFlags::VIEW_ONLY),
            (Module::Stats, ModuleFlags::VIEW_ONLY),
        ],
    },
    PermissionTemplate {
        id: "full_access",
        name: "Full access",
        description: "Every action in every module",
        grants: &[
            (Module::Users, ModuleFlags::ALL),
            (Module::Content, ModuleFlags::ALL),
            (Module::Subscriptions, ModuleFlags::ALL),
            (Module::Community, ModuleFlags::ALL),
            (Module::Stats, ModuleFlags::ALL),
            (Module::Banners, ModuleFlags::ALL),
            (Module::Announcements, ModuleFlags::ALL),
            (Module::HomeModules, ModuleFlags::ALL),
        ],
    },
];

pub fn find_template(id: &str) -> Option<&'static PermissionTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}
