/// Permission matrix: module x {view, create, update, delete}
use crate::admin::{Module, ModuleFlags, ModulePermission, PermissionAction, PermissionTemplate};
use tracing::debug;

/// Fixed-size grid covering every known module
///
/// There is no way to construct a matrix with a missing module, so the
/// edit buffer can never hold an undefined checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionMatrix {
    flags: [ModuleFlags; 8],
}

impl PermissionMatrix {
    /// All flags false
    pub fn denied() -> Self {
        Self::default()
    }

    /// Seed from server rows; modules without a row stay all-false
    pub fn from_permissions(rows: &[ModulePermission]) -> Self {
        let mut matrix = Self::denied();
        let mut seen = [false; 8];
        for row in rows {
            let idx = row.module.index();
            if seen[idx] {
                debug!("Duplicate permission row for {}, last one wins", row.module.as_str());
            }
            seen[idx] = true;
            matrix.flags[idx] = row.flags();
        }
        matrix
    }

    pub fn get(&self, module: Module) -> ModuleFlags {
        self.flags[module.index()]
    }

    pub fn set(&mut self, module: Module, action: PermissionAction, value: bool) {
        self.flags[module.index()].set(action, value);
    }

    pub fn set_module(&mut self, module: Module, flags: ModuleFlags) {
        self.flags[module.index()] = flags;
    }

    /// Overwrite every module from the template
    pub fn apply_template(&mut self, template: &PermissionTemplate) {
        for module in Module::ALL {
            self.flags[module.index()] = template.flags_for(module);
        }
    }

    pub fn set_all(&mut self, checked: bool) {
        self.flags = [ModuleFlags::uniform(checked); 8];
    }

    pub fn clear_all(&mut self) {
        self.set_all(false);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Module, ModuleFlags)> + '_ {
        Module::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    /// Full payload for the replace-all endpoint, one row per module
    pub fn to_permissions(&self) -> Vec<ModulePermission> {
        self.iter()
            .map(|(module, flags)| ModulePermission::new(module, flags))
            .collect()
    }

    pub fn granted_count(&self) -> usize {
        self.flags.iter().filter(|f| f.any()).count()
    }
}

/// "N modules granted": rows with at least one true flag
pub fn granted_module_count(rows: &[ModulePermission]) -> usize {
    rows.iter().filter(|p| p.is_granted()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{find_template, TEMPLATES};

    #[test]
    fn test_missing_rows_default_to_denied() {
        let matrix = PermissionMatrix::from_permissions(&[ModulePermission::new(
            Module::Stats,
            ModuleFlags::VIEW_ONLY,
        )]);
        for (module, flags) in matrix.iter() {
            if module == Module::Stats {
                assert_eq!(flags, ModuleFlags::VIEW_ONLY);
            } else {
                assert_eq!(flags, ModuleFlags::NONE);
            }
        }
    }

    #[test]
    fn test_every_template_yields_full_grid() {
        for template in TEMPLATES {
            let mut matrix = PermissionMatrix::denied();
            matrix.set_all(true);
            matrix.apply_template(template);
            let rows = matrix.to_permissions();
            assert_eq!(rows.len(), 8);
            let modules: Vec<Module> = rows.iter().map(|r| r.module).collect();
            assert_eq!(modules, Module::ALL.to_vec());
            for row in &rows {
                assert_eq!(row.flags(), template.flags_for(row.module));
            }
        }
    }

    #[test]
    fn test_template_application_is_idempotent() {
        let template = find_template("content_editor").unwrap();
        let mut once = PermissionMatrix::denied();
        once.apply_template(template);
        let mut twice = once;
        twice.apply_template(template);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_select_all_and_clear_all() {
        let mut matrix = PermissionMatrix::denied();
        matrix.set(Module::Users, PermissionAction::Delete, true);

        matrix.set_all(true);
        let after_first = matrix;
        matrix.set_all(true);
        assert_eq!(matrix, after_first);
        assert!(matrix.iter().all(|(_, f)| f == ModuleFlags::ALL));

        matrix.clear_all();
        matrix.clear_all();
        assert!(matrix.iter().all(|(_, f)| f == ModuleFlags::NONE));
        assert_eq!(matrix.granted_count(), 0);
    }

    #[test]
    fn test_granted_count_uses_any_flag() {
        let rows = vec![
            ModulePermission::new(Module::Users, ModuleFlags::VIEW_ONLY),
            ModulePermission::new(Module::Content, ModuleFlags::NONE),
        ];
        assert_eq!(granted_module_count(&rows), 1);

        let rows = vec![
            ModulePermission::new(Module::Users, ModuleFlags::new(false, false, false, true)),
            ModulePermission::new(Module::Content, ModuleFlags::new(false, true, false, false)),
        ];
        assert_eq!(granted_module_count(&rows), 2);
    }

    #[test]
    fn test_duplicate_rows_last_wins() {
        let matrix = PermissionMatrix::from_permissions(&[
            ModulePermission::new(Module::Banners, ModuleFlags::ALL),
            ModulePermission::new(Module::Banners, ModuleFlags::VIEW_ONLY),
        ]);
        assert_eq!(matrix.get(Module::Banners), ModuleFlags::VIEW_ONLY);
    }
}
