/// Admin directory screen state
use crate::{
    admin::{
        service::ADMINS_ENDPOINT, AccessPolicy, AdminAccount, AdminRole, AdminService, AuditLogEntry,
        PermissionEditor,
    },
    error::{ActionOutcome, Notice},
    list::{FetchOutcome, FilterPatch, ListController, PaginatedList},
    validation::{CreateAdminForm, FormValidation},
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const CREATE_FAILED: &str = "Failed to create admin";
const TAGS_FAILED: &str = "Failed to update tags";
const AUDIT_FAILED: &str = "Failed to load audit log";

/// Admin list, permission editor and the mutations around them
pub struct AdminDirectory {
    service: AdminService,
    admins: Arc<ListController<AdminAccount>>,
    editor: PermissionEditor,
    notice: Mutex<Option<Notice>>,
}

impl AdminDirectory {
    pub fn new(service: AdminService, page_size: u32, debounce: Duration) -> Self {
        let admins = Arc::new(ListController::new(
            service.client().clone(),
            ADMINS_ENDPOINT,
            page_size,
            debounce,
        ));
        let editor = PermissionEditor::new(service.clone(), Arc::clone(&admins));
        Self {
            service,
            admins,
            editor,
            notice: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &AdminService {
        &self.service
    }

    pub fn admins(&self) -> &Arc<ListController<AdminAccount>> {
        &self.admins
    }

    pub fn editor(&self) -> &PermissionEditor {
        &self.editor
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice.lock().clone()
    }

    pub async fn filter_by_role(&self, role: Option<AdminRole>) -> FetchOutcome {
        self.admins
            .set_filter(FilterPatch::new().maybe("role", role.map(|r| r.as_str().to_string())))
            .await
    }

    /// Validate then create; the list is refetched on success
    pub async fn create_admin(&self, form: &CreateAdminForm) -> ActionOutcome {
        if let FormValidation::Invalid(errors) = FormValidation::check(form) {
            return ActionOutcome::Invalid(errors);
        }

        match self.service.create_admin(form).await {
            Ok(admin) => {
                *self.notice.lock() = Some(Notice::success(format!("Created admin {}", admin.username)));
                self.admins.refetch().await;
                ActionOutcome::Done
            }
            Err(e) => self.fail(&e, CREATE_FAILED),
        }
    }

    pub async fn update_tags(&self, admin_id: i64, tags: &[String]) -> ActionOutcome {
        match self.service.update_tags(admin_id, tags).await {
            Ok(saved) => {
                *self.notice.lock() = Some(Notice::success(format!("Saved {} tags", saved.len())));
                self.admins.refetch().await;
                ActionOutcome::Done
            }
            Err(crate::error::ConsoleError::Validation(errors)) => ActionOutcome::Invalid(errors),
            Err(e) => self.fail(&e, TAGS_FAILED),
        }
    }

    /// One page of the admin's audit trail, for display only
    pub async fn audit_trail(&self, admin_id: i64, page: u32, size: u32) -> Option<PaginatedList<AuditLogEntry>> {
        match self.service.audit_logs(admin_id, page, size).await {
            Ok(list) => Some(list),
            Err(e) => {
                self.fail(&e, AUDIT_FAILED);
                None
            }
        }
    }

    /// Access policy for an admin, fetching rows when the list did not embed them
    pub async fn policy_for(&self, admin: &AdminAccount) -> AccessPolicy {
        if admin.permissions.is_some() {
            return AccessPolicy::for_account(admin);
        }
        AccessPolicy::from_fetch(admin, self.service.get_permissions(admin.id).await)
    }

    /// Locate an admin by id, paging through the list under its current filters
    ///
    /// Returns `None` when no page holds the id or a page fails to load; the
    /// list error tells the two apart.
    pub async fn find_admin(&self, admin_id: i64) -> Option<AdminAccount> {
        if self.admins.items().is_empty() {
            self.admins.refetch().await;
        }
        if let Some(admin) = self.visible_admin(admin_id) {
            return Some(admin);
        }
        if self.admins.error().is_some() {
            return None;
        }

        let state = self.admins.snapshot();
        let pages = state.to_page().total_pages();
        for page in (1..=pages).filter(|p| *p != u64::from(state.page)) {
            let page = u32::try_from(page).ok()?;
            if self.admins.set_page(page).await == FetchOutcome::Failed {
                return None;
            }
            if let Some(admin) = self.visible_admin(admin_id) {
                return Some(admin);
            }
        }
        debug!("Admin {} not found in {} pages", admin_id, pages);
        None
    }

    fn visible_admin(&self, admin_id: i64) -> Option<AdminAccount> {
        self.admins.items().into_iter().find(|a| a.id == admin_id)
    }

    /// What the signed-in operator may do; denies everything when signed out
    pub fn session_policy(&self) -> AccessPolicy {
        AccessPolicy::for_session(self.service.client().session().current().as_ref())
    }

    fn fail(&self, error: &crate::error::ConsoleError, fallback: &str) -> ActionOutcome {
        warn!("{}: {}", fallback, error);
        let notice = Notice::from_error(error, fallback);
        *self.notice.lock() = Some(notice.clone());
        ActionOutcome::Failed(notice)
    }
}
