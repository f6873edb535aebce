/// Permission matrix editor for one target admin
use crate::{
    admin::{
        find_template, AdminAccount, AdminService, Module, PermissionAction, PermissionMatrix,
    },
    error::Notice,
    list::ListController,
};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, info, warn};

const LOAD_FAILED: &str = "Failed to load permissions";
const SAVE_FAILED: &str = "Failed to save permissions";

/// Edit buffer for an open editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub admin_id: i64,
    pub username: String,
    pub matrix: PermissionMatrix,
    pub saving: bool,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Closed,
    /// Waiting for the admin's current permission rows
    Loading { admin_id: i64 },
    Open(EditSession),
    /// Permission rows could not be loaded; nothing is editable
    Failed { admin_id: i64, notice: Notice },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Failed(Notice),
    NotOpen,
    InProgress,
}

pub struct PermissionEditor {
    service: AdminService,
    admins: Arc<ListController<AdminAccount>>,
    state: Mutex<EditorState>,
    /// Bumped by every open and close; only the latest open may publish
    open_generation: AtomicU64,
}

impl PermissionEditor {
    pub fn new(service: AdminService, admins: Arc<ListController<AdminAccount>>) -> Self {
        Self {
            service,
            admins,
            state: Mutex::new(EditorState::Closed),
            open_generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> EditorState {
        self.state.lock().clone()
    }

    /// Current buffer, if the editor is open
    pub fn matrix(&self) -> Option<PermissionMatrix> {
        match &*self.state.lock() {
            EditorState::Open(session) => Some(session.matrix),
            _ => None,
        }
    }

    /// Seed the buffer from the admin's permission rows
    ///
    /// Uses embedded rows when the list carried them, otherwise fetches
    /// them. A failed fetch leaves the editor in `Failed` rather than
    /// presenting an all-false buffer as the admin's real permissions.
    pub async fn open_for(&self, admin: &AdminAccount) -> bool {
        let token = self.open_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let rows = match &admin.permissions {
            Some(rows) => rows.clone(),
            None => {
                *self.state.lock() = EditorState::Loading { admin_id: admin.id };
                match self.service.get_permissions(admin.id).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!("Cannot open permission editor for {}: {}", admin.username, e);
                        let mut state = self.state.lock();
                        if self.is_current(token) {
                            *state = EditorState::Failed {
                                admin_id: admin.id,
                                notice: Notice::from_error(&e, LOAD_FAILED),
                            };
                        }
                        return false;
                    }
                }
            }
        };

        let mut state = self.state.lock();
        if !self.is_current(token) {
            debug!("Discarding stale permission rows for admin {}", admin.id);
            return false;
        }
        *state = EditorState::Open(EditSession {
            admin_id: admin.id,
            username: admin.username.clone(),
            matrix: PermissionMatrix::from_permissions(&rows),
            saving: false,
            notice: None,
        });
        true
    }

    fn is_current(&self, token: u64) -> bool {
        self.open_generation.load(Ordering::SeqCst) == token
    }

    fn edit(&self, f: impl FnOnce(&mut PermissionMatrix)) -> bool {
        match &mut *self.state.lock() {
            EditorState::Open(session) if !session.saving => {
                f(&mut session.matrix);
                true
            }
            _ => false,
        }
    }

    /// Overwrite the buffer from a template; unknown ids change nothing
    pub fn apply_template(&self, template_id: &str) -> bool {
        match find_template(template_id) {
            Some(template) => self.edit(|m| m.apply_template(template)),
            None => {
                warn!("Unknown permission template: {}", template_id);
                false
            }
        }
    }

    pub fn select_all(&self, checked: bool) -> bool {
        self.edit(|m| m.set_all(checked))
    }

    pub fn clear_all(&self) -> bool {
        self.edit(|m| m.clear_all())
    }

    pub fn set_flag(&self, module: Module, action: PermissionAction, value: bool) -> bool {
        self.edit(|m| m.set(module, action, value))
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        self.open_generation.fetch_add(1, Ordering::SeqCst);
        *state = EditorState::Closed;
    }

    /// Send the full 8-module set in one PUT
    ///
    /// On success the editor closes and the admin list is refetched. On
    /// failure the buffer is kept as the operator left it. Either way the
    /// state is only touched if it is still the session that started the
    /// save; an editor reopened meanwhile is left alone.
    pub async fn save(&self) -> SaveOutcome {
        let (admin_id, payload) = {
            let mut state = self.state.lock();
            match &mut *state {
                EditorState::Open(session) if session.saving => return SaveOutcome::InProgress,
                EditorState::Open(session) => {
                    session.saving = true;
                    session.notice = None;
                    (session.admin_id, session.matrix.to_permissions())
                }
                _ => return SaveOutcome::NotOpen,
            }
        };

        match self.service.update_permissions(admin_id, &payload).await {
            Ok(()) => {
                info!(
                    "Saved permissions for admin {} ({} modules granted)",
                    admin_id,
                    payload.iter().filter(|p| p.is_granted()).count()
                );
                {
                    let mut state = self.state.lock();
                    if is_saving(&state, admin_id) {
                        *state = EditorState::Closed;
                    }
                }
                self.admins.refetch().await;
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!("Saving permissions for admin {} failed: {}", admin_id, e);
                let notice = Notice::from_error(&e, SAVE_FAILED);
                let mut state = self.state.lock();
                if is_saving(&state, admin_id) {
                    if let EditorState::Open(session) = &mut *state {
                        session.saving = false;
                        session.notice = Some(notice.clone());
                    }
                }
                SaveOutcome::Failed(notice)
            }
        }
    }
}

fn is_saving(state: &EditorState, admin_id: i64) -> bool {
    matches!(state, EditorState::Open(session) if session.admin_id == admin_id && session.saving)
}
