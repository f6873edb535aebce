/// Admin API endpoints
use crate::{
    admin::{decode_permission_rows, AdminAccount, AdminRole, AuditLogEntry, ModulePermission},
    error::{ConsoleError, ConsoleResult},
    http::{ApiClient, PageData},
    list::PaginatedList,
    session::SessionData,
    validation::{CreateAdminForm, FormValidation, TagsForm},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ADMINS_ENDPOINT: &str = "/admin/admins";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Token issued by the login endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    #[serde(default)]
    pub role: Option<AdminRole>,
}

#[derive(Debug, Serialize)]
struct TagsRequest<'a> {
    tags: &'a [String],
}

#[derive(Debug, Serialize)]
struct PermissionsRequest<'a> {
    permissions: &'a [ModulePermission],
}

/// Thin typed wrapper over the admin endpoints
///
/// Returns errors; the managers built on top decide what to show.
#[derive(Clone)]
pub struct AdminService {
    client: ApiClient,
}

impl AdminService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Exchange credentials for a token and store it in the session
    pub async fn login(&self, username: &str, password: &str) -> ConsoleResult<LoginResult> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ConsoleError::Validation(vec![crate::error::FieldError {
                field: "credentials".to_string(),
                message: "username and password are required".to_string(),
            }]));
        }

        let result: LoginResult = self
            .client
            .post("/admin/auth/login", &LoginRequest { username, password })
            .await?;

        self.client.session().sign_in(SessionData {
            token: result.token.clone(),
            username: username.to_string(),
            role: result.role,
        })?;

        Ok(result)
    }

    pub async fn create_admin(&self, form: &CreateAdminForm) -> ConsoleResult<AdminAccount> {
        FormValidation::check(form).into_result()?;
        self.client.post(ADMINS_ENDPOINT, form).await
    }

    pub async fn get_permissions(&self, admin_id: i64) -> ConsoleResult<Vec<ModulePermission>> {
        let rows: Option<Vec<Value>> = self
            .client
            .get(&format!("{}/{}/permissions", ADMINS_ENDPOINT, admin_id), &[])
            .await?;
        rows.map(decode_permission_rows).ok_or_else(|| {
            ConsoleError::Decode(format!("No permission data returned for admin {}", admin_id))
        })
    }

    /// Replace the admin's whole permission set
    pub async fn update_permissions(&self, admin_id: i64, permissions: &[ModulePermission]) -> ConsoleResult<()> {
        let _: Value = self
            .client
            .put(
                &format!("{}/{}/permissions", ADMINS_ENDPOINT, admin_id),
                &PermissionsRequest { permissions },
            )
            .await?;
        Ok(())
    }

    pub async fn update_tags(&self, admin_id: i64, tags: &[String]) -> ConsoleResult<Vec<String>> {
        let form = TagsForm::normalized(tags);
        FormValidation::check(&form).into_result()?;

        let _: Value = self
            .client
            .put(
                &format!("{}/{}/tags", ADMINS_ENDPOINT, admin_id),
                &TagsRequest { tags: &form.tags },
            )
            .await?;
        Ok(form.tags)
    }

    pub async fn audit_logs(&self, admin_id: i64, page: u32, size: u32) -> ConsoleResult<PaginatedList<AuditLogEntry>> {
        let page = page.max(1);
        let size = size.max(1);
        let data: PageData<AuditLogEntry> = self
            .client
            .get(
                &format!("{}/{}/audit-logs", ADMINS_ENDPOINT, admin_id),
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await?;
        Ok(PaginatedList::from_page(data, page, size))
    }
}
