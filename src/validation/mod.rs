/// Form validation
///
/// Forms are checked before any request is built. The result is a value
/// the submit path branches on; nothing is thrown.
use crate::{
    admin::AdminRole,
    error::{ConsoleError, FieldError},
};
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

/// Maximum number of tags on one admin
pub const MAX_TAGS: usize = 10;

/// Maximum characters per tag
pub const MAX_TAG_LENGTH: usize = 20;

/// Outcome of validating a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValidation {
    Valid,
    Invalid(Vec<FieldError>),
}

impl FormValidation {
    pub fn check<T: Validate>(form: &T) -> Self {
        match form.validate() {
            Ok(()) => FormValidation::Valid,
            Err(errors) => FormValidation::Invalid(flatten(&errors)),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, FormValidation::Valid)
    }

    pub fn into_result(self) -> Result<(), ConsoleError> {
        match self {
            FormValidation::Valid => Ok(()),
            FormValidation::Invalid(errors) => Err(ConsoleError::Validation(errors)),
        }
    }
}

fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

/// New admin account form
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateAdminForm {
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 64, message = "password must be 8-64 characters"))]
    pub password: String,
    pub role: AdminRole,
}

/// Replacement tag list for an admin
#[derive(Debug, Clone, Serialize, Validate)]
pub struct TagsForm {
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

impl TagsForm {
    /// Trim, drop empties and duplicates, keep first-seen order
    pub fn normalized(tags: &[String]) -> Self {
        let mut out: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.trim();
            if !tag.is_empty() && !out.iter().any(|t| t == tag) {
                out.push(tag.to_string());
            }
        }
        Self { tags: out }
    }
}

fn validate_tags(tags: &Vec<String>) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        let mut err = ValidationError::new("too_many_tags");
        err.message = Some(format!("at most {} tags", MAX_TAGS).into());
        return Err(err);
    }
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LENGTH) {
        let mut err = ValidationError::new("tag_too_long");
        err.message = Some(format!("tags are limited to {} characters", MAX_TAG_LENGTH).into());
        return Err(err);
    }
    Ok(())
}
