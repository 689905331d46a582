//! Support intake and help content.
//!
//! Each category has its own form. Submissions are validated against the
//! category's fields, given a subject line built from them, and stored with
//! every extra field in `additional_data`.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use model2design_core::types::support::{
    ACCOUNT_ISSUES, Choice, DESIGN_ISSUES, INTENDED_USES, MODEL_PRIORITIES, MODEL_TYPES,
    ORDER_ISSUES, is_valid_choice,
};
use model2design_core::{Email, SupportCategory, SupportSubmissionId, UserId};

use crate::db::{RepositoryError, SupportRepository};
use crate::models::{Faq, NewSupportSubmission, SupportSubmission, Tutorial};
use crate::services::mailer;

#[derive(Debug, Error)]
pub enum SupportError {
    /// One `Label: problem` entry per invalid field.
    #[error("Please correct the following errors: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One input of a support form.
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    label: &'static str,
    required: bool,
    max_length: Option<usize>,
    choices: Option<&'static [Choice]>,
    default: Option<&'static str>,
}

impl Field {
    const fn text(name: &'static str, label: &'static str, max_length: usize) -> Self {
        Self {
            name,
            label,
            required: true,
            max_length: Some(max_length),
            choices: None,
            default: None,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    const fn select(name: &'static str, label: &'static str, choices: &'static [Choice]) -> Self {
        Self {
            name,
            label,
            required: true,
            max_length: None,
            choices: Some(choices),
            default: None,
        }
    }

    const fn with_default(mut self, value: &'static str) -> Self {
        self.required = false;
        self.default = Some(value);
        self
    }
}

const NAME: Field = Field::text("name", "Name", 255);
const MESSAGE: Field = Field {
    max_length: None,
    ..Field::text("message", "Message", 0)
};

const ORDER_FIELDS: &[Field] = &[
    Field::text("order_number", "Order Number", 50).optional(),
    Field::select("issue_type", "Issue Type", ORDER_ISSUES),
];
const ACCOUNT_FIELDS: &[Field] = &[Field::select("issue_type", "Issue Type", ACCOUNT_ISSUES)];
const DESIGN_FIELDS: &[Field] = &[
    Field::select("issue_type", "Issue Type", DESIGN_ISSUES),
    Field::text("product", "Product", 100).optional(),
    Field::text("browser_info", "Browser Info", 200).optional(),
];
const MODEL_FIELDS: &[Field] = &[
    Field::select("model_type", "Model Type", MODEL_TYPES),
    Field::text("model_name", "Model Name", 255),
    Field::select("priority", "Priority", MODEL_PRIORITIES).with_default("normal"),
    Field::select("intended_use", "Intended Use", INTENDED_USES).with_default("personal"),
];
const WEBSITE_FIELDS: &[Field] = &[
    Field::text("page_url", "Page Url", 255),
    Field::text("browser", "Browser", 100),
    Field::text("device", "Device", 100),
];
const GENERAL_FIELDS: &[Field] = &[Field::text("subject", "Subject", 255)];

const fn category_fields(category: SupportCategory) -> &'static [Field] {
    match category {
        SupportCategory::Orders => ORDER_FIELDS,
        SupportCategory::Account => ACCOUNT_FIELDS,
        SupportCategory::Designing => DESIGN_FIELDS,
        SupportCategory::RequestModel => MODEL_FIELDS,
        SupportCategory::Website => WEBSITE_FIELDS,
        SupportCategory::General => GENERAL_FIELDS,
    }
}

/// Check one field, returning its cleaned value (empty when absent and optional).
fn clean(field: &Field, form: &HashMap<String, String>) -> Result<String, String> {
    let value = form.get(field.name).map_or("", |v| v.trim());
    if value.is_empty() {
        return match field.default {
            Some(default) => Ok(default.to_owned()),
            None if field.required => Err("This field is required.".to_owned()),
            None => Ok(String::new()),
        };
    }
    if let Some(max) = field.max_length {
        let length = value.chars().count();
        if length > max {
            return Err(format!(
                "Ensure this value has at most {max} characters (it has {length})."
            ));
        }
    }
    if let Some(choices) = field.choices
        && !is_valid_choice(choices, value)
    {
        return Err(format!(
            "Select a valid choice. {value} is not one of the available choices."
        ));
    }
    Ok(value.to_owned())
}

/// Upper-case the first letter, `high` to `High`.
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect()
    })
}

/// Subject line for a submission, built from its category fields.
fn subject(category: SupportCategory, fields: &HashMap<&'static str, String>) -> String {
    let get = |name: &str| fields.get(name).map_or("", String::as_str);
    match category {
        SupportCategory::Orders => {
            let issue = get("issue_type");
            match get("order_number") {
                "" => format!("Order Support - {issue}"),
                order => format!("Order Support - {issue} (Order: {order})"),
            }
        }
        SupportCategory::Account => format!("Account Support - {}", get("issue_type")),
        SupportCategory::Designing => {
            let issue = get("issue_type");
            match get("product") {
                "" => format!("Design Support - {issue}"),
                product => format!("Design Support - {issue} ({product})"),
            }
        }
        SupportCategory::RequestModel => format!(
            "Model Request - {} ({}) - Priority: {}",
            get("model_name"),
            get("model_type"),
            title_case(get("priority"))
        ),
        SupportCategory::Website => {
            format!("Website Problem - {} ({})", get("page_url"), get("browser"))
        }
        SupportCategory::General => get("subject").to_owned(),
    }
}

/// Validate a support form into a submission.
///
/// An unknown `category` is handled as general.
///
/// # Errors
///
/// Returns `SupportError::Invalid` listing every invalid field.
pub fn validate(
    category: &str,
    form: &HashMap<String, String>,
    user: Option<UserId>,
) -> Result<NewSupportSubmission, SupportError> {
    let category = SupportCategory::parse_lenient(category);
    let mut errors = Vec::new();

    let name = clean(&NAME, form).map_err(|e| errors.push(format!("{}: {e}", NAME.label)));
    let email = match form.get("email").map_or("", |v| v.trim()) {
        "" => {
            errors.push("Email: This field is required.".to_owned());
            None
        }
        raw => Email::parse(raw)
            .map_err(|_| errors.push("Email: Enter a valid email address.".to_owned()))
            .ok(),
    };
    let message = clean(&MESSAGE, form).map_err(|e| errors.push(format!("{}: {e}", MESSAGE.label)));

    let mut extra = HashMap::new();
    for field in category_fields(category) {
        match clean(field, form) {
            Ok(value) => {
                extra.insert(field.name, value);
            }
            Err(e) => errors.push(format!("{}: {e}", field.label)),
        }
    }

    let (Ok(name), Some(email), Ok(message)) = (name, email, message) else {
        return Err(SupportError::Invalid(errors));
    };
    if !errors.is_empty() {
        return Err(SupportError::Invalid(errors));
    }

    let subject = subject(category, &extra);
    let additional_data: Map<String, Value> = extra
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_owned(), Value::String(value)))
        .collect();

    Ok(NewSupportSubmission {
        user_id: user,
        category,
        name,
        email,
        subject,
        message,
        additional_data: (!additional_data.is_empty()).then_some(additional_data),
    })
}

/// Email telling the support team about a new submission.
#[must_use]
pub fn notification(submission: &SupportSubmission, support_email: &str) -> mailer::Email {
    let mut text = format!(
        "New {} support request #{}\n\nFrom: {} <{}>\nSubject: {}\n\n{}\n",
        submission.category.label(),
        submission.id,
        submission.name,
        submission.email,
        submission.subject,
        submission.message,
    );
    if let Some(data) = &submission.additional_data {
        text.push('\n');
        for (key, value) in data {
            let value = value.as_str().map_or_else(|| value.to_string(), str::to_owned);
            text.push_str(&format!("{key}: {value}\n"));
        }
    }
    mailer::Email {
        to: support_email.to_owned(),
        subject: format!("[Support] {}", submission.subject),
        text,
    }
}

/// Support submissions and help content.
pub struct SupportService<'a> {
    support: &'a dyn SupportRepository,
}

impl<'a> SupportService<'a> {
    #[must_use]
    pub const fn new(support: &'a dyn SupportRepository) -> Self {
        Self { support }
    }

    /// Validate and store a support request.
    ///
    /// # Errors
    ///
    /// Returns `SupportError::Invalid` for a bad form.
    pub async fn submit(
        &self,
        category: &str,
        form: &HashMap<String, String>,
        user: Option<UserId>,
    ) -> Result<SupportSubmission, SupportError> {
        let submission = validate(category, form, user)?;
        let stored = self.support.create(&submission).await?;
        tracing::info!(
            submission_id = %stored.id,
            category = %stored.category,
            "Support request submitted"
        );
        Ok(stored)
    }

    /// Returns whether the submission exists.
    ///
    /// # Errors
    ///
    /// Returns `SupportError::Repository` if the database operation fails.
    pub async fn resolve(&self, id: SupportSubmissionId) -> Result<bool, SupportError> {
        Ok(self.support.resolve(id).await?)
    }

    /// # Errors
    ///
    /// Returns `SupportError::Repository` if the database operation fails.
    pub async fn faqs(&self) -> Result<Vec<Faq>, SupportError> {
        Ok(self.support.active_faqs().await?)
    }

    /// # Errors
    ///
    /// Returns `SupportError::Repository` if the database operation fails.
    pub async fn tutorials(&self) -> Result<Vec<Tutorial>, SupportError> {
        Ok(self.support.active_tutorials().await?)
    }

    /// # Errors
    ///
    /// Returns `SupportError::Repository` if the database operation fails.
    pub async fn tutorial(&self, slug: &str) -> Result<Option<Tutorial>, SupportError> {
        Ok(self.support.tutorial_by_slug(slug).await?)
    }
}
