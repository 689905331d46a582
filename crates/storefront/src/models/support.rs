//! Support content and submission types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use model2design_core::{Email, FaqId, SupportCategory, SupportSubmissionId, TutorialId, UserId};

/// A support request as stored.
#[derive(Debug, Clone, Serialize)]
pub struct SupportSubmission {
    pub id: SupportSubmissionId,
    pub user_id: Option<UserId>,
    pub category: SupportCategory,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    /// Category specific fields, `None` when the form had none.
    pub additional_data: Option<Map<String, Value>>,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated support request ready to store.
#[derive(Debug, Clone)]
pub struct NewSupportSubmission {
    pub user_id: Option<UserId>,
    pub category: SupportCategory,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    pub additional_data: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tutorial {
    pub id: TutorialId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub content: String,
    pub position: i32,
}
