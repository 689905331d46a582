//! Support route handlers: intake forms and help content.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use model2design_core::SupportSubmissionId;
use model2design_core::types::support::{
    Choice, INTENDED_USES, MODEL_PRIORITIES, MODEL_TYPES, SupportCategory,
};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{Faq, Tutorial};
use crate::services::mailer;
use crate::services::support::{self, SupportService};
use crate::state::AppState;

fn service(state: &AppState) -> SupportService<'_> {
    SupportService::new(state.repos().support.as_ref())
}

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub value: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_types: Option<&'static [Choice]>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<CategoryInfo>,
    pub model_types: &'static [Choice],
    pub priorities: &'static [Choice],
    pub intended_uses: &'static [Choice],
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
    pub submission_id: SupportSubmissionId,
}

#[derive(Debug, Serialize)]
pub struct FaqsResponse {
    pub success: bool,
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Serialize)]
pub struct TutorialsResponse {
    pub success: bool,
    pub tutorials: Vec<Tutorial>,
}

#[derive(Debug, Serialize)]
pub struct TutorialResponse {
    pub success: bool,
    pub tutorial: Tutorial,
}

/// Form values as text; numbers and booleans are accepted, nulls ignored.
fn form_fields(body: HashMap<String, Value>) -> HashMap<String, String> {
    body.into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect()
}

/// Categories and the choice lists of their forms.
#[instrument]
pub async fn categories() -> Json<CategoriesResponse> {
    Json(CategoriesResponse {
        success: true,
        categories: SupportCategory::ALL
            .iter()
            .map(|category| CategoryInfo {
                value: category.as_str(),
                label: category.label(),
                issue_types: category.issue_types(),
            })
            .collect(),
        model_types: MODEL_TYPES,
        priorities: MODEL_PRIORITIES,
        intended_uses: INTENDED_USES,
    })
}

/// File a support request in `category`.
#[instrument(skip(state, user, body))]
pub async fn submit(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(category): Path<String>,
    Json(body): Json<HashMap<String, Value>>,
) -> Result<Json<SubmitResponse>> {
    let form = form_fields(body);
    let submission = service(&state)
        .submit(&category, &form, user.map(|u| u.id))
        .await?;

    mailer::send_in_background(
        state.mailer(),
        support::notification(&submission, &state.config().mailer.support_email),
    );

    Ok(Json(SubmitResponse {
        success: true,
        message: "Your support request has been submitted. We'll get back to you soon!",
        submission_id: submission.id,
    }))
}

#[instrument(skip_all)]
pub async fn faqs(State(state): State<AppState>) -> Result<Json<FaqsResponse>> {
    Ok(Json(FaqsResponse {
        success: true,
        faqs: service(&state).faqs().await?,
    }))
}

#[instrument(skip_all)]
pub async fn tutorials(State(state): State<AppState>) -> Result<Json<TutorialsResponse>> {
    Ok(Json(TutorialsResponse {
        success: true,
        tutorials: service(&state).tutorials().await?,
    }))
}

#[instrument(skip(state))]
pub async fn tutorial(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<TutorialResponse>> {
    let tutorial = service(&state)
        .tutorial(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Tutorial not found".to_string()))?;
    Ok(Json(TutorialResponse {
        success: true,
        tutorial,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_form_fields_stringify_values() {
        let body: HashMap<String, Value> = serde_json::from_value(json!({
            "name": "Jane",
            "order_number": 1001,
            "product": null,
        }))
        .unwrap();
        let form = form_fields(body);
        assert_eq!(form.get("name").unwrap(), "Jane");
        assert_eq!(form.get("order_number").unwrap(), "1001");
        assert!(!form.contains_key("product"));
    }
}
