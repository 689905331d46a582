//! Support submission and help content repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use model2design_core::{Email, FaqId, SupportCategory, SupportSubmissionId, TutorialId, UserId};

use super::{RepositoryError, decode_json};
use crate::models::{Faq, NewSupportSubmission, SupportSubmission, Tutorial};

/// Storage for support requests, FAQs, and tutorials.
#[async_trait]
pub trait SupportRepository: Send + Sync {
    async fn create(
        &self,
        submission: &NewSupportSubmission,
    ) -> Result<SupportSubmission, RepositoryError>;

    async fn get(
        &self,
        id: SupportSubmissionId,
    ) -> Result<Option<SupportSubmission>, RepositoryError>;

    /// Mark a submission resolved. Returns whether it exists.
    async fn resolve(&self, id: SupportSubmissionId) -> Result<bool, RepositoryError>;

    /// Active FAQs by position.
    async fn active_faqs(&self) -> Result<Vec<Faq>, RepositoryError>;

    /// Active tutorials by position.
    async fn active_tutorials(&self) -> Result<Vec<Tutorial>, RepositoryError>;

    async fn tutorial_by_slug(&self, slug: &str) -> Result<Option<Tutorial>, RepositoryError>;
}

#[derive(FromRow)]
struct SubmissionRow {
    id: i32,
    user_id: Option<i32>,
    category: SupportCategory,
    name: String,
    email: String,
    subject: String,
    message: String,
    additional_data: Option<serde_json::Value>,
    is_resolved: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for SupportSubmission {
    type Error = RepositoryError;

    fn try_from(r: SubmissionRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let additional_data = r
            .additional_data
            .map(|value| decode_json(value, "additional data"))
            .transpose()?;
        Ok(Self {
            id: SupportSubmissionId::new(r.id),
            user_id: r.user_id.map(UserId::new),
            category: r.category,
            name: r.name,
            email,
            subject: r.subject,
            message: r.message,
            additional_data,
            is_resolved: r.is_resolved,
            created_at: r.created_at,
        })
    }
}

#[derive(FromRow)]
struct FaqRow {
    id: i32,
    question: String,
    answer: String,
    position: i32,
}

#[derive(FromRow)]
struct TutorialRow {
    id: i32,
    title: String,
    slug: String,
    description: String,
    content: String,
    position: i32,
}

impl From<TutorialRow> for Tutorial {
    fn from(r: TutorialRow) -> Self {
        Self {
            id: TutorialId::new(r.id),
            title: r.title,
            slug: r.slug,
            description: r.description,
            content: r.content,
            position: r.position,
        }
    }
}

const SUBMISSION_COLUMNS: &str = "id, user_id, category, name, email, subject, message, \
     additional_data, is_resolved, created_at";

/// `PostgreSQL` support repository.
pub struct PgSupportRepository {
    pool: PgPool,
}

impl PgSupportRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupportRepository for PgSupportRepository {
    async fn create(
        &self,
        submission: &NewSupportSubmission,
    ) -> Result<SupportSubmission, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO storefront.support_submission
                (user_id, category, name, email, subject, message, additional_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {SUBMISSION_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(submission.user_id.map(|id| id.as_i32()))
            .bind(submission.category)
            .bind(&submission.name)
            .bind(submission.email.as_str())
            .bind(&submission.subject)
            .bind(&submission.message)
            .bind(
                submission
                    .additional_data
                    .clone()
                    .map(serde_json::Value::Object),
            )
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get(
        &self,
        id: SupportSubmissionId,
    ) -> Result<Option<SupportSubmission>, RepositoryError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM storefront.support_submission WHERE id = $1"
        );
        let row = sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?;
        row.map(SupportSubmission::try_from).transpose()
    }

    async fn resolve(&self, id: SupportSubmissionId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE storefront.support_submission SET is_resolved = TRUE WHERE id = $1")
                .bind(id.as_i32())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_faqs(&self) -> Result<Vec<Faq>, RepositoryError> {
        let rows = sqlx::query_as::<_, FaqRow>(
            r"
            SELECT id, question, answer, position
            FROM storefront.faq
            WHERE is_active
            ORDER BY position, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Faq {
                id: FaqId::new(r.id),
                question: r.question,
                answer: r.answer,
                position: r.position,
            })
            .collect())
    }

    async fn active_tutorials(&self) -> Result<Vec<Tutorial>, RepositoryError> {
        let rows = sqlx::query_as::<_, TutorialRow>(
            r"
            SELECT id, title, slug, description, content, position
            FROM storefront.tutorial
            WHERE is_active
            ORDER BY position, id
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Tutorial::from).collect())
    }

    async fn tutorial_by_slug(&self, slug: &str) -> Result<Option<Tutorial>, RepositoryError> {
        let row = sqlx::query_as::<_, TutorialRow>(
            r"
            SELECT id, title, slug, description, content, position
            FROM storefront.tutorial
            WHERE slug = $1 AND is_active
            ",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Tutorial::from))
    }
}
