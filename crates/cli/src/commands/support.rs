//! Support submission management.

use model2design_core::SupportSubmissionId;

use super::{CliError, repositories};

/// Mark submission `id` resolved.
///
/// # Errors
///
/// Returns [`CliError::SubmissionNotFound`] when no such submission exists.
pub async fn resolve(id: i32) -> Result<(), CliError> {
    let repos = repositories().await?;
    if !repos.support.resolve(SupportSubmissionId::new(id)).await? {
        return Err(CliError::SubmissionNotFound(id));
    }
    tracing::info!(id, "Support submission resolved");
    Ok(())
}
