//! Design and image library route handlers.
//!
//! Designs and images belong to the signed-in user or, for guests, to the
//! session's guest id. Lookups by another owner are reported as not found.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use model2design_core::{DesignId, DesignTemplateId};

use crate::error::{AppError, Result};
use crate::middleware::{CurrentBrand, CurrentOwner, RequireAuth};
use crate::models::{
    Design, DesignListQuery, DesignOrder, DesignPage, DesignStats, DesignTemplate,
    ImageLibraryEntry,
};
use crate::services::designs::{DesignService, SaveDesign, ThumbnailUploads};
use crate::services::images::ImageService;
use crate::state::AppState;
use crate::storage::Upload;

fn service<'a>(state: &'a AppState, brand: &CurrentBrand) -> DesignService<'a> {
    DesignService::new(state.repos().designs.as_ref(), state.storage(), brand.0.id)
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Invalid request data: {e}"))
}

async fn read_upload(field: Field<'_>) -> Result<Upload> {
    let filename = field.file_name().unwrap_or("upload").to_owned();
    let content_type = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await.map_err(multipart_error)?;
    Ok(Upload {
        filename,
        content_type,
        bytes: bytes.to_vec(),
    })
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub design_id: DesignId,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DesignResponse {
    pub success: bool,
    pub design: Design,
}

#[derive(Debug, Serialize)]
pub struct DesignListResponse {
    pub success: bool,
    #[serde(flatten)]
    pub page: DesignPage,
    pub stats: DesignStats,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub public: bool,
}

/// Save a design from the editor's multipart form.
#[instrument(skip_all, fields(owner = ?owner))]
pub async fn save(
    State(state): State<AppState>,
    brand: CurrentBrand,
    CurrentOwner(owner): CurrentOwner,
    mut multipart: Multipart,
) -> Result<Json<SaveResponse>> {
    let mut form = SaveDesign::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "thumbnail_front" => form.thumbnails.front = Some(read_upload(field).await?),
            "thumbnail_back" => form.thumbnails.back = Some(read_upload(field).await?),
            "thumbnail_left" => form.thumbnails.left = Some(read_upload(field).await?),
            "thumbnail_right" => form.thumbnails.right = Some(read_upload(field).await?),
            "design_id" | "name" | "product" | "data" | "public" => {
                let value = field.text().await.map_err(multipart_error)?;
                match name.as_str() {
                    "design_id" => form.design_id = Some(value),
                    "name" => form.name = Some(value),
                    "product" => form.product = Some(value),
                    "data" => form.data = Some(value),
                    _ => form.public = value == "1",
                }
            }
            _ => {}
        }
    }
    // Drop empty file parts the browser sends for unset inputs
    let ThumbnailUploads {
        front,
        back,
        left,
        right,
    } = form.thumbnails;
    form.thumbnails = ThumbnailUploads {
        front: front.filter(|u| u.size() > 0),
        back: back.filter(|u| u.size() > 0),
        left: left.filter(|u| u.size() > 0),
        right: right.filter(|u| u.size() > 0),
    };

    let design = service(&state, &brand).save(owner, form).await?;
    Ok(Json(SaveResponse {
        success: true,
        design_id: design.id,
        message: "Design saved successfully!",
    }))
}

/// One page of the caller's designs in this brand, with stats.
#[instrument(skip(state, brand, owner))]
pub async fn index(
    State(state): State<AppState>,
    brand: CurrentBrand,
    CurrentOwner(owner): CurrentOwner,
    Query(query): Query<ListQuery>,
) -> Result<Json<DesignListResponse>> {
    let designs = service(&state, &brand);
    let page = designs
        .list(
            owner,
            DesignListQuery {
                search: query.search,
                order: query
                    .order
                    .as_deref()
                    .map(DesignOrder::parse_lenient)
                    .unwrap_or_default(),
                page: query.page.unwrap_or(1),
            },
        )
        .await?;
    let stats = designs.stats(owner).await?;

    Ok(Json(DesignListResponse {
        success: true,
        page,
        stats,
    }))
}

#[instrument(skip(state, brand, owner))]
pub async fn show(
    State(state): State<AppState>,
    brand: CurrentBrand,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<DesignId>,
) -> Result<Json<DesignResponse>> {
    let design = service(&state, &brand).get_owned(id, owner).await?;
    Ok(Json(DesignResponse {
        success: true,
        design,
    }))
}

/// A public design, readable by anyone.
#[instrument(skip(state, brand))]
pub async fn shared(
    State(state): State<AppState>,
    brand: CurrentBrand,
    Path(id): Path<DesignId>,
) -> Result<Json<DesignResponse>> {
    let design = service(&state, &brand).get_public(id).await?;
    Ok(Json(DesignResponse {
        success: true,
        design,
    }))
}

#[instrument(skip(state, brand, owner))]
pub async fn set_visibility(
    State(state): State<AppState>,
    brand: CurrentBrand,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<DesignId>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<MessageResponse>> {
    service(&state, &brand)
        .set_visibility(id, owner, request.public)
        .await?;
    let message = if request.public {
        "Design is now public"
    } else {
        "Design is now private"
    };
    Ok(Json(MessageResponse {
        success: true,
        message: message.to_string(),
    }))
}

#[instrument(skip(state, brand, owner))]
pub async fn delete(
    State(state): State<AppState>,
    brand: CurrentBrand,
    CurrentOwner(owner): CurrentOwner,
    Path(id): Path<DesignId>,
) -> Result<Json<MessageResponse>> {
    service(&state, &brand).delete(id, owner).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Design deleted successfully".to_string(),
    }))
}

/// Copy a public design into the signed-in user's designs.
#[instrument(skip(state, brand, user), fields(user_id = %user.id))]
pub async fn copy(
    State(state): State<AppState>,
    brand: CurrentBrand,
    RequireAuth(user): RequireAuth,
    Path(id): Path<DesignId>,
) -> Result<Json<SaveResponse>> {
    let copy = service(&state, &brand).copy(id, user.id).await?;
    Ok(Json(SaveResponse {
        success: true,
        design_id: copy.id,
        message: "Design copied successfully!",
    }))
}

// =============================================================================
// Image library
// =============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub images: Vec<ImageLibraryEntry>,
    pub uploaded_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ImageListResponse {
    pub success: bool,
    pub images: Vec<ImageLibraryEntry>,
}

/// Upload one or more images (`images` parts, or a single `image`).
#[instrument(skip_all, fields(owner = ?owner))]
pub async fn upload_images(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut uploads = Vec::new();
    let mut name = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or_default() {
            "images" | "image" => uploads.push(read_upload(field).await?),
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let outcome = images_service(&state)
        .upload(owner, uploads, name.as_deref())
        .await?;
    let error_count = (!outcome.errors.is_empty()).then_some(outcome.errors.len());
    Ok(Json(UploadResponse {
        success: true,
        uploaded_count: outcome.images.len(),
        images: outcome.images,
        errors: error_count.map(|_| outcome.errors),
        error_count,
    }))
}

/// The owner's uploads followed by the brand's library images.
#[instrument(skip_all, fields(owner = ?owner))]
pub async fn list_images(
    State(state): State<AppState>,
    brand: CurrentBrand,
    CurrentOwner(owner): CurrentOwner,
) -> Result<Json<ImageListResponse>> {
    let mut images = images_service(&state).list(owner).await?;
    let brand_images = state.repos().templates.brand_images(brand.0.id).await?;
    images.extend(brand_images.iter().map(|image| image.to_library_entry()));
    Ok(Json(ImageListResponse {
        success: true,
        images,
    }))
}

#[instrument(skip(state, owner))]
pub async fn delete_image(
    State(state): State<AppState>,
    CurrentOwner(owner): CurrentOwner,
    Path(image_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let name = images_service(&state).delete(owner, &image_id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: format!("Image \"{name}\" deleted successfully"),
    }))
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    pub success: bool,
    pub templates: Vec<DesignTemplate>,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub template: DesignTemplate,
}

/// The current brand's active design templates.
#[instrument(skip_all, fields(brand = %brand.0.slug))]
pub async fn templates(
    State(state): State<AppState>,
    brand: CurrentBrand,
) -> Result<Json<TemplateListResponse>> {
    let templates = state
        .repos()
        .templates
        .active_design_templates(brand.0.id)
        .await?;
    Ok(Json(TemplateListResponse {
        success: true,
        templates,
    }))
}

/// One active template of the current brand, to open in the designer.
#[instrument(skip(state, brand), fields(brand = %brand.0.slug))]
pub async fn template(
    State(state): State<AppState>,
    brand: CurrentBrand,
    Path(id): Path<DesignTemplateId>,
) -> Result<Json<TemplateResponse>> {
    let template = state
        .repos()
        .templates
        .active_design_template(id, brand.0.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    Ok(Json(TemplateResponse {
        success: true,
        template,
    }))
}

fn images_service(state: &AppState) -> ImageService<'_> {
    ImageService::new(state.repos().images.as_ref(), state.storage())
}
