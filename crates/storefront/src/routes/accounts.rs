//! Account route handlers.
//!
//! Registration and login both sign the visitor in and hand whatever they
//! built as a guest (cart, designs, images) to the account.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::{Expiry, Session};
use tracing::instrument;

use model2design_core::Owner;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    CurrentBrand, REMEMBER_ME_SECONDS, RequireAuth, clear_current_user, save_guest_cart,
    set_current_user, take_guest_state,
};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthService, Registration, is_safe_redirect};
use crate::services::mailer::{self, Email};
use crate::services::migration::{GuestMigration, MigrationReport};
use crate::state::AppState;

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

#[derive(Debug, Serialize)]
pub struct SignedInResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
    pub redirect: String,
    pub migrated: MigrationReport,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub user: User,
    pub design_count: i64,
    pub member_for: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

// =============================================================================
// Sign in / out
// =============================================================================

/// Put `user` in the session and migrate the guest's data to them.
async fn sign_in(
    state: &AppState,
    session: &Session,
    brand: &CurrentBrand,
    user: &User,
) -> Result<MigrationReport> {
    let (guest, mut cart) = take_guest_state(session).await?;
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    let report = GuestMigration::new(state.repos(), brand.0.id)
        .run(user.id, &mut cart, guest)
        .await;
    if !cart.is_empty() {
        save_guest_cart(session, &cart).await?;
    }
    Ok(report)
}

/// Create an account and sign in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    brand: CurrentBrand,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<SignedInResponse>> {
    let user = AuthService::new(state.repos().users.as_ref())
        .register(&Registration {
            full_name: &request.full_name,
            email: &request.email,
            phone: &request.phone,
            password: &request.password,
            password_confirm: &request.password_confirm,
        })
        .await?;
    let migrated = sign_in(&state, &session, &brand, &user).await?;

    Ok(Json(SignedInResponse {
        success: true,
        message: format!("Welcome, {}! Your account has been created.", user.full_name),
        user,
        redirect: "/".to_string(),
        migrated,
    }))
}

/// Sign in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    brand: CurrentBrand,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SignedInResponse>> {
    let user = AuthService::new(state.repos().users.as_ref())
        .login(&request.email, &request.password)
        .await?;
    let migrated = sign_in(&state, &session, &brand, &user).await?;

    let expiry = if request.remember_me {
        Expiry::OnInactivity(tower_sessions::cookie::time::Duration::seconds(
            REMEMBER_ME_SECONDS,
        ))
    } else {
        Expiry::OnSessionEnd
    };
    session.set_expiry(Some(expiry));

    let redirect = request
        .next
        .filter(|next| is_safe_redirect(next))
        .unwrap_or_else(|| "/".to_string());

    Ok(Json(SignedInResponse {
        success: true,
        message: format!("Welcome back, {}!", user.full_name),
        user,
        redirect,
        migrated,
    }))
}

#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(MessageResponse {
        success: true,
        message: "You have been logged out.",
    }))
}

// =============================================================================
// Profile
// =============================================================================

#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.repos().users.as_ref())
        .get_user(current.id)
        .await?;
    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// Profile with design count and membership length.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    brand: CurrentBrand,
    RequireAuth(current): RequireAuth,
) -> Result<Json<DashboardResponse>> {
    let user = AuthService::new(state.repos().users.as_ref())
        .get_user(current.id)
        .await?;
    let stats = state
        .repos()
        .designs
        .stats(Owner::User(user.id), brand.0.id)
        .await?;

    Ok(Json(DashboardResponse {
        success: true,
        member_for: user.member_duration(Utc::now()),
        design_count: stats.total_designs,
        user,
    }))
}

#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<UserResponse>> {
    let user = AuthService::new(state.repos().users.as_ref())
        .update_profile(
            current.id,
            &request.full_name,
            &request.email,
            &request.phone,
        )
        .await?;
    session
        .insert(
            crate::models::session_keys::CURRENT_USER,
            CurrentUser::from(&user),
        )
        .await?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.repos().users.as_ref())
        .change_password(
            current.id,
            &request.current_password,
            &request.new_password,
            &request.new_password_confirm,
        )
        .await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Your password was successfully updated!",
    }))
}

// =============================================================================
// Password reset
// =============================================================================

/// Start a password reset. Reports success whether or not the account exists.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let reset = AuthService::new(state.repos().users.as_ref())
        .request_password_reset(&request.email)
        .await?;

    if let Some((user, token)) = reset {
        let link = format!(
            "{}/accounts/password/reset?token={}",
            state.config().base_url.trim_end_matches('/'),
            token.token
        );
        mailer::send_in_background(
            state.mailer(),
            Email {
                to: user.email.as_str().to_owned(),
                subject: "Reset your Model2Design password".to_string(),
                text: format!(
                    "Hello {},\n\nUse the link below to choose a new password. \
                     It expires in one hour.\n\n{link}\n\n\
                     If you did not ask for this, you can ignore this email.\n",
                    user.full_name
                ),
            },
        );
    }

    Ok(Json(MessageResponse {
        success: true,
        message: "If an account exists with that email, a password reset link has been sent.",
    }))
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.repos().users.as_ref())
        .reset_password(&request.token, &request.password, &request.password_confirm)
        .await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Your password has been reset. You can now log in.",
    }))
}
