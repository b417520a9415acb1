//! Session migration handler
//!
//! Called by the auth layer once login or registration completes, to drain
//! the caller's anonymous session into their permanent library.

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::AppState;
use litkeep_common::{
    auth::AuthContext,
    db::Repository,
    errors::{AppError, Result},
    services::{MigrationReport, MigrationService},
};

#[derive(Debug, Deserialize, Validate)]
pub struct MigrateSessionRequest {
    /// The anonymous session the caller was using before authenticating
    #[validate(length(min = 1, max = 255))]
    pub session_id: String,
}

/// Migrate the given temp session into the authenticated user's library
pub async fn migrate_session(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<MigrateSessionRequest>,
) -> Result<Json<MigrationReport>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let service = MigrationService::new(Repository::new(state.db.clone()));
    let report = service
        .migrate_session(&request.session_id, auth.user_id)
        .await?;

    Ok(Json(report))
}
