//! Admin command handler.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::admin::AdminCommand;
use crate::concurrency::extract_user_id;
use crate::error::ApiError;
use crate::schema::admin::AdminResponse;
use crate::state::AppState;

/// `POST /admin` with body `{"action": ..., "arg": ...}`
pub async fn execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(command): Json<AdminCommand>,
) -> Result<Json<AdminResponse>, ApiError> {
    let caller = extract_user_id(&headers)?;
    let outcome = state.admin.execute(&caller, command)?;
    Ok(Json(AdminResponse {
        success: true,
        outcome,
    }))
}
