//! Copy hold endpoint

use axum::{extract::State, Json};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::copy::{BookCopy, CopyStatusQuery},
    AppState,
};

use super::{ApiPath, ApiQuery, AuthenticatedUser};

/// Place (`reserved`) or lift (`available`) a hold on a copy
#[utoipa::path(
    put,
    path = "/copies/{copy_id}",
    tag = "copies",
    security(("bearer_auth" = [])),
    params(("copy_id" = Uuid, Path, description = "Copy ID"), CopyStatusQuery),
    responses(
        (status = 200, description = "Copy updated", body = BookCopy),
        (status = 403, description = "Librarian role required", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_copy_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    ApiPath(copy_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CopyStatusQuery>,
) -> AppResult<Json<BookCopy>> {
    claims.require_librarian()?;

    let copy = state
        .services
        .inventory
        .set_copy_status(copy_id, query.status)
        .await?;
    Ok(Json(copy))
}
