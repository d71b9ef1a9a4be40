use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// GET /media/{id} — serve an uploaded blob with the content type recorded
/// at upload time.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let media = blocking(move || {
        store
            .media(id)?
            .ok_or_else(|| ApiError::NotFound("media not found".to_string()))
    })
    .await?;

    let bytes = match state.media.read(id).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("media not found".to_string()));
        }
        Err(e) => return Err(ApiError::Internal(e.into())),
    };

    Ok(([(header::CONTENT_TYPE, media.content_type)], bytes))
}
