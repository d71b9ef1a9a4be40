use axum::{
    Extension,
    extract::{Multipart, Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use duet_types::api::Claims;
use duet_types::models::{MediaObject, Memory};

use crate::auth::AppState;
use crate::error::{ApiError, blocking, ok, ok_with_message};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const MAX_DESCRIPTION_CHARS: usize = 300;

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
    "image/tiff",
    "image/tif",
];

#[derive(Debug, Deserialize)]
pub struct MemoryListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    20
}

/// GET /api/memories — the album feed with stats, newest first.
pub async fn list_memories(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<MemoryListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(100).max(1);
    let offset = query.offset;

    let store = state.store.clone();
    let (entries, total) = blocking(move || {
        Ok((store.list_memories(limit, offset)?, store.count_memories()?))
    })
    .await?;

    let has_more = entries.len() as u32 == limit;
    let memories: Vec<serde_json::Value> = entries
        .into_iter()
        .map(|entry| {
            let uploader = state.display_name(entry.memory.user_id).to_string();
            let mut value = serde_json::to_value(entry)
                .map_err(|e| ApiError::Internal(e.into()))?;
            value["uploader_name"] = json!(uploader);
            Ok(value)
        })
        .collect::<Result<_, ApiError>>()?;

    Ok(ok(json!({
        "memories": memories,
        "total": total,
        "hasMore": has_more,
        "currentPage": offset / limit + 1,
        "totalPages": total.div_ceil(limit as u64),
    })))
}

/// POST /api/memories/upload — multipart `file` + `description`. The blob
/// goes to the media dir; the row failure path removes it again.
pub async fn upload_memory(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("failed to read upload: {}", e)))?;
                file = Some((content_type, bytes.to_vec()));
            }
            Some("description") => {
                description = Some(field.text().await.map_err(|e| {
                    ApiError::Validation(format!("failed to read description: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let (content_type, bytes) =
        file.ok_or_else(|| ApiError::Validation("please choose an image".to_string()))?;
    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::Validation(
            "supported formats: JPG, PNG, GIF, WebP, BMP, SVG, TIFF".to_string(),
        ));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation(
            "image cannot be larger than 10 MB".to_string(),
        ));
    }

    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::Validation("please describe this moment".to_string()))?;
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ApiError::Validation(format!(
            "description cannot exceed {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }

    let now = Utc::now();
    let media = MediaObject {
        id: Uuid::new_v4(),
        owner_id: claims.sub,
        content_type,
        size_bytes: bytes.len() as u64,
        created_at: now,
    };
    let memory = Memory {
        id: Uuid::new_v4(),
        user_id: claims.sub,
        image_url: format!("/media/{}", media.id),
        description,
        created_at: now,
    };

    state
        .media
        .save(media.id, &bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let store = state.store.clone();
    let media_id = media.id;
    let stored = memory.clone();
    let inserted = blocking(move || {
        store.insert_media(&media)?;
        store.insert_memory(&stored)?;
        Ok(())
    })
    .await;

    if let Err(e) = inserted {
        // Don't leave an orphaned blob behind.
        state.media.remove(media_id).await;
        return Err(e);
    }

    Ok(ok_with_message(
        json!({ "memory": memory }),
        "added to our album",
    ))
}
