use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use duet_geo::{haversine_km, valid_coordinates};
use duet_types::Participant;
use duet_types::api::{Claims, LocationSyncRequest};
use duet_types::models::DailyLocation;

use crate::auth::AppState;
use crate::error::{ApiError, blocking, ok};

/// POST /api/location/sync — today's check-in for the current user. One per
/// UTC day; the second attempt is a conflict.
pub async fn sync(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<LocationSyncRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_coordinates(req.latitude, req.longitude) {
        return Err(ApiError::Validation(
            "latitude/longitude are out of range".to_string(),
        ));
    }

    let user = claims.sub;
    let now = Utc::now();
    let today = now.date_naive();
    let location = DailyLocation {
        id: Uuid::new_v4(),
        user_id: user,
        latitude: req.latitude,
        longitude: req.longitude,
        mood_emoji: req.mood_emoji,
        created_at: now,
    };

    let store = state.store.clone();
    let stored = location.clone();
    let partner = blocking(move || {
        if store.location_on_day(user, today)?.is_some() {
            return Err(ApiError::Conflict(
                "you already checked in today".to_string(),
            ));
        }
        store.insert_location(&stored)?;
        Ok(store.location_on_day(user.other(), today)?)
    })
    .await?;

    let (both_synced, distance) = match &partner {
        Some(other) => (
            true,
            Some(haversine_km(
                location.latitude,
                location.longitude,
                other.latitude,
                other.longitude,
            )),
        ),
        None => (false, None),
    };

    let message = match distance {
        Some(km) => format!("today we are {} km apart", km.round() as i64),
        None => "location synced, waiting for your other half...".to_string(),
    };

    Ok(ok(json!({
        "location": location,
        "bothSynced": both_synced,
        "distance": distance.map(|km| km.round() as i64),
        "message": message,
    })))
}

/// GET /api/location/status — today's picture for both participants.
pub async fn status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = claims.sub;
    let today = Utc::now().date_naive();

    let store = state.store.clone();
    let (him, her) = blocking(move || {
        Ok((
            store.location_on_day(Participant::Him, today)?,
            store.location_on_day(Participant::Her, today)?,
        ))
    })
    .await?;

    let him_synced = him.is_some();
    let her_synced = her.is_some();
    let both_synced = him_synced && her_synced;
    let current_user_synced = match user {
        Participant::Him => him_synced,
        Participant::Her => her_synced,
    };

    let distance = match (&him, &her) {
        (Some(h), Some(r)) => Some(haversine_km(h.latitude, h.longitude, r.latitude, r.longitude)),
        _ => None,
    };
    let message = if let Some(km) = distance {
        format!("today we are {} km apart", km.round() as i64)
    } else if current_user_synced {
        format!("waiting for {}...", state.display_name(user.other()))
    } else {
        "where are you today?".to_string()
    };

    Ok(ok(json!({
        "himSynced": him_synced,
        "herSynced": her_synced,
        "bothSynced": both_synced,
        "currentUserSynced": current_user_synced,
        "distance": distance.map(|km| km.round() as i64),
        "distanceMessage": message,
        "himLocation": him,
        "herLocation": her,
    })))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_history_limit() -> u32 {
    30
}

/// GET /api/location/history — per-day distances for days where both
/// checked in, newest first, with aggregate stats over the returned page.
pub async fn history(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.min(100);
    let offset = query.offset;

    let store = state.store.clone();
    let days = blocking(move || Ok(store.paired_location_days(limit, offset)?)).await?;

    let mut distances = Vec::with_capacity(days.len());
    let history: Vec<serde_json::Value> = days
        .into_iter()
        .map(|day| {
            let km = haversine_km(
                day.him.latitude,
                day.him.longitude,
                day.her.latitude,
                day.her.longitude,
            );
            distances.push(km);
            json!({
                "date": day.date,
                "distance": km,
                "himLocation": day.him,
                "herLocation": day.her,
            })
        })
        .collect();

    let stats = if distances.is_empty() {
        json!({
            "averageDistance": 0,
            "minDistance": 0,
            "maxDistance": 0,
            "totalRecords": 0,
        })
    } else {
        let sum: f64 = distances.iter().sum();
        let min = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = distances.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        json!({
            "averageDistance": (sum / distances.len() as f64).round() as i64,
            "minDistance": min.round() as i64,
            "maxDistance": max.round() as i64,
            "totalRecords": distances.len(),
        })
    };

    let has_more = history.len() as u32 == limit;
    Ok(ok(json!({
        "history": history,
        "stats": stats,
        "hasMore": has_more,
    })))
}
