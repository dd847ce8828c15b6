//! Handlers for the day schedule.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use kiosk_core::day_schedule;
use kiosk_core::types::AtmosphereId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TimePeriodView {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Effective atmospheres, read through the mirror source.
    pub atmospheres: Vec<AtmosphereId>,
    /// Set on the back half of the day.
    pub mirror_of: Option<u32>,
    /// Nothing assigned; showing everything.
    pub fell_back: bool,
}

#[derive(Debug, Serialize)]
pub struct DayStatus {
    pub enabled: bool,
    pub current_time_period: u32,
    pub time_periods: BTreeMap<u32, TimePeriodView>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetTimePeriod {
    #[validate(length(max = 100))]
    pub atmospheres: Vec<AtmosphereId>,
}

/// GET /api/day/status
pub async fn day_status(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: build_status(&state).await,
    }))
}

/// POST /api/day/enable
pub async fn enable_day_scheduling(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    set_enabled(&state, true).await
}

/// POST /api/day/disable
pub async fn disable_day_scheduling(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    set_enabled(&state, false).await
}

/// POST /api/day/time-periods/{slot}
///
/// Writes the same atmospheres to the slot's mirror peer.
pub async fn set_time_period(
    State(state): State<AppState>,
    Path(slot): Path<u32>,
    Json(input): Json<SetTimePeriod>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let layout = *state.store.layout();

    state
        .store
        .update(|s| s.set_slot_atmospheres(&layout, slot, input.atmospheres))
        .await?;
    tracing::info!(slot, peer = layout.mirror_peer(slot), "Time period atmospheres updated");

    Ok(Json(DataResponse {
        data: build_status(&state).await,
    }))
}

async fn set_enabled(state: &AppState, enabled: bool) -> AppResult<Json<DataResponse<DayStatus>>> {
    state
        .store
        .update(|s| {
            s.set_day_scheduling(enabled);
            Ok(())
        })
        .await?;
    state.orchestrator.stop(None).await;
    tracing::info!(enabled, "Day scheduling toggled");

    Ok(Json(DataResponse {
        data: build_status(state).await,
    }))
}

pub(crate) async fn build_status(state: &AppState) -> DayStatus {
    let layout = *state.store.layout();
    let now = state.clock.local_time();

    state
        .store
        .read(|settings| {
            let time_periods = layout
                .slot_ids()
                .map(|slot| {
                    let scheduled = day_schedule::slot_atmospheres(settings, &layout, slot);
                    let start_hour = layout.start_hour_of(slot);
                    let view = TimePeriodView {
                        start_hour,
                        end_hour: (start_hour + layout.slot_hours()) % 24,
                        atmospheres: scheduled.atmospheres,
                        mirror_of: (scheduled.source_slot != slot).then_some(scheduled.source_slot),
                        fell_back: scheduled.fell_back,
                    };
                    (slot, view)
                })
                .collect();

            DayStatus {
                enabled: settings.day_scheduling_enabled,
                current_time_period: layout.slot_at(now),
                time_periods,
            }
        })
        .await
}
