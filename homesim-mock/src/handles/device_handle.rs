use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use homesim_api::restful::DeviceUpdateResponse;
use homesim_api::{Device, DeviceId};
use serde_json::Value;

use crate::errors::ApiError;
use crate::simulate::{HomeError, SharedHome};

#[derive(Clone)]
pub struct DeviceState {
    pub home: SharedHome,
}

pub async fn get_devices(State(state): State<DeviceState>) -> Json<BTreeMap<DeviceId, Device>> {
    Json(state.home.read().await.devices().clone())
}

pub async fn get_device(
    Path(device_id): Path<String>,
    State(state): State<DeviceState>,
) -> Result<Json<Device>, ApiError> {
    let home = state.home.read().await;
    let device = home.get(&device_id).ok_or(HomeError::DeviceNotFound)?;

    Ok(Json(device.clone()))
}

pub async fn set_device(
    Path(device_id): Path<String>,
    State(state): State<DeviceState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DeviceUpdateResponse>, ApiError> {
    let mut home = state.home.write().await;
    if home.get(&device_id).is_none() {
        return Err(HomeError::DeviceNotFound.into());
    }

    let Json(patch) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let device = home.update(&device_id, patch)?;

    Ok(Json(DeviceUpdateResponse {
        message: "Device updated".to_string(),
        device,
    }))
}

pub async fn toggle_device(
    Path(device_id): Path<String>,
    State(state): State<DeviceState>,
) -> Result<Json<DeviceUpdateResponse>, ApiError> {
    let device = state.home.write().await.toggle(&device_id)?;

    Ok(Json(DeviceUpdateResponse {
        message: "Device toggled".to_string(),
        device,
    }))
}

pub async fn turn_on_device(
    Path(device_id): Path<String>,
    State(state): State<DeviceState>,
) -> Result<Json<DeviceUpdateResponse>, ApiError> {
    let device = state.home.write().await.set_power(&device_id, true)?;

    Ok(Json(DeviceUpdateResponse {
        message: "Device turned on".to_string(),
        device,
    }))
}

pub async fn turn_off_device(
    Path(device_id): Path<String>,
    State(state): State<DeviceState>,
) -> Result<Json<DeviceUpdateResponse>, ApiError> {
    let device = state.home.write().await.set_power(&device_id, false)?;

    Ok(Json(DeviceUpdateResponse {
        message: "Device turned off".to_string(),
        device,
    }))
}
