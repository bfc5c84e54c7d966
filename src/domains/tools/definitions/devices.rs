//! Device tools.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{FixedTool, or_message, register_fixed};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{resolve_date, sanitize_string};
use crate::garmin::Operation;

const DEVICE_TOOLS: [FixedTool; 4] = [
    (
        "get_devices",
        "Get all Garmin devices associated with the user account",
        || Operation::Devices,
        "No devices found.",
    ),
    (
        "get_device_last_used",
        "Get information about the last used Garmin device",
        || Operation::DeviceLastUsed,
        "No last used device found.",
    ),
    (
        "get_primary_training_device",
        "Get information about the primary training device",
        || Operation::PrimaryTrainingDevice,
        "No primary training device found.",
    ),
    (
        "get_device_alarms",
        "Get alarms from all Garmin devices",
        || Operation::DeviceAlarms,
        "No device alarms found.",
    ),
];

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeviceParams {
    /// Device ID (will be sanitized)
    pub device_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SolarParams {
    /// Device ID (will be sanitized)
    pub device_id: String,

    /// Date in YYYY-MM-DD format (default: today)
    #[serde(default)]
    pub date: Option<String>,
}

pub fn register(registry: &mut ToolRegistry) {
    register_fixed(registry, &DEVICE_TOOLS);
    registry
        .add(
            "get_device_settings",
            "Get settings for a specific Garmin device",
            get_device_settings,
        )
        .add(
            "get_device_solar_data",
            "Get solar data for a specific device",
            get_device_solar_data,
        );
}

async fn get_device_settings(ctx: ToolContext, p: DeviceParams) -> ToolResult<Value> {
    let device_id = sanitize_string(&p.device_id, "device_id")?;
    let settings = ctx
        .gateway
        .call(Operation::DeviceSettings { device_id: device_id.clone() })
        .await?;
    Ok(or_message(settings, || format!("No settings found for device ID {device_id}.")))
}

async fn get_device_solar_data(ctx: ToolContext, p: SolarParams) -> ToolResult<Value> {
    let device_id = sanitize_string(&p.device_id, "device_id")?;
    let date = resolve_date(p.date.as_deref(), "date")?;
    let solar = ctx
        .gateway
        .call(Operation::DeviceSolarData {
            device_id: device_id.clone(),
            date: date.clone(),
        })
        .await?;
    Ok(or_message(solar, || {
        format!("No solar data found for device ID {device_id} on {date}.")
    }))
}
