//! Manual data entry: body composition, blood pressure and hydration.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::to_u32;
use crate::domains::tools::error::{ToolError, ToolResult};
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{
    sanitize_string, validate_count, validate_date, validate_positive_number,
};
use crate::garmin::{BodyComposition, Operation};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BodyCompositionParams {
    /// Date in YYYY-MM-DD format
    pub date: String,

    /// Weight in kg (must be positive)
    pub weight: f64,

    /// Body fat percentage
    #[serde(default)]
    pub percent_fat: Option<f64>,

    /// Hydration percentage
    #[serde(default)]
    pub percent_hydration: Option<f64>,

    /// Visceral fat mass in kg
    #[serde(default)]
    pub visceral_fat_mass: Option<f64>,

    /// Bone mass in kg
    #[serde(default)]
    pub bone_mass: Option<f64>,

    /// Muscle mass in kg
    #[serde(default)]
    pub muscle_mass: Option<f64>,

    /// Basal metabolic rate in kcal/day
    #[serde(default)]
    pub basal_met: Option<f64>,

    /// Active metabolic rate in kcal/day
    #[serde(default)]
    pub active_met: Option<f64>,

    /// Physique rating (1-9)
    #[serde(default)]
    pub physique_rating: Option<i64>,

    /// Metabolic age in years
    #[serde(default)]
    pub metabolic_age: Option<f64>,

    /// Visceral fat rating
    #[serde(default)]
    pub visceral_fat_rating: Option<i64>,

    /// Body Mass Index
    #[serde(default)]
    pub bmi: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct BloodPressureParams {
    /// Systolic pressure (top number, must be positive)
    pub systolic: i64,

    /// Diastolic pressure (bottom number, must be positive)
    pub diastolic: i64,

    /// Pulse rate (must be positive)
    pub pulse: i64,

    /// Optional notes
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HydrationParams {
    /// Amount of liquid in milliliters
    pub value_in_ml: i64,

    /// Date in YYYY-MM-DD format
    pub cdate: String,

    /// Timestamp in YYYY-MM-DDThh:mm:ss.sss format
    pub timestamp: String,
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .add(
            "add_body_composition",
            "Add body composition data",
            add_body_composition,
        )
        .add(
            "set_blood_pressure",
            "Set blood pressure values",
            set_blood_pressure,
        )
        .add("add_hydration_data", "Add hydration data", add_hydration_data);
}

fn optional_number(value: Option<f64>, name: &str) -> ToolResult<Option<f64>> {
    value
        .map(|v| validate_positive_number(v, name, true))
        .transpose()
}

/// Ratings are stored in a single byte; 255 marks "no value" on the wire.
fn optional_rating(value: Option<i64>, name: &str) -> ToolResult<Option<u8>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = validate_count(value, name, true)?;
    u8::try_from(value)
        .ok()
        .filter(|v| *v < u8::MAX)
        .map(Some)
        .ok_or_else(|| ToolError::validation(format!("{name} must be at most 254, got {value}")))
}

async fn add_body_composition(ctx: ToolContext, p: BodyCompositionParams) -> ToolResult<Value> {
    let date = validate_date(&p.date, "date")?;
    let composition = BodyComposition {
        weight: validate_positive_number(p.weight, "weight", false)?,
        percent_fat: optional_number(p.percent_fat, "percent_fat")?,
        percent_hydration: optional_number(p.percent_hydration, "percent_hydration")?,
        visceral_fat_mass: optional_number(p.visceral_fat_mass, "visceral_fat_mass")?,
        bone_mass: optional_number(p.bone_mass, "bone_mass")?,
        muscle_mass: optional_number(p.muscle_mass, "muscle_mass")?,
        basal_met: optional_number(p.basal_met, "basal_met")?,
        active_met: optional_number(p.active_met, "active_met")?,
        physique_rating: optional_rating(p.physique_rating, "physique_rating")?,
        metabolic_age: optional_number(p.metabolic_age, "metabolic_age")?,
        visceral_fat_rating: optional_rating(p.visceral_fat_rating, "visceral_fat_rating")?,
        bmi: optional_number(p.bmi, "bmi")?,
    };

    ctx.gateway
        .call(Operation::AddBodyComposition { date, composition })
        .await
}

async fn set_blood_pressure(ctx: ToolContext, p: BloodPressureParams) -> ToolResult<Value> {
    let systolic = to_u32(validate_count(p.systolic, "systolic", false)?, "systolic")?;
    let diastolic = to_u32(validate_count(p.diastolic, "diastolic", false)?, "diastolic")?;
    let pulse = to_u32(validate_count(p.pulse, "pulse", false)?, "pulse")?;
    let notes = match p.notes.as_deref() {
        Some(n) if !n.trim().is_empty() => Some(sanitize_string(n, "notes")?),
        _ => None,
    };

    ctx.gateway
        .call(Operation::SetBloodPressure {
            systolic,
            diastolic,
            pulse,
            notes,
        })
        .await
}

async fn add_hydration_data(ctx: ToolContext, p: HydrationParams) -> ToolResult<Value> {
    let value_in_ml = to_u32(validate_count(p.value_in_ml, "value_in_ml", true)?, "value_in_ml")?;
    let cdate = validate_date(&p.cdate, "cdate")?;
    let timestamp = sanitize_string(&p.timestamp, "timestamp")?;

    ctx.gateway
        .call(Operation::AddHydrationData {
            value_in_ml,
            cdate,
            timestamp,
        })
        .await
}
