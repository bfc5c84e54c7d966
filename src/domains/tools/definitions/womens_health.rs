//! Pregnancy and menstrual cycle tools.

use serde_json::Value;

use super::common::{DateRangeParams, FixedTool, RequiredDateParams, or_message, register_fixed};
use crate::domains::tools::error::ToolResult;
use crate::domains::tools::registry::{ToolContext, ToolRegistry};
use crate::domains::tools::validation::{validate_date, validate_date_range};
use crate::garmin::Operation;

const SUMMARY_TOOLS: [FixedTool; 1] = [(
    "get_pregnancy_summary",
    "Get pregnancy summary data",
    || Operation::PregnancySummary,
    "No pregnancy summary data found.",
)];

pub fn register(registry: &mut ToolRegistry) {
    register_fixed(registry, &SUMMARY_TOOLS);

    registry
        .add(
            "get_menstrual_data_for_date",
            "Get menstrual data for a specific date",
            get_menstrual_data_for_date,
        )
        .add(
            "get_menstrual_calendar_data",
            "Get menstrual calendar data between specified dates",
            get_menstrual_calendar_data,
        );
}

async fn get_menstrual_data_for_date(ctx: ToolContext, p: RequiredDateParams) -> ToolResult<Value> {
    let date = validate_date(&p.date, "date")?;
    let data = ctx
        .gateway
        .call(Operation::MenstrualDataForDate { date: date.clone() })
        .await?;
    Ok(or_message(data, || format!("No menstrual data found for {date}.")))
}

async fn get_menstrual_calendar_data(ctx: ToolContext, p: DateRangeParams) -> ToolResult<Value> {
    let (start_date, end_date) = validate_date_range(&p.start_date, &p.end_date)?;
    let data = ctx
        .gateway
        .call(Operation::MenstrualCalendarData {
            start_date: start_date.clone(),
            end_date: end_date.clone(),
        })
        .await?;
    Ok(or_message(data, || {
        format!("No menstrual calendar data found between {start_date} and {end_date}.")
    }))
}

#[cfg(test)]
mod tests {
    use crate::domains::tools::definitions::test_support::{call, registry_with};
    use crate::garmin::testing::FakeConnect;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_messages() {
        let registry = registry_with(FakeConnect::returning(json!({})));

        assert_eq!(
            call(&registry, "get_pregnancy_summary", json!({})).await,
            "No pregnancy summary data found."
        );
        assert_eq!(
            call(&registry, "get_menstrual_data_for_date", json!({"date": "2024-02-10"})).await,
            "No menstrual data found for 2024-02-10."
        );
        assert_eq!(
            call(
                &registry,
                "get_menstrual_calendar_data",
                json!({"start_date": "2024-02-01", "end_date": "2024-02-28"})
            )
            .await,
            "No menstrual calendar data found between 2024-02-01 and 2024-02-28."
        );
    }

    #[tokio::test]
    async fn test_calendar_range_checked() {
        let fake = FakeConnect::returning(json!({}));
        let registry = registry_with(fake.clone());

        let out = call(
            &registry,
            "get_menstrual_calendar_data",
            json!({"start_date": "2024-03-01", "end_date": "2024-02-01"}),
        )
        .await;
        assert_eq!(
            out,
            "Error: start_date (2024-03-01) must be less than or equal to end_date (2024-02-01)"
        );
        assert!(fake.calls().is_empty());
    }
}
