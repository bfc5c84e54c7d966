//! Every Garmin Connect call the server can make.
//!
//! Tool handlers build an [`Operation`] from validated parameters and hand it
//! to the gateway. The client matches on it to pick an endpoint, so adding a
//! call means adding a variant here and an arm in the client.

use std::path::PathBuf;

use serde_json::Value;

use super::fit::BodyComposition;

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    // Activities
    Activities { start: u32, limit: u32 },
    ActivitiesByDate { start_date: String, end_date: String, activity_type: Option<String> },
    ActivitiesForDate { date: String },
    Activity { activity_id: i64 },
    ActivitySplits { activity_id: i64 },
    ActivityTypedSplits { activity_id: i64 },
    ActivitySplitSummaries { activity_id: i64 },
    ActivityWeather { activity_id: i64 },
    ActivityHrInTimezones { activity_id: i64 },
    ActivityGear { activity_id: i64 },
    ActivityExerciseSets { activity_id: i64 },

    // Health and wellness
    Stats { date: String },
    UserSummary { date: String },
    BodyComposition { start_date: String, end_date: Option<String> },
    StatsAndBody { date: String },
    StepsData { date: String },
    DailySteps { start_date: String, end_date: String },
    TrainingReadiness { date: String },
    BodyBattery { start_date: String, end_date: String },
    BodyBatteryEvents { date: String },
    BloodPressure { start_date: String, end_date: String },
    Floors { date: String },
    TrainingStatus { date: String },
    RhrDay { date: String },
    HeartRates { date: String },
    HydrationData { date: String },
    SleepData { date: String },
    StressData { date: String },
    RespirationData { date: String },
    Spo2Data { date: String },
    AllDayStress { date: String },
    AllDayEvents { date: String },

    // Profile
    FullName,
    UnitSystem,
    UserProfile,
    UserProfileSettings,

    // Devices
    Devices,
    DeviceLastUsed,
    DeviceSettings { device_id: String },
    PrimaryTrainingDevice,
    DeviceSolarData { device_id: String, date: String },
    DeviceAlarms,

    // Gear
    Gear { user_profile_id: String },
    GearDefaults { user_profile_id: String },
    GearStats { gear_uuid: String },

    // Weight
    WeighIns { start_date: String, end_date: String },
    DailyWeighIns { date: String },
    DeleteWeighIns { date: String, delete_all: bool },
    AddWeighIn { weight: f64, unit_key: String },
    AddWeighInWithTimestamps {
        weight: f64,
        unit_key: String,
        date_timestamp: String,
        gmt_timestamp: String,
    },

    // Challenges and badges
    Goals { goal_type: String },
    PersonalRecord,
    EarnedBadges,
    AdhocChallenges { start: u32, limit: u32 },
    AvailableBadgeChallenges { start: u32, limit: u32 },
    BadgeChallenges { start: u32, limit: u32 },
    NonCompletedBadgeChallenges { start: u32, limit: u32 },
    RacePredictions,
    InProgressVirtualChallenges { start_date: String, end_date: String },

    // Training
    ProgressSummary { start_date: String, end_date: String, metric: String },
    HillScore { start_date: String, end_date: String },
    EnduranceScore { start_date: String, end_date: String },
    TrainingEffect { activity_id: i64 },
    MaxMetrics { date: String },
    HrvData { date: String },
    FitnessAgeData { date: String },
    RequestReload { date: String },

    // Workouts
    Workouts,
    WorkoutById { workout_id: i64 },
    DownloadWorkout { workout_id: i64 },
    UploadWorkout { workout: Value },
    UploadActivity { path: PathBuf },
    GraphQl { query: Value },

    // Data entry
    AddBodyComposition { date: String, composition: BodyComposition },
    SetBloodPressure { systolic: u32, diastolic: u32, pulse: u32, notes: Option<String> },
    AddHydrationData { value_in_ml: u32, cdate: String, timestamp: String },

    // Women's health
    PregnancySummary,
    MenstrualDataForDate { date: String },
    MenstrualCalendarData { start_date: String, end_date: String },
}

impl Operation {
    /// Stable name used in log lines.
    pub fn method_name(&self) -> &'static str {
        use Operation::*;

        match self {
            Activities { .. } => "get_activities",
            ActivitiesByDate { .. } => "get_activities_by_date",
            ActivitiesForDate { .. } => "get_activities_fordate",
            Activity { .. } => "get_activity",
            ActivitySplits { .. } => "get_activity_splits",
            ActivityTypedSplits { .. } => "get_activity_typed_splits",
            ActivitySplitSummaries { .. } => "get_activity_split_summaries",
            ActivityWeather { .. } => "get_activity_weather",
            ActivityHrInTimezones { .. } => "get_activity_hr_in_timezones",
            ActivityGear { .. } => "get_activity_gear",
            ActivityExerciseSets { .. } => "get_activity_exercise_sets",
            Stats { .. } => "get_stats",
            UserSummary { .. } => "get_user_summary",
            BodyComposition { .. } => "get_body_composition",
            StatsAndBody { .. } => "get_stats_and_body",
            StepsData { .. } => "get_steps_data",
            DailySteps { .. } => "get_daily_steps",
            TrainingReadiness { .. } => "get_training_readiness",
            BodyBattery { .. } => "get_body_battery",
            BodyBatteryEvents { .. } => "get_body_battery_events",
            BloodPressure { .. } => "get_blood_pressure",
            Floors { .. } => "get_floors",
            TrainingStatus { .. } => "get_training_status",
            RhrDay { .. } => "get_rhr_day",
            HeartRates { .. } => "get_heart_rates",
            HydrationData { .. } => "get_hydration_data",
            SleepData { .. } => "get_sleep_data",
            StressData { .. } => "get_stress_data",
            RespirationData { .. } => "get_respiration_data",
            Spo2Data { .. } => "get_spo2_data",
            AllDayStress { .. } => "get_all_day_stress",
            AllDayEvents { .. } => "get_all_day_events",
            FullName => "get_full_name",
            UnitSystem => "get_unit_system",
            UserProfile => "get_user_profile",
            UserProfileSettings => "get_userprofile_settings",
            Devices => "get_devices",
            DeviceLastUsed => "get_device_last_used",
            DeviceSettings { .. } => "get_device_settings",
            PrimaryTrainingDevice => "get_primary_training_device",
            DeviceSolarData { .. } => "get_device_solar_data",
            DeviceAlarms => "get_device_alarms",
            Gear { .. } => "get_gear",
            GearDefaults { .. } => "get_gear_defaults",
            GearStats { .. } => "get_gear_stats",
            WeighIns { .. } => "get_weigh_ins",
            DailyWeighIns { .. } => "get_daily_weigh_ins",
            DeleteWeighIns { .. } => "delete_weigh_ins",
            AddWeighIn { .. } => "add_weigh_in",
            AddWeighInWithTimestamps { .. } => "add_weigh_in_with_timestamps",
            Goals { .. } => "get_goals",
            PersonalRecord => "get_personal_record",
            EarnedBadges => "get_earned_badges",
            AdhocChallenges { .. } => "get_adhoc_challenges",
            AvailableBadgeChallenges { .. } => "get_available_badge_challenges",
            BadgeChallenges { .. } => "get_badge_challenges",
            NonCompletedBadgeChallenges { .. } => "get_non_completed_badge_challenges",
            RacePredictions => "get_race_predictions",
            InProgressVirtualChallenges { .. } => "get_inprogress_virtual_challenges",
            ProgressSummary { .. } => "get_progress_summary_between_dates",
            HillScore { .. } => "get_hill_score",
            EnduranceScore { .. } => "get_endurance_score",
            TrainingEffect { .. } => "get_training_effect",
            MaxMetrics { .. } => "get_max_metrics",
            HrvData { .. } => "get_hrv_data",
            FitnessAgeData { .. } => "get_fitnessage_data",
            RequestReload { .. } => "request_reload",
            Workouts => "get_workouts",
            WorkoutById { .. } => "get_workout_by_id",
            DownloadWorkout { .. } => "download_workout",
            UploadWorkout { .. } => "upload_workout",
            UploadActivity { .. } => "upload_activity",
            GraphQl { .. } => "query_garmin_graphql",
            AddBodyComposition { .. } => "add_body_composition",
            SetBloodPressure { .. } => "set_blood_pressure",
            AddHydrationData { .. } => "add_hydration_data",
            PregnancySummary => "get_pregnancy_summary",
            MenstrualDataForDate { .. } => "get_menstrual_data_for_date",
            MenstrualCalendarData { .. } => "get_menstrual_calendar_data",
        }
    }

    /// Whether the call changes data on the account.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::DeleteWeighIns { .. }
                | Self::AddWeighIn { .. }
                | Self::AddWeighInWithTimestamps { .. }
                | Self::RequestReload { .. }
                | Self::UploadWorkout { .. }
                | Self::UploadActivity { .. }
                | Self::AddBodyComposition { .. }
                | Self::SetBloodPressure { .. }
                | Self::AddHydrationData { .. }
        )
    }
}
