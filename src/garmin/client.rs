//! Blocking Garmin Connect API client.
//!
//! [`GarminConnect`] owns an authenticated session and maps each
//! [`Operation`] onto its Connect endpoint. Bearer tokens are refreshed
//! through the OAuth1 exchange when they expire or are rejected, and the
//! refreshed session is written back to the token store.

use std::borrow::Cow;
use std::path::Path;
use std::sync::{OnceLock, PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Local, NaiveDate, NaiveTime, TimeZone, Utc};
use reqwest::Method;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use super::api::ConnectApi;
use super::error::{ConnectError, ConnectResult};
use super::fit::{BodyComposition, encode_weight_scale};
use super::oauth::{self, Consumer};
use super::operation::Operation;
use super::tokens::{TokenStore, Tokens};

const API_USER_AGENT: &str = "GCM-iOS-5.7.2.1";
const ACTIVITY_PAGE_SIZE: u32 = 20;
const GOAL_PAGE_SIZE: u32 = 30;
const MAX_ERROR_BODY: usize = 300;

/// Base URLs of the Garmin services for one Garmin domain.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub domain: String,
    pub connect_api: String,
    pub sso: String,
}

impl Endpoints {
    pub fn for_domain(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            connect_api: format!("https://connectapi.{domain}"),
            sso: format!("https://sso.{domain}/sso"),
        }
    }

    /// Every service on one local base URL.
    #[cfg(test)]
    pub fn local(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            domain: "garmin.com".to_string(),
            connect_api: base.to_string(),
            sso: format!("{base}/sso"),
        }
    }

    pub fn sso_embed(&self) -> String {
        format!("{}/embed", self.sso)
    }
}

/// Request body variants. Borrowed so a request can be rebuilt for a retry.
enum Payload<'a> {
    Empty,
    Json(&'a Value),
    File { name: &'a str, bytes: &'a [u8] },
}

type Query<'a> = [(&'a str, String)];

pub struct GarminConnect {
    http: Client,
    endpoints: Endpoints,
    consumer: Consumer,
    tokens: RwLock<Tokens>,
    store: Option<TokenStore>,
    profile: OnceLock<Value>,
}

impl GarminConnect {
    pub fn new(
        http: Client,
        endpoints: Endpoints,
        consumer: Consumer,
        tokens: Tokens,
        store: Option<TokenStore>,
    ) -> Self {
        Self {
            http,
            endpoints,
            consumer,
            tokens: RwLock::new(tokens),
            store,
            profile: OnceLock::new(),
        }
    }

    /// Current session tokens.
    pub fn tokens(&self) -> Tokens {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load the social profile. Succeeds only with a working session, so it
    /// doubles as the session check after restore or login.
    pub fn load_profile(&self) -> ConnectResult<&Value> {
        if let Some(profile) = self.profile.get() {
            return Ok(profile);
        }
        let profile = self.get("/userprofile-service/socialProfile", &[])?;
        if !profile.is_object() {
            return Err(ConnectError::invalid_response(
                "social profile is not a JSON object",
            ));
        }
        Ok(self.profile.get_or_init(|| profile))
    }

    fn display_name(&self) -> ConnectResult<String> {
        self.load_profile()?
            .get("displayName")
            .and_then(Value::as_str)
            .ok_or_else(|| ConnectError::invalid_response("social profile has no displayName"))
            .and_then(|name| path_segment(name, "displayName").map(Cow::into_owned))
    }

    fn bearer(&self) -> ConnectResult<String> {
        let current = {
            let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
            if !tokens.oauth2.expired() {
                return Ok(tokens.oauth2.access_token.clone());
            }
            tokens.oauth2.access_token.clone()
        };
        info!("OAuth2 token expired, refreshing");
        self.refresh(&current)
    }

    /// Replace the bearer token, unless another caller already replaced
    /// `stale`.
    fn refresh(&self, stale: &str) -> ConnectResult<String> {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        if tokens.oauth2.access_token != stale {
            return Ok(tokens.oauth2.access_token.clone());
        }

        let oauth2 = oauth::exchange(&self.http, &self.endpoints, &self.consumer, &tokens.oauth1)?;
        tokens.oauth2 = oauth2;
        if let Some(store) = &self.store
            && let Err(e) = store.save(&tokens)
        {
            warn!("Could not save refreshed tokens to {}: {}", store.dir().display(), e);
        }
        Ok(tokens.oauth2.access_token.clone())
    }

    fn build(
        &self,
        method: &Method,
        path: &str,
        query: &Query<'_>,
        payload: &Payload<'_>,
        token: &str,
    ) -> ConnectResult<RequestBuilder> {
        let url = format!("{}{}", self.endpoints.connect_api, path);
        let request = self
            .http
            .request(method.clone(), url)
            .query(query)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, API_USER_AGENT);

        Ok(match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(body),
            Payload::File { name, bytes } => {
                let part = Part::bytes(bytes.to_vec())
                    .file_name(name.to_string())
                    .mime_str("application/octet-stream")?;
                request.multipart(Form::new().part("file", part))
            }
        })
    }

    #[instrument(skip(self, query, payload))]
    fn send(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        payload: Payload<'_>,
    ) -> ConnectResult<Response> {
        let token = self.bearer()?;
        let response = self.build(&method, path, query, &payload, &token)?.send()?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!("Garmin rejected the access token, refreshing and retrying once");
            let token = self.refresh(&token)?;
            let retry = self.build(&method, path, query, &payload, &token)?.send()?;
            return check_status(retry).map_err(|e| {
                if e.is_unauthorized() {
                    ConnectError::authentication("Garmin Connect rejected the stored session")
                } else {
                    e
                }
            });
        }

        check_status(response)
    }

    fn get(&self, path: &str, query: &Query<'_>) -> ConnectResult<Value> {
        read_json(self.send(Method::GET, path, query, Payload::Empty)?)
    }

    fn write(&self, method: Method, path: &str, body: Option<&Value>) -> ConnectResult<Value> {
        let payload = body.map_or(Payload::Empty, Payload::Json);
        read_json(self.send(method, path, &[], payload)?)
    }

    fn upload(&self, name: &str, bytes: &[u8]) -> ConnectResult<Value> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("fit")
            .to_ascii_lowercase();
        let path = format!("/upload-service/upload/.{extension}");
        info!("Uploading {} ({} bytes)", name, bytes.len());
        read_json(self.send(Method::POST, &path, &[], Payload::File { name, bytes })?)
    }

    /// Follow a `start`/`limit` paged list until a short page.
    fn paged(
        &self,
        path: &str,
        query: &Query<'_>,
        first: u32,
        page_size: u32,
    ) -> ConnectResult<Value> {
        let mut items = Vec::new();
        let mut start = first;
        loop {
            let mut page_query = query.to_vec();
            page_query.push(("start", start.to_string()));
            page_query.push(("limit", page_size.to_string()));

            let page = match self.get(path, &page_query)? {
                Value::Array(page) => page,
                _ => break,
            };
            let count = page.len();
            items.extend(page);
            // Pages never exceed the requested size.
            if count < page_size as usize {
                break;
            }
            start += page_size;
        }
        Ok(Value::Array(items))
    }

    fn user_summary(&self, date: &str) -> ConnectResult<Value> {
        let path = format!(
            "/usersummary-service/usersummary/daily/{}",
            self.display_name()?
        );
        self.get(&path, &[("calendarDate", date.to_string())])
    }

    fn body_composition(&self, start: &str, end: &str) -> ConnectResult<Value> {
        self.get(
            "/weight-service/weight/dateRange",
            &[("startDate", start.to_string()), ("endDate", end.to_string())],
        )
    }

    fn stats_and_body(&self, date: &str) -> ConnectResult<Value> {
        let mut stats = self.user_summary(date)?;
        let body = self.body_composition(date, date)?;
        if let (Some(stats), Some(Value::Object(average))) =
            (stats.as_object_mut(), body.get("totalAverage"))
        {
            stats.extend(average.clone());
        }
        Ok(stats)
    }

    fn training_effect(&self, activity_id: i64) -> ConnectResult<Value> {
        let activity = self.get(&format!("/activity-service/activity/{activity_id}"), &[])?;
        let summary = activity.get("summaryDTO").and_then(Value::as_object);
        let effect: Map<String, Value> = summary
            .into_iter()
            .flatten()
            .filter(|(key, _)| key.contains("TrainingEffect") || key.as_str() == "activityTrainingLoad")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Value::Object(effect))
    }

    fn device_alarms(&self) -> ConnectResult<Value> {
        let devices = self.get("/device-service/deviceregistration/devices", &[])?;
        let mut alarms = Vec::new();
        for device in devices.as_array().into_iter().flatten() {
            let Some(id) = device.get("deviceId").and_then(Value::as_i64) else {
                continue;
            };
            let settings = self.get(
                &format!("/device-service/deviceservice/device-info/settings/{id}"),
                &[],
            )?;
            if let Some(Value::Array(device_alarms)) = settings.get("alarms") {
                alarms.extend(device_alarms.iter().cloned());
            }
        }
        Ok(Value::Array(alarms))
    }

    fn delete_weigh_ins(&self, date: &str, delete_all: bool) -> ConnectResult<Value> {
        let day = self.get(
            &format!("/weight-service/weight/dayview/{date}"),
            &[("includeAll", "true".to_string())],
        )?;
        let samples: Vec<String> = day
            .get("dateWeightList")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|w| w.get("samplePk"))
            .map(|pk| match pk {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        let targets = if delete_all {
            &samples[..]
        } else {
            &samples[samples.len().saturating_sub(1)..]
        };
        for pk in targets {
            self.write(
                Method::DELETE,
                &format!("/weight-service/weight/{date}/byversion/{pk}"),
                None,
            )?;
        }
        info!("Deleted {} weigh-in(s) for {}", targets.len(), date);
        Ok(json!(targets.len()))
    }

    fn add_weigh_in(
        &self,
        weight: f64,
        unit_key: &str,
        date_timestamp: &str,
        gmt_timestamp: &str,
    ) -> ConnectResult<Value> {
        let body = json!({
            "dateTimestamp": weigh_in_timestamp(date_timestamp),
            "gmtTimestamp": weigh_in_timestamp(gmt_timestamp),
            "unitKey": unit_key,
            "sourceType": "MANUAL",
            "value": weight,
        });
        self.write(Method::POST, "/weight-service/user-weight", Some(&body))
    }

    fn add_body_composition(&self, date: &str, composition: &BodyComposition) -> ConnectResult<Value> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ConnectError::invalid_response(format!("bad date {date}: {e}")))?;
        let midnight = day.and_time(NaiveTime::MIN);
        let measured = Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));

        let file = encode_weight_scale(composition, measured);
        self.upload("body_composition.fit", &file)
    }

    fn upload_activity(&self, path: &Path) -> ConnectResult<Value> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConnectError::invalid_response("upload path has no file name"))?;
        self.upload(name, &bytes)
    }

    fn download(&self, path: &str) -> ConnectResult<Value> {
        let response = self.send(Method::GET, path, &[], Payload::Empty)?;
        let bytes = response.bytes()?;
        Ok(Value::String(STANDARD.encode(&bytes)))
    }
}

impl ConnectApi for GarminConnect {
    fn call(&self, op: &Operation) -> ConnectResult<Value> {
        use Operation::*;

        debug!("Garmin call {}", op.method_name());
        let range = |start: &str, end: &str| {
            vec![
                ("startDate", start.to_string()),
                ("endDate", end.to_string()),
            ]
        };
        let paging = |start: u32, limit: u32| {
            vec![("start", start.to_string()), ("limit", limit.to_string())]
        };

        match op {
            // Activities
            Activities { start, limit } => self.get(
                "/activitylist-service/activities/search/activities",
                &paging(*start, *limit),
            ),
            ActivitiesByDate {
                start_date,
                end_date,
                activity_type,
            } => {
                let mut query = range(start_date, end_date);
                if let Some(kind) = activity_type {
                    query.push(("activityType", kind.clone()));
                }
                self.paged(
                    "/activitylist-service/activities/search/activities",
                    &query,
                    0,
                    ACTIVITY_PAGE_SIZE,
                )
            }
            ActivitiesForDate { date } => {
                self.get(&format!("/mobile-gateway/heartRate/forDate/{date}"), &[])
            }
            Activity { activity_id } => {
                self.get(&format!("/activity-service/activity/{activity_id}"), &[])
            }
            ActivitySplits { activity_id } => {
                self.get(&format!("/activity-service/activity/{activity_id}/splits"), &[])
            }
            ActivityTypedSplits { activity_id } => self.get(
                &format!("/activity-service/activity/{activity_id}/typedsplits"),
                &[],
            ),
            ActivitySplitSummaries { activity_id } => self.get(
                &format!("/activity-service/activity/{activity_id}/split_summaries"),
                &[],
            ),
            ActivityWeather { activity_id } => {
                self.get(&format!("/activity-service/activity/{activity_id}/weather"), &[])
            }
            ActivityHrInTimezones { activity_id } => self.get(
                &format!("/activity-service/activity/{activity_id}/hrTimeInZones"),
                &[],
            ),
            ActivityGear { activity_id } => self.get(
                "/gear-service/gear/filterGear",
                &[("activityId", activity_id.to_string())],
            ),
            ActivityExerciseSets { activity_id } => self.get(
                &format!("/activity-service/activity/{activity_id}/exerciseSets"),
                &[],
            ),

            // Health and wellness
            Stats { date } | UserSummary { date } => self.user_summary(date),
            StatsAndBody { date } => self.stats_and_body(date),
            StepsData { date } => self.get(
                &format!(
                    "/wellness-service/wellness/dailySummaryChart/{}",
                    self.display_name()?
                ),
                &[("date", date.clone())],
            ),
            TrainingReadiness { date } => self.get(
                &format!("/metrics-service/metrics/trainingreadiness/{date}"),
                &[],
            ),
            BodyBatteryEvents { date } => self.get(
                &format!("/wellness-service/wellness/bodyBattery/events/{date}"),
                &[],
            ),
            Floors { date } => self.get(
                &format!("/wellness-service/wellness/floorsChartData/daily/{date}"),
                &[],
            ),
            TrainingStatus { date } => self.get(
                &format!("/metrics-service/metrics/trainingstatus/aggregated/{date}"),
                &[],
            ),
            RhrDay { date } => self.get(
                &format!("/userstats-service/wellness/daily/{}", self.display_name()?),
                &[
                    ("fromDate", date.clone()),
                    ("untilDate", date.clone()),
                    ("metricId", "60".to_string()),
                ],
            ),
            HeartRates { date } => self.get(
                &format!(
                    "/wellness-service/wellness/dailyHeartRate/{}",
                    self.display_name()?
                ),
                &[("date", date.clone())],
            ),
            HydrationData { date } => self.get(
                &format!("/usersummary-service/usersummary/hydration/daily/{date}"),
                &[],
            ),
            SleepData { date } => self.get(
                &format!(
                    "/wellness-service/wellness/dailySleepData/{}",
                    self.display_name()?
                ),
                &[
                    ("date", date.clone()),
                    ("nonSleepBufferMinutes", "60".to_string()),
                ],
            ),
            StressData { date } | AllDayStress { date } => {
                self.get(&format!("/wellness-service/wellness/dailyStress/{date}"), &[])
            }
            RespirationData { date } => self.get(
                &format!("/wellness-service/wellness/daily/respiration/{date}"),
                &[],
            ),
            Spo2Data { date } => {
                self.get(&format!("/wellness-service/wellness/daily/spo2/{date}"), &[])
            }
            AllDayEvents { date } => self.get(
                "/wellness-service/wellness/dailyEvents",
                &[("calendarDate", date.clone())],
            ),
            BodyComposition {
                start_date,
                end_date,
            } => self.body_composition(start_date, end_date.as_deref().unwrap_or(start_date)),
            DailySteps {
                start_date,
                end_date,
            } => self.get(
                &format!("/usersummary-service/stats/steps/daily/{start_date}/{end_date}"),
                &[],
            ),
            BodyBattery {
                start_date,
                end_date,
            } => self.get(
                "/wellness-service/wellness/bodyBattery/reports/daily",
                &range(start_date, end_date),
            ),
            BloodPressure {
                start_date,
                end_date,
            } => self.get(
                &format!("/bloodpressure-service/bloodpressure/range/{start_date}/{end_date}"),
                &[("includeAll", "true".to_string())],
            ),

            // Profile
            FullName => Ok(self
                .load_profile()?
                .get("fullName")
                .cloned()
                .unwrap_or(Value::Null)),
            UnitSystem => Ok(self
                .get("/userprofile-service/userprofile/user-settings", &[])?
                .pointer("/userData/measurementSystem")
                .cloned()
                .unwrap_or(Value::Null)),
            UserProfile => self.get("/userprofile-service/userprofile/user-settings", &[]),
            UserProfileSettings => self.get("/userprofile-service/userprofile/settings", &[]),

            // Devices
            Devices => self.get("/device-service/deviceregistration/devices", &[]),
            DeviceLastUsed => self.get("/device-service/deviceservice/mylastused", &[]),
            DeviceSettings { device_id } => self.get(
                &format!(
                    "/device-service/deviceservice/device-info/settings/{}",
                    path_segment(device_id, "device_id")?
                ),
                &[],
            ),
            PrimaryTrainingDevice => {
                self.get("/web-gateway/device-info/primary-training-device", &[])
            }
            DeviceSolarData { device_id, date } => Ok(self
                .get(
                    &format!(
                        "/web-gateway/solar/{}/{date}/{date}",
                        path_segment(device_id, "device_id")?
                    ),
                    &[],
                )?
                .get("deviceSolarInput")
                .cloned()
                .unwrap_or(Value::Null)),
            DeviceAlarms => self.device_alarms(),

            // Gear
            Gear { user_profile_id } => self.get(
                "/gear-service/gear/filterGear",
                &[("userProfilePk", user_profile_id.to_string())],
            ),
            GearDefaults { user_profile_id } => self.get(
                &format!(
                    "/gear-service/gear/user/{}/activityTypes",
                    path_segment(user_profile_id, "user_profile_id")?
                ),
                &[],
            ),
            GearStats { gear_uuid } => self.get(
                &format!("/userstats-service/gears/{}", path_segment(gear_uuid, "gear_uuid")?),
                &[],
            ),

            // Weight
            WeighIns {
                start_date,
                end_date,
            } => self.get(
                &format!("/weight-service/weight/range/{start_date}/{end_date}"),
                &[("includeAll", "true".to_string())],
            ),
            DailyWeighIns { date } => self.get(
                &format!("/weight-service/weight/dayview/{date}"),
                &[("includeAll", "true".to_string())],
            ),
            DeleteWeighIns { date, delete_all } => self.delete_weigh_ins(date, *delete_all),
            AddWeighIn { weight, unit_key } => {
                let local = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
                let gmt = Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string();
                self.add_weigh_in(*weight, unit_key, &local, &gmt)
            }
            AddWeighInWithTimestamps {
                weight,
                unit_key,
                date_timestamp,
                gmt_timestamp,
            } => self.add_weigh_in(*weight, unit_key, date_timestamp, gmt_timestamp),

            // Challenges and badges
            Goals { goal_type } => self.paged(
                "/goal-service/goal/goals",
                &[("status", goal_type.clone())],
                1,
                GOAL_PAGE_SIZE,
            ),
            PersonalRecord => self.get(
                &format!(
                    "/personalrecord-service/personalrecord/prs/{}",
                    self.display_name()?
                ),
                &[],
            ),
            EarnedBadges => self.get("/badge-service/badge/earned", &[]),
            AdhocChallenges { start, limit } => self.get(
                "/adhocchallenge-service/adHocChallenge/historical",
                &paging(*start, *limit),
            ),
            AvailableBadgeChallenges { start, limit } => self.get(
                "/badgechallenge-service/badgeChallenge/available",
                &paging(*start, *limit),
            ),
            BadgeChallenges { start, limit } => self.get(
                "/badgechallenge-service/badgeChallenge/completed",
                &paging(*start, *limit),
            ),
            NonCompletedBadgeChallenges { start, limit } => self.get(
                "/badgechallenge-service/badgeChallenge/non-completed",
                &paging(*start, *limit),
            ),
            RacePredictions => self.get(
                &format!(
                    "/metrics-service/metrics/racepredictions/latest/{}",
                    self.display_name()?
                ),
                &[],
            ),
            InProgressVirtualChallenges {
                start_date,
                end_date,
            } => self.get(
                "/badgechallenge-service/virtualChallenge/inProgress",
                &range(start_date, end_date),
            ),

            // Training
            ProgressSummary {
                start_date,
                end_date,
                metric,
            } => {
                let mut query = range(start_date, end_date);
                query.push(("aggregation", "lifetime".to_string()));
                query.push(("groupByParentActivityType", "true".to_string()));
                query.push(("metric", metric.clone()));
                self.get("/fitnessstats-service/activity", &query)
            }
            HillScore {
                start_date,
                end_date,
            } => {
                let mut query = range(start_date, end_date);
                query.push(("aggregation", "daily".to_string()));
                self.get("/metrics-service/metrics/hillscore/stats", &query)
            }
            EnduranceScore {
                start_date,
                end_date,
            } => {
                let mut query = range(start_date, end_date);
                query.push(("aggregation", "weekly".to_string()));
                self.get("/metrics-service/metrics/endurancescore/stats", &query)
            }
            TrainingEffect { activity_id } => self.training_effect(*activity_id),
            MaxMetrics { date } => self.get(
                &format!("/metrics-service/metrics/maxmet/daily/{date}/{date}"),
                &[],
            ),
            HrvData { date } => self.get(&format!("/hrv-service/hrv/{date}"), &[]),
            FitnessAgeData { date } => {
                self.get(&format!("/fitnessage-service/fitnessage/{date}"), &[])
            }
            RequestReload { date } => self.write(
                Method::POST,
                &format!("/wellness-service/wellness/epoch/request/{date}"),
                None,
            ),

            // Workouts
            Workouts => self.get("/workout-service/workouts", &paging(0, 100)),
            WorkoutById { workout_id } => {
                self.get(&format!("/workout-service/workout/{workout_id}"), &[])
            }
            DownloadWorkout { workout_id } => {
                self.download(&format!("/workout-service/workout/FIT/{workout_id}"))
            }
            UploadWorkout { workout } => {
                self.write(Method::POST, "/workout-service/workout", Some(workout))
            }
            UploadActivity { path } => self.upload_activity(path),
            GraphQl { query } => self.write(Method::POST, "/graphql-gateway/graphql", Some(query)),

            // Data entry
            AddBodyComposition { date, composition } => {
                self.add_body_composition(date, composition)
            }
            SetBloodPressure {
                systolic,
                diastolic,
                pulse,
                notes,
            } => {
                let body = json!({
                    "measurementTimestampLocal": Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                    "measurementTimestampGMT": Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
                    "systolic": systolic,
                    "diastolic": diastolic,
                    "pulse": pulse,
                    "sourceType": "MANUAL",
                    "notes": notes,
                });
                self.write(Method::POST, "/bloodpressure-service/bloodpressure", Some(&body))
            }
            AddHydrationData {
                value_in_ml,
                cdate,
                timestamp,
            } => {
                let body = json!({
                    "calendarDate": cdate,
                    "timestampLocal": timestamp,
                    "valueInML": value_in_ml,
                });
                self.write(
                    Method::PUT,
                    "/usersummary-service/usersummary/hydration/log",
                    Some(&body),
                )
            }

            // Women's health
            PregnancySummary => self.get(
                "/periodichealth-service/menstrualcycle/pregnancysnapshot",
                &[],
            ),
            MenstrualDataForDate { date } => self.get(
                &format!("/periodichealth-service/menstrualcycle/dayview/{date}"),
                &[],
            ),
            MenstrualCalendarData {
                start_date,
                end_date,
            } => self.get(
                &format!("/periodichealth-service/menstrualcycle/calendar/{start_date}/{end_date}"),
                &[],
            ),
        }
    }
}

/// Percent-encode one path segment. Dot segments are refused because URL
/// parsing resolves them even when encoded.
fn path_segment<'a>(value: &'a str, name: &str) -> ConnectResult<Cow<'a, str>> {
    if value.is_empty() || value == "." || value == ".." {
        return Err(ConnectError::invalid_argument(format!(
            "{name} is not a valid identifier: '{value}'"
        )));
    }
    Ok(urlencoding::encode(value))
}

fn check_status(response: Response) -> ConnectResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| message.is_char_boundary(*i))
            .unwrap_or(0);
        message.truncate(cut);
    }
    if message.trim().is_empty() {
        message = status.canonical_reason().unwrap_or("no details").to_string();
    }
    Err(ConnectError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Empty bodies become `null`; bodies that are not JSON are returned as text.
fn read_json(response: Response) -> ConnectResult<Value> {
    let text = response.text()?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Weight service timestamps: seconds precision with a fixed `.00` suffix.
fn weigh_in_timestamp(value: &str) -> String {
    let base = value.get(..19).unwrap_or(value);
    format!("{base}.00")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::garmin::tokens::sample_tokens;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn client_for(server: &MockServer, expires_at: i64, store: Option<TokenStore>) -> GarminConnect {
        GarminConnect::new(
            Client::new(),
            Endpoints::local(&server.base_url()),
            Consumer::default(),
            sample_tokens(expires_at),
            store,
        )
    }

    fn fresh() -> i64 {
        Utc::now().timestamp() + 3600
    }

    fn mock_profile(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/userprofile-service/socialProfile");
            then.status(200)
                .json_body(json!({"displayName": "runner42", "fullName": "Ada Runner"}));
        });
    }

    #[test]
    fn test_get_uses_bearer_and_display_name() {
        let server = MockServer::start();
        mock_profile(&server);
        let summary = server.mock(|when, then| {
            when.method(GET)
                .path("/usersummary-service/usersummary/daily/runner42")
                .query_param("calendarDate", "2024-03-01")
                .header("authorization", "Bearer access-1");
            then.status(200).json_body(json!({"totalSteps": 9000}));
        });

        let client = client_for(&server, fresh(), None);
        let value = client
            .call(&Operation::Stats { date: "2024-03-01".into() })
            .unwrap();
        assert_eq!(value, json!({"totalSteps": 9000}));
        assert_eq!(client.call(&Operation::FullName).unwrap(), json!("Ada Runner"));
        summary.assert();
    }

    #[test]
    fn test_identifiers_are_encoded_in_path() {
        let server = MockServer::start();
        let stats = server.mock(|when, then| {
            when.method(GET).path("/userstats-service/gears/a%2Fb%3Fc");
            then.status(200).json_body(json!({"totalDistance": 12.5}));
        });

        let client = client_for(&server, fresh(), None);
        let value = client
            .call(&Operation::GearStats { gear_uuid: "a/b?c".into() })
            .unwrap();
        assert_eq!(value["totalDistance"], 12.5);
        stats.assert();

        let err = client
            .call(&Operation::DeviceSettings { device_id: "..".into() })
            .unwrap_err();
        assert!(matches!(err, ConnectError::InvalidArgument(_)), "{err}");
    }

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("3412", "device_id").unwrap(), "3412");
        assert_eq!(path_segment("x y/z", "gear_uuid").unwrap(), "x%20y%2Fz");
        assert!(path_segment(".", "gear_uuid").is_err());
        assert!(path_segment("", "gear_uuid").is_err());
    }

    #[test]
    fn test_expired_token_is_refreshed_and_saved() {
        let server = MockServer::start();
        let root = TempDir::new().unwrap();
        let store = TokenStore::new(root.path().join("tokens"), root.path().join("blob"));

        let exchange = server.mock(|when, then| {
            when.method(POST).path("/oauth-service/oauth/exchange/user/2.0");
            then.status(200).json_body(json!({
                "access_token": "access-2",
                "refresh_token": "refresh-2",
                "expires_in": 3600,
                "refresh_token_expires_in": 7200
            }));
        });
        let devices = server.mock(|when, then| {
            when.method(GET)
                .path("/device-service/deviceregistration/devices")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(json!([]));
        });

        let client = client_for(&server, 0, Some(store.clone()));
        assert_eq!(client.call(&Operation::Devices).unwrap(), json!([]));
        exchange.assert();
        devices.assert();
        assert_eq!(store.load().unwrap().oauth2.access_token, "access-2");
    }

    #[test]
    fn test_rejected_token_retried_once() {
        let server = MockServer::start();
        let rejected = server.mock(|when, then| {
            when.method(GET)
                .path("/badge-service/badge/earned")
                .header("authorization", "Bearer access-1");
            then.status(401);
        });
        server.mock(|when, then| {
            when.method(POST).path("/oauth-service/oauth/exchange/user/2.0");
            then.status(200)
                .json_body(json!({"access_token": "access-2", "expires_in": 3600}));
        });
        let accepted = server.mock(|when, then| {
            when.method(GET)
                .path("/badge-service/badge/earned")
                .header("authorization", "Bearer access-2");
            then.status(200).json_body(json!([{"badgeId": 1}]));
        });

        let client = client_for(&server, fresh(), None);
        let value = client.call(&Operation::EarnedBadges).unwrap();
        assert_eq!(value, json!([{"badgeId": 1}]));
        rejected.assert();
        accepted.assert();
    }

    #[test]
    fn test_error_status_maps_to_api() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hrv-service/hrv/2024-03-01");
            then.status(500).body("upstream exploded");
        });

        let client = client_for(&server, fresh(), None);
        let err = client
            .call(&Operation::HrvData { date: "2024-03-01".into() })
            .unwrap_err();
        match err {
            ConnectError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_content_is_null() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/metrics-service/metrics/trainingreadiness/2024-03-01");
            then.status(204);
        });

        let client = client_for(&server, fresh(), None);
        let value = client
            .call(&Operation::TrainingReadiness { date: "2024-03-01".into() })
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_activities_by_date_pages() {
        let server = MockServer::start();
        let full: Vec<Value> = (0..20).map(|i| json!({"activityId": i})).collect();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/activitylist-service/activities/search/activities")
                .query_param("start", "0")
                .query_param("activityType", "running");
            then.status(200).json_body(Value::Array(full));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/activitylist-service/activities/search/activities")
                .query_param("start", "20");
            then.status(200).json_body(json!([{"activityId": 20}]));
        });

        let client = client_for(&server, fresh(), None);
        let value = client
            .call(&Operation::ActivitiesByDate {
                start_date: "2024-01-01".into(),
                end_date: "2024-01-31".into(),
                activity_type: Some("running".into()),
            })
            .unwrap();
        assert_eq!(value.as_array().unwrap().len(), 21);
        first.assert();
        second.assert();
    }

    #[test]
    fn test_delete_weigh_ins_latest_only() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/weight-service/weight/dayview/2024-03-01");
            then.status(200).json_body(json!({
                "dateWeightList": [{"samplePk": 11}, {"samplePk": 12}]
            }));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/weight-service/weight/2024-03-01/byversion/12");
            then.status(204);
        });

        let client = client_for(&server, fresh(), None);
        let value = client
            .call(&Operation::DeleteWeighIns { date: "2024-03-01".into(), delete_all: false })
            .unwrap();
        assert_eq!(value, json!(1));
        delete.assert();
    }

    #[test]
    fn test_upload_activity_multipart() {
        let server = MockServer::start();
        let root = TempDir::new().unwrap();
        let file = root.path().join("ride.FIT");
        std::fs::write(&file, b"fitdata").unwrap();

        let upload = server.mock(|when, then| {
            when.method(POST)
                .path("/upload-service/upload/.fit")
                .body_contains("filename=\"ride.FIT\"")
                .body_contains("fitdata");
            then.status(201).json_body(json!({"detailedImportResult": {"uploadId": 7}}));
        });

        let client = client_for(&server, fresh(), None);
        let value = client.call(&Operation::UploadActivity { path: file }).unwrap();
        assert_eq!(value["detailedImportResult"]["uploadId"], 7);
        upload.assert();
    }

    #[test]
    fn test_body_composition_uploads_fit() {
        let server = MockServer::start();
        let upload = server.mock(|when, then| {
            when.method(POST)
                .path("/upload-service/upload/.fit")
                .body_contains("filename=\"body_composition.fit\"");
            then.status(200).json_body(json!({"ok": true}));
        });

        let client = client_for(&server, fresh(), None);
        let composition = BodyComposition {
            weight: 70.0,
            ..Default::default()
        };
        client
            .call(&Operation::AddBodyComposition { date: "2024-03-01".into(), composition })
            .unwrap();
        upload.assert();
    }

    #[test]
    fn test_graphql_posts_query() {
        let server = MockServer::start();
        let graphql = server.mock(|when, then| {
            when.method(POST)
                .path("/graphql-gateway/graphql")
                .json_body(json!({"query": "q", "variables": {"a": 1}}));
            then.status(200).json_body(json!({"data": {}}));
        });

        let client = client_for(&server, fresh(), None);
        let query = json!({"query": "q", "variables": {"a": 1}});
        assert_eq!(client.call(&Operation::GraphQl { query }).unwrap(), json!({"data": {}}));
        graphql.assert();
    }

    #[test]
    fn test_download_workout_base64() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/workout-service/workout/FIT/9");
            then.status(200).body(vec![1u8, 2, 3, 4]);
        });

        let client = client_for(&server, fresh(), None);
        let value = client.call(&Operation::DownloadWorkout { workout_id: 9 }).unwrap();
        assert_eq!(value, json!(STANDARD.encode([1u8, 2, 3, 4])));
    }

    #[test]
    fn test_weigh_in_timestamp() {
        assert_eq!(weigh_in_timestamp("2024-03-01T08:30:00"), "2024-03-01T08:30:00.00");
        assert_eq!(weigh_in_timestamp("2024-03-01T08:30:00.123"), "2024-03-01T08:30:00.00");
        assert_eq!(weigh_in_timestamp("short"), "short.00");
    }
}
