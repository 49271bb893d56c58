//! HTTP handlers for the farm endpoints.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::Response,
};
use chrono::Utc;
use serde::Serialize;

use crate::farm::snapshot::FarmSnapshot;
use crate::http::envelope::{write_json, Envelope};
use crate::http::query::{read_csv, read_int, read_string, QueryString};
use crate::http::response::{read_id_param, ApiError};
use crate::http::server::AppState;
use crate::observability::logging::{properties, Level, Logger};
use crate::validator::{permitted_value, Validator};

const COW_STATUSES: [&str; 3] = ["healthy", "sick", "injured"];
const LOW_BATTERY_PERCENT: u8 = 75;

type HandlerResult = Result<Response, ApiError>;

fn ok(env: &Envelope) -> HandlerResult {
    Ok(write_json(StatusCode::OK, env, None)?)
}

#[derive(Serialize)]
struct SystemInfo<'a> {
    environment: &'a str,
    version: &'a str,
}

pub async fn healthcheck(State(state): State<AppState>) -> HandlerResult {
    let env = Envelope::new("status", "available")?.with(
        "system_info",
        SystemInfo {
            environment: &state.environment,
            version: &state.version,
        },
    )?;
    ok(&env)
}

/// Runtime variables in the spirit of Go's expvar page.
pub async fn debug_vars(State(state): State<AppState>) -> HandlerResult {
    let env = Envelope::new("version", state.version.as_str())?
        .with("background_tasks", state.background.outstanding())?
        .with("timestamp", Utc::now().timestamp())?;
    ok(&env)
}

pub async fn get_farm_state(State(state): State<AppState>) -> HandlerResult {
    let farm_state = state.snapshot.state(Utc::now());

    let snapshot = state.snapshot.clone();
    let logger = state.logger.clone();
    state.background.run(move || report_low_batteries(&snapshot, &logger));

    ok(&Envelope::new("farm_state", farm_state)?)
}

/// Log an alert for every device whose battery is running low.
fn report_low_batteries(snapshot: &FarmSnapshot, logger: &Logger) {
    let cows = snapshot
        .cows
        .iter()
        .map(|c| (c.tag.as_str(), c.sensors.battery_level));
    let fleet = [
        ("robodog", snapshot.robodog.battery_level),
        ("drone", snapshot.drone.battery_level),
    ];

    for (device, level) in cows.chain(fleet) {
        if level < LOW_BATTERY_PERCENT {
            let _ = logger.log(
                Level::InfoError,
                "low battery",
                Some(&properties([
                    ("device", device.to_string()),
                    ("battery_level", level.to_string()),
                ])),
            );
        }
    }
}

/// `GET /api/cows?status=sick&zone=Pasture%20A,Pasture%20B&limit=2`
pub async fn list_cows(State(state): State<AppState>, qs: QueryString) -> HandlerResult {
    let mut v = Validator::new();

    let status = read_string(&qs, "status", "");
    let zones = read_csv(&qs, "zone", Vec::new());
    let limit = read_int(&qs, "limit", 100, &mut v);

    if !status.is_empty() {
        v.check(
            permitted_value(&status.as_str(), &COW_STATUSES),
            "status",
            "must be one of healthy, sick, injured",
        );
    }
    v.check(limit > 0, "limit", "must be greater than zero");
    v.check(limit <= 100, "limit", "must be a maximum of 100");
    if !v.valid() {
        return Err(ApiError::FailedValidation(v));
    }

    let cows: Vec<_> = state
        .snapshot
        .cows
        .iter()
        .filter(|c| status.is_empty() || c.health.status == status)
        .filter(|c| zones.is_empty() || zones.contains(&c.location.zone))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect();

    let env = Envelope::new("total", cows.len())?.with("cows", cows)?;
    ok(&env)
}

pub async fn get_cow(State(state): State<AppState>, Path(id): Path<String>) -> HandlerResult {
    let id = read_id_param(&id)?;
    let cow = state.snapshot.cow(id).ok_or(ApiError::NotFound)?;
    ok(&Envelope::new("cow", cow)?)
}

pub async fn get_robodog(State(state): State<AppState>) -> HandlerResult {
    ok(&Envelope::new("robodog", &state.snapshot.robodog)?)
}

pub async fn get_drone(State(state): State<AppState>) -> HandlerResult {
    ok(&Envelope::new("drone", &state.snapshot.drone)?)
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
