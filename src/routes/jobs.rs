use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::dsl::count_star;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::{require_staff, AuthenticatedUser};
use crate::error::{AppError, AppResult};
use crate::models::{Brand, JobPosting, NewJobPosting};
use crate::schema::{applications, brands, job_postings};
use crate::state::AppState;
use crate::utils::json::{classify_nullable, NullableValue};

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_OPEN: &str = "open";
pub const STATUS_CLOSED: &str = "closed";

pub const JOB_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_OPEN, STATUS_CLOSED];

#[derive(Deserialize)]
pub struct JobListQuery {
    pub brand_id: Option<Uuid>,
    pub department: Option<String>,
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct AdminJobListQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    pub requirements: Value,
    pub status: String,
    pub brand_id: Option<Uuid>,
    pub brand_name: Option<String>,
    pub posted_at: String,
    pub closes_at: Option<String>,
}

#[derive(Serialize)]
pub struct AdminJobResponse {
    #[serde(flatten)]
    pub job: JobResponse,
    pub applicant_count: i64,
}

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub department: String,
    pub location: String,
    #[serde(default = "default_employment_type")]
    pub employment_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_requirements")]
    pub requirements: Value,
    pub brand_id: Option<Uuid>,
    pub closes_at: Option<DateTime<Utc>>,
}

fn default_employment_type() -> String {
    "full_time".to_string()
}

fn default_requirements() -> Value {
    Value::Array(vec![])
}

#[derive(Deserialize)]
pub struct JobStatusRequest {
    pub status: String,
}

fn format_ts(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339()
}

fn to_job_response(job: JobPosting, brand_name: Option<String>) -> JobResponse {
    JobResponse {
        id: job.id,
        title: job.title,
        department: job.department,
        location: job.location,
        employment_type: job.employment_type,
        description: job.description,
        requirements: job.requirements,
        status: job.status,
        brand_id: job.brand_id,
        brand_name,
        posted_at: format_ts(job.posted_at),
        closes_at: job.closes_at.map(format_ts),
    }
}

fn brand_name_for(conn: &mut PgConnection, brand_id: Option<Uuid>) -> AppResult<Option<String>> {
    let Some(brand_id) = brand_id else {
        return Ok(None);
    };
    let brand: Option<Brand> = brands::table.find(brand_id).first(conn).optional()?;
    Ok(brand.map(|b| b.name))
}

/// Public careers listing: open postings only, newest first.
pub async fn list_open_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<Json<Vec<JobResponse>>> {
    let mut conn = state.db()?;

    let mut query = job_postings::table
        .filter(job_postings::status.eq(STATUS_OPEN))
        .into_boxed();

    if let Some(brand_id) = params.brand_id {
        query = query.filter(job_postings::brand_id.eq(Some(brand_id)));
    }
    if let Some(department) = params
        .department
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        query = query.filter(job_postings::department.eq(department.to_string()));
    }
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(job_postings::title.ilike(format!("%{q}%")));
    }

    let jobs: Vec<JobPosting> = query.order(job_postings::posted_at.desc()).load(&mut conn)?;

    let brand_rows: Vec<Brand> = brands::table.load(&mut conn)?;
    let brand_names: std::collections::HashMap<Uuid, String> =
        brand_rows.into_iter().map(|b| (b.id, b.name)).collect();

    let response = jobs
        .into_iter()
        .map(|job| {
            let brand_name = job.brand_id.and_then(|id| brand_names.get(&id).cloned());
            to_job_response(job, brand_name)
        })
        .collect();

    Ok(Json(response))
}

pub async fn get_open_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<JobResponse>> {
    let mut conn = state.db()?;

    let job: JobPosting = job_postings::table.find(job_id).first(&mut conn)?;
    if job.status != STATUS_OPEN {
        return Err(AppError::not_found());
    }

    let brand_name = brand_name_for(&mut conn, job.brand_id)?;
    Ok(Json(to_job_response(job, brand_name)))
}

pub async fn admin_list_jobs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<AdminJobListQuery>,
) -> AppResult<Json<Vec<AdminJobResponse>>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let mut query = job_postings::table.into_boxed();
    if let Some(status) = params.status.as_deref() {
        if !JOB_STATUSES.contains(&status) {
            return Err(AppError::bad_request(format!(
                "invalid status '{status}'. Allowed: {}",
                JOB_STATUSES.join(", ")
            )));
        }
        query = query.filter(job_postings::status.eq(status.to_string()));
    }

    let jobs: Vec<JobPosting> = query.order(job_postings::created_at.desc()).load(&mut conn)?;

    let counts: Vec<(Uuid, i64)> = applications::table
        .group_by(applications::job_id)
        .select((applications::job_id, count_star()))
        .load(&mut conn)?;
    let count_map: std::collections::HashMap<Uuid, i64> = counts.into_iter().collect();

    let brand_rows: Vec<Brand> = brands::table.load(&mut conn)?;
    let brand_names: std::collections::HashMap<Uuid, String> =
        brand_rows.into_iter().map(|b| (b.id, b.name)).collect();

    let response = jobs
        .into_iter()
        .map(|job| {
            let applicant_count = *count_map.get(&job.id).unwrap_or(&0);
            let brand_name = job.brand_id.and_then(|id| brand_names.get(&id).cloned());
            AdminJobResponse {
                job: to_job_response(job, brand_name),
                applicant_count,
            }
        })
        .collect();

    Ok(Json(response))
}

pub async fn admin_create_job(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateJobRequest>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    require_staff(&user)?;

    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if !payload.requirements.is_array() {
        return Err(AppError::bad_request("requirements must be an array"));
    }

    let mut conn = state.db()?;

    if let Some(brand_id) = payload.brand_id {
        let exists: Option<Brand> = brands::table.find(brand_id).first(&mut conn).optional()?;
        if exists.is_none() {
            return Err(AppError::bad_request("brand does not exist"));
        }
    }

    let new_job = NewJobPosting {
        id: Uuid::new_v4(),
        brand_id: payload.brand_id,
        title: payload.title.trim().to_string(),
        department: payload.department.trim().to_string(),
        location: payload.location.trim().to_string(),
        employment_type: payload.employment_type,
        description: payload.description,
        requirements: payload.requirements,
        status: STATUS_DRAFT.to_string(),
        closes_at: payload.closes_at.map(|ts| ts.naive_utc()),
    };

    diesel::insert_into(job_postings::table)
        .values(&new_job)
        .execute(&mut conn)?;

    let job: JobPosting = job_postings::table.find(new_job.id).first(&mut conn)?;
    let brand_name = brand_name_for(&mut conn, job.brand_id)?;

    info!(job_id = %job.id, title = %job.title, "job posting created");
    Ok((StatusCode::CREATED, Json(to_job_response(job, brand_name))))
}

pub async fn admin_update_job(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(job_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<JobResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let existing: JobPosting = job_postings::table.find(job_id).first(&mut conn)?;

    let mut title = existing.title.clone();
    let mut department = existing.department.clone();
    let mut location = existing.location.clone();
    let mut employment_type = existing.employment_type.clone();
    let mut description = existing.description.clone();
    let mut requirements = existing.requirements.clone();
    let mut brand_id = existing.brand_id;
    let mut closes_at = existing.closes_at;

    for (field, target) in [
        ("title", &mut title),
        ("department", &mut department),
        ("location", &mut location),
        ("employment_type", &mut employment_type),
    ] {
        match classify_nullable(body.get(field)).map_err(AppError::bad_request)? {
            NullableValue::Omitted => {}
            NullableValue::Null => {
                return Err(AppError::bad_request(format!("{field} cannot be null")));
            }
            NullableValue::String(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(AppError::bad_request(format!("{field} must not be empty")));
                }
                *target = trimmed.to_string();
            }
        }
    }

    if let Some(value) = body.get("description") {
        let text = value
            .as_str()
            .ok_or_else(|| AppError::bad_request("description must be a string"))?;
        description = text.to_string();
    }

    if let Some(value) = body.get("requirements") {
        if !value.is_array() {
            return Err(AppError::bad_request("requirements must be an array"));
        }
        requirements = value.clone();
    }

    match classify_nullable(body.get("brand_id")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => {}
        NullableValue::Null => brand_id = None,
        NullableValue::String(value) => {
            let parsed = Uuid::parse_str(value.trim())
                .map_err(|_| AppError::bad_request("brand_id must be a valid UUID"))?;
            let exists: Option<Brand> =
                brands::table.find(parsed).first(&mut conn).optional()?;
            if exists.is_none() {
                return Err(AppError::bad_request("brand does not exist"));
            }
            brand_id = Some(parsed);
        }
    }

    match classify_nullable(body.get("closes_at")).map_err(AppError::bad_request)? {
        NullableValue::Omitted => {}
        NullableValue::Null => closes_at = None,
        NullableValue::String(value) => {
            let parsed = DateTime::parse_from_rfc3339(value.trim())
                .map_err(|_| AppError::bad_request("closes_at must be an RFC 3339 timestamp"))?;
            closes_at = Some(parsed.naive_utc());
        }
    }

    diesel::update(job_postings::table.find(job_id))
        .set((
            job_postings::title.eq(&title),
            job_postings::department.eq(&department),
            job_postings::location.eq(&location),
            job_postings::employment_type.eq(&employment_type),
            job_postings::description.eq(&description),
            job_postings::requirements.eq(&requirements),
            job_postings::brand_id.eq(brand_id),
            job_postings::closes_at.eq(closes_at),
            job_postings::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated: JobPosting = job_postings::table.find(job_id).first(&mut conn)?;
    let brand_name = brand_name_for(&mut conn, updated.brand_id)?;
    Ok(Json(to_job_response(updated, brand_name)))
}

/// Status transitions; opening a posting stamps posted_at.
pub async fn admin_set_job_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<JobStatusRequest>,
) -> AppResult<Json<JobResponse>> {
    require_staff(&user)?;

    if !JOB_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::bad_request(format!(
            "invalid status '{}'. Allowed: {}",
            payload.status,
            JOB_STATUSES.join(", ")
        )));
    }

    let mut conn = state.db()?;
    let existing: JobPosting = job_postings::table.find(job_id).first(&mut conn)?;
    let now = Utc::now().naive_utc();

    if payload.status == STATUS_OPEN && existing.status != STATUS_OPEN {
        diesel::update(job_postings::table.find(job_id))
            .set((
                job_postings::status.eq(&payload.status),
                job_postings::posted_at.eq(now),
                job_postings::updated_at.eq(now),
            ))
            .execute(&mut conn)?;
    } else {
        diesel::update(job_postings::table.find(job_id))
            .set((
                job_postings::status.eq(&payload.status),
                job_postings::updated_at.eq(now),
            ))
            .execute(&mut conn)?;
    }

    let updated: JobPosting = job_postings::table.find(job_id).first(&mut conn)?;
    let brand_name = brand_name_for(&mut conn, updated.brand_id)?;

    info!(job_id = %job_id, status = %updated.status, "job posting status changed");
    Ok(Json(to_job_response(updated, brand_name)))
}

pub async fn admin_delete_job(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(job_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let usage: i64 = applications::table
        .filter(applications::job_id.eq(job_id))
        .select(count_star())
        .first(&mut conn)?;

    if usage > 0 {
        return Err(AppError::bad_request(
            "cannot delete a posting that has applications; close it instead",
        ));
    }

    let deleted = diesel::delete(job_postings::table.find(job_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }

    Ok(StatusCode::NO_CONTENT)
}
