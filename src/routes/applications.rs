use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{require_staff, AuthenticatedUser};
use crate::cv;
use crate::error::{AppError, AppResult};
use crate::genai::FitReportInput;
use crate::models::{Application, Brand, CandidateProfile, JobPosting, NewApplication};
use crate::routes::jobs::STATUS_OPEN;
use crate::routes::profiles;
use crate::schema::{applications, brands, candidate_profiles, job_postings};
use crate::state::AppState;

pub const STAGE_APPLIED: &str = "applied";
pub const STAGE_SCREENING: &str = "screening";
pub const STAGE_INTERVIEW: &str = "interview";
pub const STAGE_OFFER: &str = "offer";
pub const STAGE_HIRED: &str = "hired";
pub const STAGE_REJECTED: &str = "rejected";

pub const PIPELINE_STAGES: &[&str] = &[
    STAGE_APPLIED,
    STAGE_SCREENING,
    STAGE_INTERVIEW,
    STAGE_OFFER,
    STAGE_HIRED,
    STAGE_REJECTED,
];

/// One application per (job, candidate) pair: the id is the concatenation,
/// so the primary key enforces the invariant.
pub fn application_id(job_id: Uuid, candidate_id: Uuid) -> String {
    format!("{job_id}_{candidate_id}")
}

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub id: String,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub position_title: String,
    pub brand_name: Option<String>,
    pub candidate_name: String,
    pub stage: String,
    pub interview_at: Option<String>,
    pub interview_location: Option<String>,
    pub interview_notes: Option<String>,
    pub has_fit_report: bool,
    pub applied_at: String,
}

#[derive(Serialize)]
pub struct ApplicationDetailResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub fit_report: Option<Value>,
    pub fit_report_generated_at: Option<String>,
    pub profile: Option<crate::routes::profiles::ProfileResponse>,
}

#[derive(Deserialize)]
pub struct PipelineQuery {
    pub job_id: Option<Uuid>,
    pub stage: Option<String>,
}

#[derive(Deserialize)]
pub struct StageRequest {
    pub stage: String,
}

#[derive(Deserialize)]
pub struct InterviewRequest {
    pub scheduled_at: DateTime<Utc>,
    pub location: String,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct FitReportQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Serialize)]
pub struct CvTextResponse {
    pub text: String,
}

fn format_ts(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339()
}

fn to_application_response(application: &Application) -> ApplicationResponse {
    ApplicationResponse {
        id: application.id.clone(),
        job_id: application.job_id,
        candidate_id: application.candidate_id,
        position_title: application.position_title.clone(),
        brand_name: application.brand_name.clone(),
        candidate_name: application.candidate_name.clone(),
        stage: application.stage.clone(),
        interview_at: application.interview_at.map(format_ts),
        interview_location: application.interview_location.clone(),
        interview_notes: application.interview_notes.clone(),
        has_fit_report: application.fit_report.is_some(),
        applied_at: format_ts(application.applied_at),
    }
}

/// Candidate applies to an open posting. Display fields are copied off the
/// job and profile at apply time so pipeline lists render without joins.
pub async fn apply(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(job_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApplicationResponse>)> {
    let mut conn = state.db()?;

    let job: Option<JobPosting> = job_postings::table.find(job_id).first(&mut conn).optional()?;
    let job = job.ok_or_else(AppError::not_found)?;
    if job.status != STATUS_OPEN {
        return Err(AppError::bad_request("job posting is not open"));
    }

    let profile: Option<CandidateProfile> = candidate_profiles::table
        .find(user.user_id)
        .first(&mut conn)
        .optional()?;
    let candidate_name = profile
        .as_ref()
        .and_then(|p| p.full_name.clone())
        .unwrap_or_else(|| user.username.clone());

    let brand_name = match job.brand_id {
        Some(brand_id) => {
            let brand: Option<Brand> =
                brands::table.find(brand_id).first(&mut conn).optional()?;
            brand.map(|b| b.name)
        }
        None => None,
    };

    let new_application = NewApplication {
        id: application_id(job.id, user.user_id),
        job_id: job.id,
        candidate_id: user.user_id,
        position_title: job.title.clone(),
        brand_name,
        candidate_name,
        stage: STAGE_APPLIED.to_string(),
    };

    match diesel::insert_into(applications::table)
        .values(&new_application)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request("you have already applied to this job"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    let application: Application = applications::table
        .find(&new_application.id)
        .first(&mut conn)?;

    info!(application_id = %application.id, job_id = %job_id, "application submitted");
    Ok((
        StatusCode::CREATED,
        Json(to_application_response(&application)),
    ))
}

pub async fn list_own(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ApplicationResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Application> = applications::table
        .filter(applications::candidate_id.eq(user.user_id))
        .order(applications::applied_at.desc())
        .load(&mut conn)?;

    Ok(Json(rows.iter().map(to_application_response).collect()))
}

pub async fn admin_list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<PipelineQuery>,
) -> AppResult<Json<Vec<ApplicationResponse>>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let mut query = applications::table.into_boxed();
    if let Some(job_id) = params.job_id {
        query = query.filter(applications::job_id.eq(job_id));
    }
    if let Some(stage) = params.stage.as_deref() {
        if !PIPELINE_STAGES.contains(&stage) {
            return Err(AppError::bad_request(format!(
                "invalid stage '{stage}'. Allowed: {}",
                PIPELINE_STAGES.join(", ")
            )));
        }
        query = query.filter(applications::stage.eq(stage.to_string()));
    }

    let rows: Vec<Application> = query.order(applications::applied_at.desc()).load(&mut conn)?;
    Ok(Json(rows.iter().map(to_application_response).collect()))
}

fn load_application(conn: &mut PgConnection, id: &str) -> AppResult<Application> {
    let application: Option<Application> =
        applications::table.find(id).first(conn).optional()?;
    application.ok_or_else(AppError::not_found)
}

pub async fn admin_detail(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApplicationDetailResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let application = load_application(&mut conn, &id)?;
    let profile: Option<CandidateProfile> = candidate_profiles::table
        .find(application.candidate_id)
        .first(&mut conn)
        .optional()?;

    Ok(Json(ApplicationDetailResponse {
        application: to_application_response(&application),
        fit_report: application.fit_report.clone(),
        fit_report_generated_at: application.fit_report_generated_at.map(format_ts),
        profile: profile.map(profiles::to_profile_response),
    }))
}

pub async fn admin_set_stage(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<StageRequest>,
) -> AppResult<Json<ApplicationResponse>> {
    require_staff(&user)?;

    if !PIPELINE_STAGES.contains(&payload.stage.as_str()) {
        return Err(AppError::bad_request(format!(
            "invalid stage '{}'. Allowed: {}",
            payload.stage,
            PIPELINE_STAGES.join(", ")
        )));
    }

    let mut conn = state.db()?;
    load_application(&mut conn, &id)?;

    diesel::update(applications::table.find(&id))
        .set((
            applications::stage.eq(&payload.stage),
            applications::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated = load_application(&mut conn, &id)?;
    info!(application_id = %id, stage = %payload.stage, "pipeline stage changed");
    Ok(Json(to_application_response(&updated)))
}

pub async fn admin_schedule_interview(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<InterviewRequest>,
) -> AppResult<Json<ApplicationResponse>> {
    require_staff(&user)?;

    if payload.location.trim().is_empty() {
        return Err(AppError::bad_request("location must not be empty"));
    }

    let mut conn = state.db()?;
    load_application(&mut conn, &id)?;

    diesel::update(applications::table.find(&id))
        .set((
            applications::stage.eq(STAGE_INTERVIEW),
            applications::interview_at.eq(Some(payload.scheduled_at.naive_utc())),
            applications::interview_location.eq(Some(payload.location.trim().to_string())),
            applications::interview_notes.eq(payload.notes.as_deref()),
            applications::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let updated = load_application(&mut conn, &id)?;
    info!(application_id = %id, "interview scheduled");
    Ok(Json(to_application_response(&updated)))
}

/// Cached CV text for the application's candidate; see `cv` for the TTL and
/// write-back behavior.
pub async fn admin_cv_text(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<CvTextResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let application = load_application(&mut conn, &id)?;
    let profile: Option<CandidateProfile> = candidate_profiles::table
        .find(application.candidate_id)
        .first(&mut conn)
        .optional()?;
    let profile = profile.ok_or_else(AppError::not_found)?;
    drop(conn);

    let text = cv::resolve_cv_text(&state, &profile).await?;
    Ok(Json(CvTextResponse { text }))
}

/// Generates (or returns the cached) multi-section candidate-fit report.
pub async fn admin_fit_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Query(params): Query<FitReportQuery>,
) -> AppResult<Json<Value>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let application = load_application(&mut conn, &id)?;

    if !params.force {
        if let Some(report) = &application.fit_report {
            return Ok(Json(report.clone()));
        }
    }

    let job: JobPosting = job_postings::table
        .find(application.job_id)
        .first(&mut conn)?;
    let profile: Option<CandidateProfile> = candidate_profiles::table
        .find(application.candidate_id)
        .first(&mut conn)
        .optional()?;

    let scores = latest_scores(&mut conn, application.candidate_id)?;
    drop(conn);

    let cv_text = match &profile {
        Some(profile) => match cv::resolve_cv_text(&state, profile).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(application_id = %id, error = ?err, "fit report proceeding without cv text");
                None
            }
        },
        None => None,
    };

    let input = FitReportInput {
        position_title: application.position_title.clone(),
        job_description: job.description,
        requirements: job.requirements,
        candidate_name: application.candidate_name.clone(),
        candidate_summary: profile.as_ref().and_then(|p| p.summary.clone()),
        cv_text,
        big_five: scores.as_ref().map(|(big_five, _)| big_five.clone()),
        disc_type: scores.and_then(|(_, disc_type)| disc_type),
    };

    let report = state.genai.fit_report(&input).await?;
    let report_json = serde_json::to_value(&report)?;

    let mut conn = state.db()?;
    diesel::update(applications::table.find(&id))
        .set((
            applications::fit_report.eq(Some(&report_json)),
            applications::fit_report_generated_at.eq(Some(Utc::now().naive_utc())),
            applications::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    info!(application_id = %id, "fit report generated");
    Ok(Json(report_json))
}

/// Latest scored assessment session for the candidate, if any.
fn latest_scores(
    conn: &mut PgConnection,
    candidate_id: Uuid,
) -> AppResult<Option<(Value, Option<String>)>> {
    use crate::schema::assessment_sessions;

    let session: Option<crate::models::AssessmentSession> = assessment_sessions::table
        .filter(assessment_sessions::candidate_id.eq(candidate_id))
        .filter(assessment_sessions::status.eq(crate::routes::assessments::SESSION_SCORED))
        .order(assessment_sessions::submitted_at.desc())
        .first(conn)
        .optional()?;

    Ok(session.and_then(|s| s.big_five.map(|big_five| (big_five, s.disc_type))))
}

#[cfg(test)]
mod tests {
    use super::application_id;
    use uuid::Uuid;

    #[test]
    fn application_id_is_deterministic() {
        let job = Uuid::new_v4();
        let candidate = Uuid::new_v4();
        assert_eq!(
            application_id(job, candidate),
            application_id(job, candidate)
        );
        assert_eq!(
            application_id(job, candidate),
            format!("{job}_{candidate}")
        );
    }
}
