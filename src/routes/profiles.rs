use std::time::Duration;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::CandidateProfile;
use crate::schema::candidate_profiles;
use crate::state::AppState;

const CV_URL_EXPIRY_SECONDS: u64 = 300;
const MAX_JSON_ENTRIES: usize = 50;

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub summary: Option<String>,
    pub last_education: Option<String>,
    pub education: Value,
    pub experience: Value,
    pub cv_filename: Option<String>,
    pub cv_url: Option<String>,
    pub has_cv: bool,
    pub is_complete: bool,
}

#[derive(Deserialize)]
pub struct PersonalStepRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub summary: Option<String>,
    pub last_education: Option<String>,
    pub cv_url: Option<String>,
}

#[derive(Deserialize)]
pub struct EntriesStepRequest {
    pub entries: Value,
}

#[derive(Serialize)]
pub struct CvUploadResponse {
    pub cv_filename: String,
    pub is_complete: bool,
}

#[derive(Serialize)]
pub struct CvDownloadResponse {
    pub url: String,
    pub expires_in: u64,
}

pub fn to_profile_response(profile: CandidateProfile) -> ProfileResponse {
    let has_cv = profile.cv_key.is_some() || profile.cv_url.is_some();
    ProfileResponse {
        user_id: profile.user_id,
        full_name: profile.full_name,
        phone: profile.phone,
        birth_date: profile.birth_date,
        address: profile.address,
        city: profile.city,
        summary: profile.summary,
        last_education: profile.last_education,
        education: profile.education,
        experience: profile.experience,
        cv_filename: profile.cv_filename,
        cv_url: profile.cv_url,
        has_cv,
        is_complete: profile.is_complete,
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).is_some_and(|s| !s.is_empty())
}

/// Completeness is derived from a fixed required-field list; everything else
/// on the wizard is optional polish.
pub fn compute_completeness(profile: &CandidateProfile) -> bool {
    present(&profile.full_name)
        && present(&profile.phone)
        && profile.birth_date.is_some()
        && present(&profile.address)
        && present(&profile.last_education)
        && (profile.cv_key.is_some() || present(&profile.cv_url))
}

pub fn load_profile(conn: &mut PgConnection, user_id: Uuid) -> AppResult<CandidateProfile> {
    let profile: Option<CandidateProfile> = candidate_profiles::table
        .find(user_id)
        .first(conn)
        .optional()?;
    profile.ok_or_else(AppError::not_found)
}

fn refresh_completeness(conn: &mut PgConnection, user_id: Uuid) -> AppResult<CandidateProfile> {
    let profile = load_profile(conn, user_id)?;
    let complete = compute_completeness(&profile);
    if complete != profile.is_complete {
        diesel::update(candidate_profiles::table.find(user_id))
            .set(candidate_profiles::is_complete.eq(complete))
            .execute(conn)?;
    }
    load_profile(conn, user_id)
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let mut conn = state.db()?;
    let profile = load_profile(&mut conn, user.user_id)?;
    Ok(Json(to_profile_response(profile)))
}

/// Personal wizard step. Only submitted fields are written, so a partially
/// filled step round-trips exactly what the candidate entered.
pub async fn save_personal_step(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<PersonalStepRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let mut conn = state.db()?;
    let existing = load_profile(&mut conn, user.user_id)?;

    let full_name = payload.full_name.or(existing.full_name);
    let phone = payload.phone.or(existing.phone);
    let birth_date = payload.birth_date.or(existing.birth_date);
    let address = payload.address.or(existing.address);
    let city = payload.city.or(existing.city);
    let summary = payload.summary.or(existing.summary);
    let last_education = payload.last_education.or(existing.last_education);
    let cv_url = payload.cv_url.or(existing.cv_url);

    diesel::update(candidate_profiles::table.find(user.user_id))
        .set((
            candidate_profiles::full_name.eq(full_name),
            candidate_profiles::phone.eq(phone),
            candidate_profiles::birth_date.eq(birth_date),
            candidate_profiles::address.eq(address),
            candidate_profiles::city.eq(city),
            candidate_profiles::summary.eq(summary),
            candidate_profiles::last_education.eq(last_education),
            candidate_profiles::cv_url.eq(cv_url),
            candidate_profiles::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let profile = refresh_completeness(&mut conn, user.user_id)?;
    Ok(Json(to_profile_response(profile)))
}

fn validate_entries(entries: &Value) -> AppResult<()> {
    let Some(array) = entries.as_array() else {
        return Err(AppError::bad_request("entries must be an array"));
    };
    if array.len() > MAX_JSON_ENTRIES {
        return Err(AppError::bad_request(format!(
            "entries must contain at most {MAX_JSON_ENTRIES} items"
        )));
    }
    if array.iter().any(|entry| !entry.is_object()) {
        return Err(AppError::bad_request("each entry must be an object"));
    }
    Ok(())
}

pub async fn save_education_step(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<EntriesStepRequest>,
) -> AppResult<Json<ProfileResponse>> {
    validate_entries(&payload.entries)?;
    let mut conn = state.db()?;
    load_profile(&mut conn, user.user_id)?;

    diesel::update(candidate_profiles::table.find(user.user_id))
        .set((
            candidate_profiles::education.eq(&payload.entries),
            candidate_profiles::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let profile = refresh_completeness(&mut conn, user.user_id)?;
    Ok(Json(to_profile_response(profile)))
}

pub async fn save_experience_step(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<EntriesStepRequest>,
) -> AppResult<Json<ProfileResponse>> {
    validate_entries(&payload.entries)?;
    let mut conn = state.db()?;
    load_profile(&mut conn, user.user_id)?;

    diesel::update(candidate_profiles::table.find(user.user_id))
        .set((
            candidate_profiles::experience.eq(&payload.entries),
            candidate_profiles::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let profile = refresh_completeness(&mut conn, user.user_id)?;
    Ok(Json(to_profile_response(profile)))
}

/// Multipart PDF upload into object storage. Replacing the CV resets the
/// cached extraction so the next read re-parses the new file.
pub async fn upload_cv(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<CvUploadResponse>)> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(error = %err, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        if field.name() == Some("file") {
            filename = field.file_name().map(|n| n.to_string());
            content_type = field.content_type().map(|mime| mime.to_string());
            let data = field.bytes().await.map_err(|err| {
                error!(error = %err, "failed to read file bytes");
                AppError::bad_request(format!("failed to read file bytes: {err}"))
            })?;
            file_bytes = Some(data.to_vec());
        }
    }

    let file_bytes = file_bytes.ok_or_else(|| AppError::bad_request("file field is required"))?;
    if file_bytes.is_empty() {
        return Err(AppError::bad_request("file field must not be empty"));
    }
    let filename = filename.ok_or_else(|| AppError::bad_request("filename is required"))?;

    let content_type = content_type.or_else(|| {
        mime_guess::from_path(&filename)
            .first()
            .map(|mime| mime.essence_str().to_string())
    });
    if content_type.as_deref() != Some("application/pdf") {
        return Err(AppError::bad_request("CV must be a PDF file"));
    }

    let cv_key = format!("cvs/{}/{}.pdf", user.user_id, Uuid::new_v4());
    state
        .storage
        .put_object(&cv_key, file_bytes, content_type)
        .await
        .map_err(AppError::internal)?;

    let mut conn = state.db()?;
    let existing = load_profile(&mut conn, user.user_id)?;
    let previous_key = existing.cv_key.clone();

    diesel::update(candidate_profiles::table.find(user.user_id))
        .set((
            candidate_profiles::cv_key.eq(Some(&cv_key)),
            candidate_profiles::cv_filename.eq(Some(&filename)),
            candidate_profiles::cv_text.eq(None::<String>),
            candidate_profiles::cv_text_extracted_at.eq(None::<chrono::NaiveDateTime>),
            candidate_profiles::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let profile = refresh_completeness(&mut conn, user.user_id)?;
    drop(conn);

    if let Some(previous_key) = previous_key {
        if let Err(err) = state.storage.delete_object(&previous_key).await {
            error!(error = %err, key = %previous_key, "failed to delete replaced CV object");
        }
    }

    info!(candidate_id = %user.user_id, filename = %filename, "cv uploaded");
    Ok((
        StatusCode::CREATED,
        Json(CvUploadResponse {
            cv_filename: filename,
            is_complete: profile.is_complete,
        }),
    ))
}

pub async fn download_cv(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<CvDownloadResponse>> {
    let mut conn = state.db()?;
    let profile = load_profile(&mut conn, user.user_id)?;
    drop(conn);

    let cv_key = profile
        .cv_key
        .ok_or_else(|| AppError::bad_request("no CV uploaded"))?;

    let disposition = profile
        .cv_filename
        .as_deref()
        .and_then(attachment_content_disposition);

    let url = state
        .storage
        .presign_get_object(
            &cv_key,
            Duration::from_secs(CV_URL_EXPIRY_SECONDS),
            disposition,
        )
        .await
        .map_err(AppError::internal)?;

    Ok(Json(CvDownloadResponse {
        url,
        expires_in: CV_URL_EXPIRY_SECONDS,
    }))
}

/// Builds the download Content-Disposition so browsers save the CV under its
/// original name, with an RFC 5987 encoded fallback for non-ASCII names.
fn attachment_content_disposition(filename: &str) -> Option<String> {
    if filename.is_empty() {
        return None;
    }

    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            _ => ch,
        })
        .collect();

    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    Some(format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    ))
}
