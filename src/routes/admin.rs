use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{require_admin, AuthenticatedUser, KNOWN_ROLES, ROLE_CANDIDATE};
use crate::bootstrap;
use crate::error::{AppError, AppResult};
use crate::models::{CandidateProfile, User};
use crate::schema::{
    applications, assessment_questions, assessment_sessions, assessment_templates,
    candidate_profiles, refresh_tokens, users,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub full_name: String,
    pub created_at: String,
}

fn to_user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        role: user.role.clone(),
        full_name: user.full_name.clone(),
        created_at: DateTime::<Utc>::from_naive_utc_and_offset(user.created_at, Utc).to_rfc3339(),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    require_admin(&user)?;
    let mut conn = state.db()?;

    let rows: Vec<User> = users::table.order(users::created_at.asc()).load(&mut conn)?;
    Ok(Json(rows.iter().map(to_user_response).collect()))
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub role: String,
}

pub async fn set_user_role(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleRequest>,
) -> AppResult<Json<UserResponse>> {
    require_admin(&user)?;

    if !KNOWN_ROLES.contains(&payload.role.as_str()) {
        return Err(AppError::bad_request(format!(
            "unknown role '{}'. Allowed: {}",
            payload.role,
            KNOWN_ROLES.join(", ")
        )));
    }
    if user_id == user.user_id {
        return Err(AppError::bad_request("cannot change your own role"));
    }

    let mut conn = state.db()?;
    let updated: Option<User> = diesel::update(users::table.find(user_id))
        .set((
            users::role.eq(&payload.role),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)
        .optional()?;
    let updated = updated.ok_or_else(AppError::not_found)?;

    info!(user_id = %user_id, role = %payload.role, "user role changed");
    Ok(Json(to_user_response(&updated)))
}

/// Removes a user and everything keyed to them. The CV object is deleted
/// from storage best-effort after the rows are gone.
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&user)?;

    if user_id == user.user_id {
        return Err(AppError::bad_request("cannot delete your own account"));
    }

    let mut conn = state.db()?;
    let profile: Option<CandidateProfile> = candidate_profiles::table
        .find(user_id)
        .first(&mut conn)
        .optional()?;
    let cv_key = profile.and_then(|p| p.cv_key);

    let deleted = conn.transaction::<usize, AppError, _>(|conn| {
        diesel::delete(refresh_tokens::table.filter(refresh_tokens::user_id.eq(user_id)))
            .execute(conn)?;
        diesel::delete(applications::table.filter(applications::candidate_id.eq(user_id)))
            .execute(conn)?;
        diesel::delete(
            assessment_sessions::table.filter(assessment_sessions::candidate_id.eq(user_id)),
        )
        .execute(conn)?;
        diesel::delete(candidate_profiles::table.find(user_id)).execute(conn)?;
        let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
        Ok(deleted)
    })?;
    drop(conn);

    if deleted == 0 {
        return Err(AppError::not_found());
    }

    if let Some(key) = cv_key {
        if let Err(err) = state.storage.delete_object(&key).await {
            warn!(user_id = %user_id, error = ?err, "failed to delete cv object for removed user");
        }
    }

    info!(user_id = %user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SeedUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub full_name: String,
}

#[derive(Serialize)]
pub struct SeedResponse {
    pub created: bool,
}

pub async fn seed_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SeedUserRequest>,
) -> AppResult<Json<SeedResponse>> {
    require_admin(&user)?;

    if !KNOWN_ROLES.contains(&payload.role.as_str()) {
        return Err(AppError::bad_request(format!(
            "unknown role '{}'. Allowed: {}",
            payload.role,
            KNOWN_ROLES.join(", ")
        )));
    }
    if payload.password.len() < 8 {
        return Err(AppError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }

    let mut conn = state.db()?;
    let full_name = if payload.full_name.trim().is_empty() {
        username.clone()
    } else {
        payload.full_name.trim().to_string()
    };
    let created = bootstrap::seed_user(
        &mut conn,
        &username,
        &payload.password,
        &payload.role,
        &full_name,
    )?;
    Ok(Json(SeedResponse { created }))
}

pub async fn bootstrap_assessment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<SeedResponse>> {
    require_admin(&user)?;
    let mut conn = state.db()?;

    let created = bootstrap::bootstrap_default_assessment(&mut conn)?;
    Ok(Json(SeedResponse { created }))
}

#[derive(Serialize)]
pub struct RepairResponse {
    pub orphaned_questions_deleted: usize,
    pub orphaned_sessions_deleted: usize,
}

fn template_ids(conn: &mut PgConnection) -> AppResult<Vec<Uuid>> {
    let ids = assessment_templates::table
        .select(assessment_templates::id)
        .load(conn)?;
    Ok(ids)
}

/// Deletes questions and sessions pointing at templates that no longer
/// exist. Those rows can appear because questions carry no foreign key,
/// which is what lets this repair find them instead of the insert failing.
pub async fn repair_assessment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<RepairResponse>> {
    require_admin(&user)?;
    let mut conn = state.db()?;

    let ids = template_ids(&mut conn)?;
    let (questions, sessions) = conn.transaction::<(usize, usize), AppError, _>(|conn| {
        let questions = diesel::delete(
            assessment_questions::table
                .filter(assessment_questions::template_id.ne_all(&ids)),
        )
        .execute(conn)?;
        let sessions = diesel::delete(
            assessment_sessions::table.filter(assessment_sessions::template_id.ne_all(&ids)),
        )
        .execute(conn)?;
        Ok((questions, sessions))
    })?;

    if questions > 0 || sessions > 0 {
        info!(questions, sessions, "orphaned assessment rows repaired");
    }
    Ok(Json(RepairResponse {
        orphaned_questions_deleted: questions,
        orphaned_sessions_deleted: sessions,
    }))
}

#[derive(Serialize)]
pub struct SyncRolesResponse {
    pub updated: usize,
}

/// Resets any role value outside the known set back to candidate.
pub async fn sync_roles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<SyncRolesResponse>> {
    require_admin(&user)?;
    let mut conn = state.db()?;

    let updated = conn.transaction::<usize, AppError, _>(|conn| {
        let updated = diesel::update(users::table.filter(users::role.ne_all(KNOWN_ROLES)))
            .set((
                users::role.eq(ROLE_CANDIDATE),
                users::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
        Ok(updated)
    })?;

    if updated > 0 {
        info!(updated, "user roles normalized");
    }
    Ok(Json(SyncRolesResponse { updated }))
}
