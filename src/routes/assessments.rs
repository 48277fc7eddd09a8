use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{require_staff, AuthenticatedUser};
use crate::error::{AppError, AppResult};
use crate::genai::{ArchetypeInput, CommentaryInput};
use crate::models::{
    AssessmentQuestion, AssessmentSession, AssessmentTemplate, NewAssessmentQuestion,
    NewAssessmentSession, NewAssessmentTemplate,
};
use crate::schema::{assessment_questions, assessment_sessions, assessment_templates, users};
use crate::scoring::{
    self, AnswerValue, ScoredQuestion, BIG_FIVE_DIMENSIONS, DISC_DIMENSIONS, KIND_FORCED_CHOICE,
    KIND_LIKERT, MODEL_BIG_FIVE, MODEL_DISC,
};
use crate::state::AppState;

pub const SESSION_IN_PROGRESS: &str = "in_progress";
pub const SESSION_SCORED: &str = "scored";

fn format_ts(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339()
}

/// Candidate-facing question view. Scoring metadata (trait model, weight,
/// reverse keying, option dimensions) stays server-side so answers cannot
/// be gamed against the key.
#[derive(Serialize)]
pub struct CandidateQuestion {
    pub id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub options: Value,
}

#[derive(Serialize)]
pub struct AssessmentResponse {
    pub template_id: Uuid,
    pub name: String,
    pub description: String,
    pub questions: Vec<CandidateQuestion>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub template_id: Uuid,
    pub status: String,
    pub big_five: Option<Value>,
    pub disc_raw: Option<Value>,
    pub disc_type: Option<String>,
    pub archetype: Option<Value>,
    pub started_at: String,
    pub submitted_at: Option<String>,
}

fn to_session_response(session: &AssessmentSession) -> SessionResponse {
    SessionResponse {
        id: session.id,
        template_id: session.template_id,
        status: session.status.clone(),
        big_five: session.big_five.clone(),
        disc_raw: session.disc_raw.clone(),
        disc_type: session.disc_type.clone(),
        archetype: session.archetype.clone(),
        started_at: format_ts(session.started_at),
        submitted_at: session.submitted_at.map(format_ts),
    }
}

fn option_labels(options: &Value) -> Value {
    match options.as_array() {
        Some(items) => json!(items
            .iter()
            .map(|item| json!({ "label": item.get("label").cloned().unwrap_or(Value::Null) }))
            .collect::<Vec<_>>()),
        None => json!([]),
    }
}

fn load_default_template(conn: &mut PgConnection) -> AppResult<AssessmentTemplate> {
    let template: Option<AssessmentTemplate> = assessment_templates::table
        .filter(assessment_templates::is_default.eq(true))
        .first(conn)
        .optional()?;
    template.ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, "no default assessment configured"))
}

fn load_questions(
    conn: &mut PgConnection,
    template_id: Uuid,
) -> AppResult<Vec<AssessmentQuestion>> {
    let rows = assessment_questions::table
        .filter(assessment_questions::template_id.eq(template_id))
        .order(assessment_questions::position.asc())
        .load(conn)?;
    Ok(rows)
}

fn to_scored_question(question: &AssessmentQuestion) -> ScoredQuestion {
    let option_dimensions = question
        .options
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("dimension").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    ScoredQuestion {
        id: question.id,
        kind: question.kind.clone(),
        trait_model: question.trait_model.clone(),
        dimension: question.dimension.clone(),
        reverse: question.reverse,
        weight: question.weight,
        option_dimensions,
    }
}

/// The default assessment, as a candidate sees it.
pub async fn get_assessment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<AssessmentResponse>> {
    let mut conn = state.db()?;

    let template = load_default_template(&mut conn)?;
    let questions = load_questions(&mut conn, template.id)?;

    Ok(Json(AssessmentResponse {
        template_id: template.id,
        name: template.name,
        description: template.description,
        questions: questions
            .iter()
            .map(|q| CandidateQuestion {
                id: q.id,
                position: q.position,
                prompt: q.prompt.clone(),
                kind: q.kind.clone(),
                options: option_labels(&q.options),
            })
            .collect(),
    }))
}

/// Starts a session on the default assessment. An existing in-progress
/// session is returned instead of opening a second one.
pub async fn start_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let mut conn = state.db()?;

    let template = load_default_template(&mut conn)?;

    let existing: Option<AssessmentSession> = assessment_sessions::table
        .filter(assessment_sessions::candidate_id.eq(user.user_id))
        .filter(assessment_sessions::template_id.eq(template.id))
        .filter(assessment_sessions::status.eq(SESSION_IN_PROGRESS))
        .first(&mut conn)
        .optional()?;
    if let Some(session) = existing {
        return Ok((StatusCode::OK, Json(to_session_response(&session))));
    }

    let new_session = NewAssessmentSession {
        id: Uuid::new_v4(),
        candidate_id: user.user_id,
        template_id: template.id,
        status: SESSION_IN_PROGRESS.to_string(),
        answers: json!({}),
    };
    let session: AssessmentSession = diesel::insert_into(assessment_sessions::table)
        .values(&new_session)
        .get_result(&mut conn)?;

    info!(session_id = %session.id, "assessment session started");
    Ok((StatusCode::CREATED, Json(to_session_response(&session))))
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub answers: HashMap<Uuid, AnswerValue>,
}

/// Scores a submitted session. Scores are computed synchronously so the
/// response carries them; the archetype label is generated best-effort and
/// left null when the generator is unavailable.
pub async fn submit_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SubmitRequest>,
) -> AppResult<Json<SessionResponse>> {
    let mut conn = state.db()?;

    let session: Option<AssessmentSession> = assessment_sessions::table
        .find(session_id)
        .filter(assessment_sessions::candidate_id.eq(user.user_id))
        .first(&mut conn)
        .optional()?;
    let session = session.ok_or_else(AppError::not_found)?;
    if session.status != SESSION_IN_PROGRESS {
        return Err(AppError::bad_request("session has already been submitted"));
    }

    let questions = load_questions(&mut conn, session.template_id)?;
    let missing = questions
        .iter()
        .filter(|q| !payload.answers.contains_key(&q.id))
        .count();
    if missing > 0 {
        return Err(AppError::bad_request(format!(
            "{missing} question(s) left unanswered"
        )));
    }

    let scored: Vec<ScoredQuestion> = questions.iter().map(to_scored_question).collect();
    let scores = scoring::score_session(&scored, &payload.answers)
        .map_err(|err| AppError::bad_request(err.to_string()))?;
    drop(conn);

    let archetype_input = ArchetypeInput {
        big_five: scores.big_five_json(),
        disc_type: scores.disc_type.to_string(),
    };
    let archetype = match state.genai.archetype(&archetype_input).await {
        Ok(label) => Some(serde_json::to_value(&label)?),
        Err(err) => {
            warn!(session_id = %session_id, error = ?err, "archetype generation failed");
            None
        }
    };

    let now = Utc::now().naive_utc();
    let mut conn = state.db()?;
    let updated: AssessmentSession = diesel::update(assessment_sessions::table.find(session_id))
        .set((
            assessment_sessions::status.eq(SESSION_SCORED),
            assessment_sessions::answers.eq(serde_json::to_value(&payload.answers)?),
            assessment_sessions::big_five.eq(Some(scores.big_five_json())),
            assessment_sessions::disc_raw.eq(Some(scores.disc_raw_json())),
            assessment_sessions::disc_type.eq(Some(scores.disc_type.to_string())),
            assessment_sessions::archetype.eq(archetype),
            assessment_sessions::submitted_at.eq(Some(now)),
            assessment_sessions::updated_at.eq(now),
        ))
        .get_result(&mut conn)?;

    info!(session_id = %session_id, disc_type = %scores.disc_type, "assessment session scored");
    Ok(Json(to_session_response(&updated)))
}

pub async fn get_own_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionResponse>> {
    let mut conn = state.db()?;

    let session: Option<AssessmentSession> = assessment_sessions::table
        .find(session_id)
        .filter(assessment_sessions::candidate_id.eq(user.user_id))
        .first(&mut conn)
        .optional()?;
    let session = session.ok_or_else(AppError::not_found)?;
    Ok(Json(to_session_response(&session)))
}

#[derive(Serialize)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub question_count: i64,
}

#[derive(Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

pub async fn admin_list_templates(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<TemplateResponse>>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let templates: Vec<AssessmentTemplate> = assessment_templates::table
        .order(assessment_templates::created_at.asc())
        .load(&mut conn)?;

    let mut out = Vec::with_capacity(templates.len());
    for template in templates {
        let question_count: i64 = assessment_questions::table
            .filter(assessment_questions::template_id.eq(template.id))
            .count()
            .get_result(&mut conn)?;
        out.push(TemplateResponse {
            id: template.id,
            name: template.name,
            description: template.description,
            is_default: template.is_default,
            question_count,
        });
    }
    Ok(Json(out))
}

pub async fn admin_create_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTemplateRequest>,
) -> AppResult<(StatusCode, Json<TemplateResponse>)> {
    require_staff(&user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }

    let mut conn = state.db()?;
    let template = conn.transaction::<AssessmentTemplate, AppError, _>(|conn| {
        if payload.is_default {
            diesel::update(assessment_templates::table)
                .set(assessment_templates::is_default.eq(false))
                .execute(conn)?;
        }
        let inserted = diesel::insert_into(assessment_templates::table)
            .values(&NewAssessmentTemplate {
                id: Uuid::new_v4(),
                name,
                description: payload.description,
                is_default: payload.is_default,
            })
            .get_result(conn)?;
        Ok(inserted)
    })?;

    info!(template_id = %template.id, "assessment template created");
    Ok((
        StatusCode::CREATED,
        Json(TemplateResponse {
            id: template.id,
            name: template.name,
            description: template.description,
            is_default: template.is_default,
            question_count: 0,
        }),
    ))
}

pub async fn admin_update_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(template_id): Path<Uuid>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> AppResult<Json<TemplateResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let existing: Option<AssessmentTemplate> = assessment_templates::table
        .find(template_id)
        .first(&mut conn)
        .optional()?;
    let existing = existing.ok_or_else(AppError::not_found)?;

    let name = match payload.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::bad_request("name must not be empty"));
            }
            name
        }
        None => existing.name,
    };
    let description = payload.description.unwrap_or(existing.description);
    let is_default = payload.is_default.unwrap_or(existing.is_default);

    let updated = conn.transaction::<AssessmentTemplate, AppError, _>(|conn| {
        if is_default {
            diesel::update(assessment_templates::table.filter(assessment_templates::id.ne(template_id)))
                .set(assessment_templates::is_default.eq(false))
                .execute(conn)?;
        }
        let row = diesel::update(assessment_templates::table.find(template_id))
            .set((
                assessment_templates::name.eq(&name),
                assessment_templates::description.eq(&description),
                assessment_templates::is_default.eq(is_default),
                assessment_templates::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result(conn)?;
        Ok(row)
    })?;

    let question_count: i64 = assessment_questions::table
        .filter(assessment_questions::template_id.eq(template_id))
        .count()
        .get_result(&mut conn)?;

    Ok(Json(TemplateResponse {
        id: updated.id,
        name: updated.name,
        description: updated.description,
        is_default: updated.is_default,
        question_count,
    }))
}

pub async fn admin_delete_template(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(template_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let session_count: i64 = assessment_sessions::table
        .filter(assessment_sessions::template_id.eq(template_id))
        .count()
        .get_result(&mut conn)?;
    if session_count > 0 {
        return Err(AppError::bad_request(
            "template has recorded sessions and cannot be deleted",
        ));
    }

    let deleted = conn.transaction::<usize, AppError, _>(|conn| {
        diesel::delete(
            assessment_questions::table.filter(assessment_questions::template_id.eq(template_id)),
        )
        .execute(conn)?;
        let deleted = diesel::delete(assessment_templates::table.find(template_id)).execute(conn)?;
        Ok(deleted)
    })?;

    if deleted == 0 {
        return Err(AppError::not_found());
    }
    info!(template_id = %template_id, "assessment template deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub template_id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub trait_model: String,
    pub dimension: Option<String>,
    pub reverse: bool,
    pub weight: f64,
    pub options: Value,
}

fn to_question_response(question: &AssessmentQuestion) -> QuestionResponse {
    QuestionResponse {
        id: question.id,
        template_id: question.template_id,
        position: question.position,
        prompt: question.prompt.clone(),
        kind: question.kind.clone(),
        trait_model: question.trait_model.clone(),
        dimension: question.dimension.clone(),
        reverse: question.reverse,
        weight: question.weight,
        options: question.options.clone(),
    }
}

#[derive(Deserialize)]
pub struct CreateQuestionRequest {
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub trait_model: String,
    pub dimension: Option<String>,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub options: Value,
}

fn default_weight() -> f64 {
    1.0
}

fn validate_question(
    kind: &str,
    trait_model: &str,
    dimension: Option<&str>,
    weight: f64,
    options: &Value,
) -> AppResult<()> {
    if weight <= 0.0 {
        return Err(AppError::bad_request("weight must be positive"));
    }

    match kind {
        KIND_LIKERT => {
            let dimensions: &[&str] = match trait_model {
                MODEL_BIG_FIVE => &BIG_FIVE_DIMENSIONS,
                MODEL_DISC => &DISC_DIMENSIONS,
                other => {
                    return Err(AppError::bad_request(format!(
                        "unknown trait model '{other}'"
                    )))
                }
            };
            let dimension = dimension
                .ok_or_else(|| AppError::bad_request("likert questions require a dimension"))?;
            if !dimensions.contains(&dimension) {
                return Err(AppError::bad_request(format!(
                    "unknown dimension '{dimension}' for model '{trait_model}'"
                )));
            }
        }
        KIND_FORCED_CHOICE => {
            if trait_model != MODEL_DISC {
                return Err(AppError::bad_request(
                    "forced-choice questions are DISC-only",
                ));
            }
            let items = options
                .as_array()
                .filter(|items| items.len() >= 2)
                .ok_or_else(|| {
                    AppError::bad_request("forced-choice questions need at least two options")
                })?;
            for item in items {
                let dimension = item.get("dimension").and_then(Value::as_str);
                match dimension {
                    Some(dim) if DISC_DIMENSIONS.contains(&dim) => {}
                    _ => {
                        return Err(AppError::bad_request(
                            "every option needs a valid DISC dimension",
                        ))
                    }
                }
                if item.get("label").and_then(Value::as_str).is_none() {
                    return Err(AppError::bad_request("every option needs a label"));
                }
            }
        }
        other => {
            return Err(AppError::bad_request(format!(
                "unknown question kind '{other}'"
            )))
        }
    }
    Ok(())
}

pub async fn admin_create_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(template_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> AppResult<(StatusCode, Json<QuestionResponse>)> {
    require_staff(&user)?;

    let prompt = payload.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(AppError::bad_request("prompt must not be empty"));
    }
    validate_question(
        &payload.kind,
        &payload.trait_model,
        payload.dimension.as_deref(),
        payload.weight,
        &payload.options,
    )?;

    let mut conn = state.db()?;
    let template_exists: i64 = assessment_templates::table
        .filter(assessment_templates::id.eq(template_id))
        .count()
        .get_result(&mut conn)?;
    if template_exists == 0 {
        return Err(AppError::not_found());
    }

    let options = if payload.options.is_null() {
        json!([])
    } else {
        payload.options
    };
    let question: AssessmentQuestion = diesel::insert_into(assessment_questions::table)
        .values(&NewAssessmentQuestion {
            id: Uuid::new_v4(),
            template_id,
            position: payload.position,
            prompt,
            kind: payload.kind,
            trait_model: payload.trait_model,
            dimension: payload.dimension,
            reverse: payload.reverse,
            weight: payload.weight,
            options,
        })
        .get_result(&mut conn)?;

    info!(question_id = %question.id, template_id = %template_id, "assessment question created");
    Ok((StatusCode::CREATED, Json(to_question_response(&question))))
}

#[derive(Deserialize)]
pub struct UpdateQuestionRequest {
    pub position: Option<i32>,
    pub prompt: Option<String>,
    pub dimension: Option<String>,
    pub reverse: Option<bool>,
    pub weight: Option<f64>,
    pub options: Option<Value>,
}

pub async fn admin_update_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> AppResult<Json<QuestionResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let existing: Option<AssessmentQuestion> = assessment_questions::table
        .find(question_id)
        .first(&mut conn)
        .optional()?;
    let existing = existing.ok_or_else(AppError::not_found)?;

    let position = payload.position.unwrap_or(existing.position);
    let prompt = match payload.prompt {
        Some(prompt) => {
            let prompt = prompt.trim().to_string();
            if prompt.is_empty() {
                return Err(AppError::bad_request("prompt must not be empty"));
            }
            prompt
        }
        None => existing.prompt,
    };
    let dimension = payload.dimension.or(existing.dimension);
    let reverse = payload.reverse.unwrap_or(existing.reverse);
    let weight = payload.weight.unwrap_or(existing.weight);
    let options = payload.options.unwrap_or(existing.options);

    validate_question(
        &existing.kind,
        &existing.trait_model,
        dimension.as_deref(),
        weight,
        &options,
    )?;

    let updated: AssessmentQuestion = diesel::update(assessment_questions::table.find(question_id))
        .set((
            assessment_questions::position.eq(position),
            assessment_questions::prompt.eq(&prompt),
            assessment_questions::dimension.eq(dimension.as_deref()),
            assessment_questions::reverse.eq(reverse),
            assessment_questions::weight.eq(weight),
            assessment_questions::options.eq(&options),
        ))
        .get_result(&mut conn)?;

    Ok(Json(to_question_response(&updated)))
}

pub async fn admin_delete_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(question_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let deleted =
        diesel::delete(assessment_questions::table.find(question_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SessionListQuery {
    pub candidate_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct AdminSessionResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub candidate_id: Uuid,
    pub candidate_username: Option<String>,
}

pub async fn admin_list_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<SessionListQuery>,
) -> AppResult<Json<Vec<AdminSessionResponse>>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let mut query = assessment_sessions::table.into_boxed();
    if let Some(candidate_id) = params.candidate_id {
        query = query.filter(assessment_sessions::candidate_id.eq(candidate_id));
    }
    if let Some(status) = params.status {
        query = query.filter(assessment_sessions::status.eq(status));
    }

    let sessions: Vec<AssessmentSession> = query
        .order(assessment_sessions::started_at.desc())
        .load(&mut conn)?;

    let mut out = Vec::with_capacity(sessions.len());
    for session in &sessions {
        let username: Option<String> = users::table
            .find(session.candidate_id)
            .select(users::username)
            .first(&mut conn)
            .optional()?;
        out.push(AdminSessionResponse {
            session: to_session_response(session),
            candidate_id: session.candidate_id,
            candidate_username: username,
        });
    }
    Ok(Json(out))
}

#[derive(Serialize)]
pub struct AdminSessionDetailResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub candidate_id: Uuid,
    pub answers: Value,
    pub questions: Vec<QuestionResponse>,
}

pub async fn admin_get_session(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<AdminSessionDetailResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let session: Option<AssessmentSession> = assessment_sessions::table
        .find(session_id)
        .first(&mut conn)
        .optional()?;
    let session = session.ok_or_else(AppError::not_found)?;
    let questions = load_questions(&mut conn, session.template_id)?;

    Ok(Json(AdminSessionDetailResponse {
        candidate_id: session.candidate_id,
        answers: session.answers.clone(),
        questions: questions.iter().map(to_question_response).collect(),
        session: to_session_response(&session),
    }))
}

#[derive(Deserialize)]
pub struct CommentaryRequest {
    pub question_id: Uuid,
}

#[derive(Serialize)]
pub struct CommentaryResponse {
    pub question_id: Uuid,
    pub commentary: String,
}

fn describe_answer(question: &AssessmentQuestion, answer: &AnswerValue) -> String {
    match answer {
        AnswerValue::Likert { value } => format!("rated {value} on a 1-7 scale"),
        AnswerValue::ForcedChoice { most, least } => {
            let label = |idx: usize| {
                question
                    .options
                    .get(idx)
                    .and_then(|o| o.get("label"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown option")
                    .to_string()
            };
            format!("most like me: {}; least like me: {}", label(*most), label(*least))
        }
    }
}

/// One-sentence remark about a single answer, for the HRD review screen.
pub async fn admin_answer_commentary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<CommentaryRequest>,
) -> AppResult<Json<CommentaryResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let session: Option<AssessmentSession> = assessment_sessions::table
        .find(session_id)
        .first(&mut conn)
        .optional()?;
    let session = session.ok_or_else(AppError::not_found)?;
    if session.status != SESSION_SCORED {
        return Err(AppError::bad_request("session has not been submitted yet"));
    }

    let question: Option<AssessmentQuestion> = assessment_questions::table
        .find(payload.question_id)
        .first(&mut conn)
        .optional()?;
    let question = question.ok_or_else(AppError::not_found)?;
    drop(conn);

    let answers: HashMap<Uuid, AnswerValue> = serde_json::from_value(session.answers)?;
    let answer = answers
        .get(&payload.question_id)
        .ok_or_else(|| AppError::bad_request("no answer recorded for that question"))?;

    let input = CommentaryInput {
        question: question.prompt.clone(),
        answer: describe_answer(&question, answer),
        dimension: question.dimension.clone(),
    };
    let commentary = state.genai.answer_commentary(&input).await?;

    Ok(Json(CommentaryResponse {
        question_id: payload.question_id,
        commentary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_labels_strips_dimensions() {
        let options = json!([
            { "label": "Takes charge", "dimension": "dominance" },
            { "label": "Keeps the peace", "dimension": "steadiness" }
        ]);
        let stripped = option_labels(&options);
        let items = stripped.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["label"], "Takes charge");
        assert!(items[0].get("dimension").is_none());
    }

    #[test]
    fn validate_question_rejects_bad_dimension() {
        let err = validate_question(
            KIND_LIKERT,
            MODEL_BIG_FIVE,
            Some("dominance"),
            1.0,
            &json!([]),
        );
        assert!(err.is_err());
    }

    #[test]
    fn validate_question_accepts_likert_for_both_models() {
        assert!(
            validate_question(KIND_LIKERT, MODEL_BIG_FIVE, Some("openness"), 1.0, &json!([]))
                .is_ok()
        );
        assert!(
            validate_question(KIND_LIKERT, MODEL_DISC, Some("steadiness"), 1.0, &json!([]))
                .is_ok()
        );
    }

    #[test]
    fn validate_question_accepts_forced_choice() {
        let options = json!([
            { "label": "a", "dimension": "dominance" },
            { "label": "b", "dimension": "influence" }
        ]);
        assert!(validate_question(KIND_FORCED_CHOICE, MODEL_DISC, None, 1.0, &options).is_ok());
    }
}
