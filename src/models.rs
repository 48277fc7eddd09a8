use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub full_name: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = brands)]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = brands)]
pub struct NewBrand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = navigation_items)]
pub struct NavigationItem {
    pub id: Uuid,
    pub label: String,
    pub href: String,
    pub position: i32,
    pub visible: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = navigation_items)]
pub struct NewNavigationItem {
    pub id: Uuid,
    pub label: String,
    pub href: String,
    pub position: i32,
    pub visible: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = job_postings)]
#[diesel(belongs_to(Brand, foreign_key = brand_id))]
pub struct JobPosting {
    pub id: Uuid,
    pub brand_id: Option<Uuid>,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    pub requirements: serde_json::Value,
    pub status: String,
    pub posted_at: NaiveDateTime,
    pub closes_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = job_postings)]
pub struct NewJobPosting {
    pub id: Uuid,
    pub brand_id: Option<Uuid>,
    pub title: String,
    pub department: String,
    pub location: String,
    pub employment_type: String,
    pub description: String,
    pub requirements: serde_json::Value,
    pub status: String,
    pub closes_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = candidate_profiles)]
#[diesel(primary_key(user_id))]
pub struct CandidateProfile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub summary: Option<String>,
    pub last_education: Option<String>,
    pub education: serde_json::Value,
    pub experience: serde_json::Value,
    pub cv_key: Option<String>,
    pub cv_filename: Option<String>,
    pub cv_url: Option<String>,
    pub cv_text: Option<String>,
    pub cv_text_extracted_at: Option<NaiveDateTime>,
    pub is_complete: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = candidate_profiles)]
pub struct NewCandidateProfile {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = applications)]
pub struct Application {
    pub id: String,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub position_title: String,
    pub brand_name: Option<String>,
    pub candidate_name: String,
    pub stage: String,
    pub interview_at: Option<NaiveDateTime>,
    pub interview_location: Option<String>,
    pub interview_notes: Option<String>,
    pub fit_report: Option<serde_json::Value>,
    pub fit_report_generated_at: Option<NaiveDateTime>,
    pub applied_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = applications)]
pub struct NewApplication {
    pub id: String,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub position_title: String,
    pub brand_name: Option<String>,
    pub candidate_name: String,
    pub stage: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = assessment_templates)]
pub struct AssessmentTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = assessment_templates)]
pub struct NewAssessmentTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = assessment_questions)]
pub struct AssessmentQuestion {
    pub id: Uuid,
    pub template_id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub trait_model: String,
    pub dimension: Option<String>,
    pub reverse: bool,
    pub weight: f64,
    pub options: serde_json::Value,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = assessment_questions)]
pub struct NewAssessmentQuestion {
    pub id: Uuid,
    pub template_id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub trait_model: String,
    pub dimension: Option<String>,
    pub reverse: bool,
    pub weight: f64,
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = assessment_sessions)]
pub struct AssessmentSession {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub template_id: Uuid,
    pub status: String,
    pub answers: serde_json::Value,
    pub big_five: Option<serde_json::Value>,
    pub disc_raw: Option<serde_json::Value>,
    pub disc_type: Option<String>,
    pub archetype: Option<serde_json::Value>,
    pub started_at: NaiveDateTime,
    pub submitted_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = assessment_sessions)]
pub struct NewAssessmentSession {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub template_id: Uuid,
    pub status: String,
    pub answers: serde_json::Value,
}
