use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod admin;
pub mod applications;
pub mod assessments;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod profiles;
pub mod settings;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let public_routes = Router::new()
        .route("/api/jobs", get(jobs::list_open_jobs))
        .route("/api/jobs/:id", get(jobs::get_open_job))
        .route("/api/brands", get(settings::list_brands))
        .route("/api/navigation", get(settings::list_navigation));

    let profile_routes = Router::new()
        .route("/", get(profiles::get_profile))
        .route("/personal", put(profiles::save_personal_step))
        .route("/education", put(profiles::save_education_step))
        .route("/experience", put(profiles::save_experience_step))
        .route("/cv", post(profiles::upload_cv).get(profiles::download_cv));

    let assessment_routes = Router::new()
        .route("/", get(assessments::get_assessment))
        .route("/sessions", post(assessments::start_session))
        .route("/sessions/:id", get(assessments::get_own_session))
        .route("/sessions/:id/submit", post(assessments::submit_session));

    let admin_job_routes = Router::new()
        .route("/", get(jobs::admin_list_jobs).post(jobs::admin_create_job))
        .route(
            "/:id",
            patch(jobs::admin_update_job).delete(jobs::admin_delete_job),
        )
        .route("/:id/status", patch(jobs::admin_set_job_status));

    let admin_application_routes = Router::new()
        .route("/", get(applications::admin_list))
        .route("/:id", get(applications::admin_detail))
        .route("/:id/stage", patch(applications::admin_set_stage))
        .route(
            "/:id/interview",
            post(applications::admin_schedule_interview),
        )
        .route("/:id/cv-text", get(applications::admin_cv_text))
        .route("/:id/fit-report", post(applications::admin_fit_report));

    let admin_assessment_routes = Router::new()
        .route(
            "/templates",
            get(assessments::admin_list_templates).post(assessments::admin_create_template),
        )
        .route(
            "/templates/:id",
            patch(assessments::admin_update_template).delete(assessments::admin_delete_template),
        )
        .route(
            "/templates/:id/questions",
            post(assessments::admin_create_question),
        )
        .route(
            "/questions/:id",
            patch(assessments::admin_update_question).delete(assessments::admin_delete_question),
        )
        .route("/sessions", get(assessments::admin_list_sessions))
        .route("/sessions/:id", get(assessments::admin_get_session))
        .route(
            "/sessions/:id/commentary",
            post(assessments::admin_answer_commentary),
        );

    let admin_user_routes = Router::new()
        .route("/", get(admin::list_users))
        .route("/seed", post(admin::seed_user))
        .route("/:id", delete(admin::delete_user))
        .route("/:id/role", patch(admin::set_user_role));

    let maintenance_routes = Router::new()
        .route("/bootstrap-assessment", post(admin::bootstrap_assessment))
        .route("/repair-assessment", post(admin::repair_assessment))
        .route("/sync-roles", post(admin::sync_roles));

    let admin_brand_routes = Router::new()
        .route("/", post(settings::admin_create_brand))
        .route(
            "/:id",
            patch(settings::admin_update_brand).delete(settings::admin_delete_brand),
        );

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/profile", profile_routes)
        .nest("/api/assessment", assessment_routes)
        .route("/api/jobs/:id/apply", post(applications::apply))
        .route("/api/applications", get(applications::list_own))
        .nest("/api/admin/jobs", admin_job_routes)
        .nest("/api/admin/applications", admin_application_routes)
        .nest("/api/admin/assessment", admin_assessment_routes)
        .nest("/api/admin/users", admin_user_routes)
        .nest("/api/admin/maintenance", maintenance_routes)
        .nest("/api/admin/brands", admin_brand_routes)
        .route(
            "/api/admin/navigation",
            put(settings::admin_replace_navigation),
        )
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20))
}
