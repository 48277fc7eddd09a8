mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use diesel::prelude::*;
use serde_json::{json, Value};

#[tokio::test]
async fn user_management_is_admin_only() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("root", "admin-password", "admin").await?;
    app.insert_user("hrd", "staff-password", "hrd").await?;
    let admin_token = app.login_token("root", "admin-password").await?;
    let staff_token = app.login_token("hrd", "staff-password").await?;

    let response = app.get("/api/admin/users", Some(&staff_token)).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/admin/users", Some(&admin_token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let users: Vec<Value> = serde_json::from_slice(&body)?;
    assert_eq!(users.len(), 2);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn role_changes_are_validated() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    let admin_id = app.insert_user("root", "admin-password", "admin").await?;
    let user_id = app
        .insert_user("zara", "candidate-pass", "candidate")
        .await?;
    let admin_token = app.login_token("root", "admin-password").await?;

    let response = app
        .patch_json(
            &format!("/api/admin/users/{user_id}/role"),
            &json!({ "role": "superuser" }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch_json(
            &format!("/api/admin/users/{admin_id}/role"),
            &json!({ "role": "candidate" }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch_json(
            &format!("/api/admin/users/{user_id}/role"),
            &json!({ "role": "hrd" }),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let updated: Value = serde_json::from_slice(&body)?;
    assert_eq!(updated["role"], "hrd");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn seeding_a_user_is_idempotent() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("root", "admin-password", "admin").await?;
    let admin_token = app.login_token("root", "admin-password").await?;

    let payload = json!({
        "username": "recruiter",
        "password": "staff-password",
        "role": "hrd",
        "full_name": "New Recruiter"
    });
    let response = app
        .post_json("/api/admin/users/seed", &payload, Some(&admin_token))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let seeded: Value = serde_json::from_slice(&body)?;
    assert_eq!(seeded["created"], true);

    let response = app
        .post_json("/api/admin/users/seed", &payload, Some(&admin_token))
        .await?;
    let body = body_to_vec(response.into_body()).await?;
    let seeded: Value = serde_json::from_slice(&body)?;
    assert_eq!(seeded["created"], false);

    // The seeded account can actually log in.
    app.login_token("recruiter", "staff-password").await?;

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_data() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("root", "admin-password", "admin").await?;
    let user_id = app
        .insert_user("gone", "candidate-pass", "candidate")
        .await?;
    let admin_token = app.login_token("root", "admin-password").await?;
    let token = app.login_token("gone", "candidate-pass").await?;

    let response = app
        .upload_cv("cv.pdf", "application/pdf", b"%PDF-1.4 bye", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.storage().object_count().await, 1);

    let response = app
        .delete(&format!("/api/admin/users/{user_id}"), Some(&admin_token))
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.storage().object_count().await, 0);

    let remaining: i64 = app
        .with_conn(move |conn| {
            use careers_backend::schema::candidate_profiles::dsl::{
                candidate_profiles, user_id as profile_user_id,
            };
            Ok(candidate_profiles
                .filter(profile_user_id.eq(user_id))
                .count()
                .get_result(conn)?)
        })
        .await?;
    assert_eq!(remaining, 0);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn maintenance_bootstrap_reports_created_once() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("root", "admin-password", "admin").await?;
    let admin_token = app.login_token("root", "admin-password").await?;

    let response = app
        .post_json(
            "/api/admin/maintenance/bootstrap-assessment",
            &json!({}),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let first: Value = serde_json::from_slice(&body)?;
    assert_eq!(first["created"], true);

    let response = app
        .post_json(
            "/api/admin/maintenance/bootstrap-assessment",
            &json!({}),
            Some(&admin_token),
        )
        .await?;
    let body = body_to_vec(response.into_body()).await?;
    let second: Value = serde_json::from_slice(&body)?;
    assert_eq!(second["created"], false);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn repair_removes_orphaned_assessment_rows() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("root", "admin-password", "admin").await?;
    let admin_token = app.login_token("root", "admin-password").await?;

    app.post_json(
        "/api/admin/maintenance/bootstrap-assessment",
        &json!({}),
        Some(&admin_token),
    )
    .await?;

    // Questions carry no foreign key, so dropping the template strands them.
    app.with_conn(|conn| {
        use careers_backend::schema::assessment_templates::dsl::assessment_templates;
        diesel::delete(assessment_templates).execute(conn)?;
        Ok(())
    })
    .await?;

    let response = app
        .post_json(
            "/api/admin/maintenance/repair-assessment",
            &json!({}),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let repaired: Value = serde_json::from_slice(&body)?;
    assert_eq!(repaired["orphaned_questions_deleted"], 19);
    assert_eq!(repaired["orphaned_sessions_deleted"], 0);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn sync_roles_normalizes_unknown_roles() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("root", "admin-password", "admin").await?;
    app.insert_user("odd", "candidate-pass", "recruiter-legacy")
        .await?;
    let admin_token = app.login_token("root", "admin-password").await?;

    let response = app
        .post_json(
            "/api/admin/maintenance/sync-roles",
            &json!({}),
            Some(&admin_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let synced: Value = serde_json::from_slice(&body)?;
    assert_eq!(synced["updated"], 1);

    let role: String = app
        .with_conn(|conn| {
            use careers_backend::schema::users::dsl::{role, username, users};
            Ok(users
                .filter(username.eq("odd"))
                .select(role)
                .first(conn)?)
        })
        .await?;
    assert_eq!(role, "candidate");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn brands_and_navigation_round_trip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("hrd", "staff-password", "hrd").await?;
    let staff_token = app.login_token("hrd", "staff-password").await?;

    let response = app
        .post_json(
            "/api/admin/brands",
            &json!({ "name": "Blue Harbor Hotels", "tagline": "Stay longer" }),
            Some(&staff_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_vec(response.into_body()).await?;
    let brand: Value = serde_json::from_slice(&body)?;
    assert_eq!(brand["slug"], "blue-harbor-hotels");

    let response = app.get("/api/brands", None).await?;
    let body = body_to_vec(response.into_body()).await?;
    let brands: Vec<Value> = serde_json::from_slice(&body)?;
    assert_eq!(brands.len(), 1);

    let response = app
        .put_json(
            "/api/admin/navigation",
            &json!({ "items": [
                { "label": "Jobs", "href": "/jobs" },
                { "label": "About", "href": "/about", "visible": false },
                { "label": "Contact", "href": "/contact" }
            ]}),
            Some(&staff_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Public listing only shows visible items, in order.
    let response = app.get("/api/navigation", None).await?;
    let body = body_to_vec(response.into_body()).await?;
    let items: Vec<Value> = serde_json::from_slice(&body)?;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["label"], "Jobs");
    assert_eq!(items[1]["label"], "Contact");

    // A replace swaps the whole menu.
    let response = app
        .put_json(
            "/api/admin/navigation",
            &json!({ "items": [{ "label": "Careers", "href": "/careers" }] }),
            Some(&staff_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.get("/api/navigation", None).await?;
    let body = body_to_vec(response.into_body()).await?;
    let items: Vec<Value> = serde_json::from_slice(&body)?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["label"], "Careers");

    app.cleanup().await?;
    Ok(())
}
