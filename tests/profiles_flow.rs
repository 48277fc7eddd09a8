mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn wizard_steps_merge_and_round_trip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("nina", "candidate-pass", "candidate")
        .await?;
    let token = app.login_token("nina", "candidate-pass").await?;

    let response = app
        .put_json(
            "/api/profile/personal",
            &json!({ "full_name": "Nina Putri", "phone": "+62-812-000" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // Second partial save must not wipe the first one.
    let response = app
        .put_json(
            "/api/profile/personal",
            &json!({ "address": "Jl. Sudirman 1", "city": "Jakarta" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let profile: Value = serde_json::from_slice(&body)?;
    assert_eq!(profile["full_name"], "Nina Putri");
    assert_eq!(profile["address"], "Jl. Sudirman 1");
    assert_eq!(profile["is_complete"], false);

    let response = app
        .put_json(
            "/api/profile/education",
            &json!({ "entries": [{ "school": "UI", "degree": "S1", "year": 2020 }] }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .put_json(
            "/api/profile/experience",
            &json!({ "entries": [{ "company": "Hotel Indah", "title": "Receptionist" }] }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/profile", Some(&token)).await?;
    let body = body_to_vec(response.into_body()).await?;
    let profile: Value = serde_json::from_slice(&body)?;
    assert_eq!(profile["education"][0]["school"], "UI");
    assert_eq!(profile["experience"][0]["company"], "Hotel Indah");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn entries_must_be_an_array_of_objects() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("omar", "candidate-pass", "candidate")
        .await?;
    let token = app.login_token("omar", "candidate-pass").await?;

    let response = app
        .put_json(
            "/api/profile/education",
            &json!({ "entries": "not an array" }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .put_json(
            "/api/profile/experience",
            &json!({ "entries": ["plain string"] }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn cv_upload_completes_the_profile() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("putri", "candidate-pass", "candidate")
        .await?;
    let token = app.login_token("putri", "candidate-pass").await?;

    let response = app
        .put_json(
            "/api/profile/personal",
            &json!({
                "full_name": "Putri Lestari",
                "phone": "+62-813-111",
                "birth_date": "1998-04-02",
                "address": "Jl. Melati 5",
                "last_education": "D3 Hospitality"
            }),
            Some(&token),
        )
        .await?;
    let body = body_to_vec(response.into_body()).await?;
    let profile: Value = serde_json::from_slice(&body)?;
    assert_eq!(profile["is_complete"], false);

    let response = app
        .upload_cv("resume.pdf", "application/pdf", b"%PDF-1.4 fake", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_vec(response.into_body()).await?;
    let uploaded: Value = serde_json::from_slice(&body)?;
    assert_eq!(uploaded["cv_filename"], "resume.pdf");
    assert_eq!(uploaded["is_complete"], true);
    assert_eq!(app.storage().object_count().await, 1);

    let response = app.get("/api/profile/cv", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_vec(response.into_body()).await?;
    let download: Value = serde_json::from_slice(&body)?;
    assert!(download["url"]
        .as_str()
        .unwrap()
        .starts_with("https://fake-storage/cvs/"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn cv_upload_rejects_non_pdf() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("qori", "candidate-pass", "candidate")
        .await?;
    let token = app.login_token("qori", "candidate-pass").await?;

    let response = app
        .upload_cv("resume.docx", "application/msword", b"not a pdf", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.storage().object_count().await, 0);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn replacing_the_cv_drops_the_old_object() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let Some(app) = TestApp::try_new().await? else {
        return Ok(());
    };

    app.insert_user("rudi", "candidate-pass", "candidate")
        .await?;
    let token = app.login_token("rudi", "candidate-pass").await?;

    let response = app
        .upload_cv("v1.pdf", "application/pdf", b"%PDF-1.4 one", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .upload_cv("v2.pdf", "application/pdf", b"%PDF-1.4 two", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(app.storage().object_count().await, 1);

    app.cleanup().await?;
    Ok(())
}
