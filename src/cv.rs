//! CV text extraction with a TTL cache on the candidate profile.
//!
//! The cached text lives on `candidate_profiles.cv_text` next to its
//! extraction timestamp. A fresh timestamp short-circuits; a stale or missing
//! one triggers fetch + PDF parse, and the cache write-back happens in a
//! spawned task so the response never waits on it. Two concurrent misses may
//! both parse the same file; the cost is a redundant parse, not corruption.

use chrono::{Duration as ChronoDuration, NaiveDateTime, Utc};
use diesel::prelude::*;
use pdfium_render::prelude::*;
use tokio::task;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::CandidateProfile,
    schema::candidate_profiles,
    state::AppState,
};

pub fn cache_is_fresh(
    extracted_at: Option<NaiveDateTime>,
    ttl_days: i64,
    now: NaiveDateTime,
) -> bool {
    match extracted_at {
        Some(extracted_at) => now - extracted_at < ChronoDuration::days(ttl_days),
        None => false,
    }
}

/// External CV URLs are only fetched from allow-listed hosts (exact match or
/// subdomain of an allowed host).
pub fn host_is_allowed(raw_url: &str, allowed_hosts: &[String]) -> bool {
    let Ok(parsed) = url::Url::parse(raw_url) else {
        return false;
    };
    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    allowed_hosts
        .iter()
        .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
}

/// Collapses whitespace runs into single spaces.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn extract_pdf_text(bytes: &[u8]) -> anyhow::Result<String> {
    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|err| anyhow::anyhow!("load pdf: {err}"))?;

    let mut combined = String::new();
    let pages = document.pages();
    for page_index in 0..pages.len() {
        let page = pages
            .get(page_index)
            .map_err(|err| anyhow::anyhow!("load page {page_index}: {err}"))?;
        if let Ok(page_text) = page.text() {
            for segment in page_text.segments().iter() {
                combined.push_str(&segment.text());
                combined.push('\n');
            }
        };
    }

    Ok(combined)
}

/// Returns the candidate's CV text, serving from the profile cache when it is
/// younger than the configured TTL and refreshing it otherwise.
pub async fn resolve_cv_text(state: &AppState, profile: &CandidateProfile) -> AppResult<String> {
    let now = Utc::now().naive_utc();
    if cache_is_fresh(profile.cv_text_extracted_at, state.config.cv_text_ttl_days, now) {
        if let Some(cached) = &profile.cv_text {
            return Ok(cached.clone());
        }
    }

    let bytes = load_cv_bytes(state, profile).await?;

    let extracted = task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|err| AppError::internal(format!("cv parse task panicked: {err}")))?
        .map_err(AppError::internal)?;

    let text = normalize_whitespace(&extracted);
    if text.is_empty() {
        return Err(AppError::bad_request("no text could be extracted from CV"));
    }

    // Fire-and-forget write-back: the caller gets the text immediately.
    spawn_cache_write(state, profile.user_id, text.clone());

    Ok(text)
}

async fn load_cv_bytes(state: &AppState, profile: &CandidateProfile) -> AppResult<Vec<u8>> {
    if let Some(cv_key) = &profile.cv_key {
        return state
            .storage
            .get_object(cv_key)
            .await
            .map_err(AppError::internal);
    }

    let Some(cv_url) = &profile.cv_url else {
        return Err(AppError::bad_request("candidate has no CV on file"));
    };

    if !host_is_allowed(cv_url, &state.config.cv_allowed_hosts) {
        return Err(AppError::bad_request("CV URL host is not allow-listed"));
    }

    let response = state
        .http
        .get(cv_url)
        .send()
        .await
        .map_err(|err| AppError::internal(format!("failed to fetch CV: {err}")))?;

    if !response.status().is_success() {
        return Err(AppError::internal(format!(
            "CV fetch returned status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| AppError::internal(format!("failed to read CV body: {err}")))?;

    Ok(bytes.to_vec())
}

fn spawn_cache_write(state: &AppState, user_id: Uuid, text: String) {
    let pool = state.pool.clone();
    tokio::spawn(async move {
        let result = task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut conn = pool.get()?;
            diesel::update(candidate_profiles::table.find(user_id))
                .set((
                    candidate_profiles::cv_text.eq(Some(text)),
                    candidate_profiles::cv_text_extracted_at.eq(Some(Utc::now().naive_utc())),
                    candidate_profiles::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(&mut conn)?;
            Ok(())
        })
        .await;

        match result {
            Ok(Ok(())) => info!(candidate_id = %user_id, "cv text cache updated"),
            Ok(Err(err)) => warn!(candidate_id = %user_id, error = %err, "cv cache write failed"),
            Err(err) => warn!(candidate_id = %user_id, error = %err, "cv cache task panicked"),
        }
    });
}
