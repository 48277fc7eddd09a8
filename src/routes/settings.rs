use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{require_staff, AuthenticatedUser};
use crate::error::{AppError, AppResult};
use crate::models::{Brand, NavigationItem, NewBrand, NewNavigationItem};
use crate::schema::{brands, job_postings, navigation_items};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BrandResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
}

fn to_brand_response(brand: &Brand) -> BrandResponse {
    BrandResponse {
        id: brand.id,
        name: brand.name.clone(),
        slug: brand.slug.clone(),
        tagline: brand.tagline.clone(),
        logo_url: brand.logo_url.clone(),
    }
}

#[derive(Serialize)]
pub struct NavigationItemResponse {
    pub id: Uuid,
    pub label: String,
    pub href: String,
    pub position: i32,
    pub visible: bool,
}

pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<Vec<BrandResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Brand> = brands::table.order(brands::name.asc()).load(&mut conn)?;
    Ok(Json(rows.iter().map(to_brand_response).collect()))
}

/// Visible navigation entries in display order, for the public site shell.
pub async fn list_navigation(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<NavigationItemResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<NavigationItem> = navigation_items::table
        .filter(navigation_items::visible.eq(true))
        .order(navigation_items::position.asc())
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|item| NavigationItemResponse {
                id: item.id,
                label: item.label,
                href: item.href,
                position: item.position,
                visible: item.visible,
            })
            .collect(),
    ))
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[derive(Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    pub slug: Option<String>,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
}

pub async fn admin_create_brand(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBrandRequest>,
) -> AppResult<(StatusCode, Json<BrandResponse>)> {
    require_staff(&user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let slug = match payload.slug {
        Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
        _ => slugify(&name),
    };

    let mut conn = state.db()?;
    let brand: Brand = match diesel::insert_into(brands::table)
        .values(&NewBrand {
            id: Uuid::new_v4(),
            name,
            slug,
            tagline: payload.tagline,
            logo_url: payload.logo_url,
        })
        .get_result(&mut conn)
    {
        Ok(brand) => brand,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => return Err(AppError::bad_request("brand slug already in use")),
        Err(err) => return Err(AppError::from(err)),
    };

    info!(brand_id = %brand.id, "brand created");
    Ok((StatusCode::CREATED, Json(to_brand_response(&brand))))
}

#[derive(Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
}

pub async fn admin_update_brand(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(brand_id): Path<Uuid>,
    Json(payload): Json<UpdateBrandRequest>,
) -> AppResult<Json<BrandResponse>> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let existing: Option<Brand> = brands::table.find(brand_id).first(&mut conn).optional()?;
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
    let slug = match payload.slug {
        Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
        Some(_) => return Err(AppError::bad_request("slug must not be empty")),
        None => existing.slug,
    };
    let tagline = payload.tagline.or(existing.tagline);
    let logo_url = payload.logo_url.or(existing.logo_url);

    let updated: Brand = diesel::update(brands::table.find(brand_id))
        .set((
            brands::name.eq(&name),
            brands::slug.eq(&slug),
            brands::tagline.eq(tagline.as_deref()),
            brands::logo_url.eq(logo_url.as_deref()),
            brands::updated_at.eq(Utc::now().naive_utc()),
        ))
        .get_result(&mut conn)?;

    Ok(Json(to_brand_response(&updated)))
}

pub async fn admin_delete_brand(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(brand_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_staff(&user)?;
    let mut conn = state.db()?;

    let job_count: i64 = job_postings::table
        .filter(job_postings::brand_id.eq(brand_id))
        .count()
        .get_result(&mut conn)?;
    if job_count > 0 {
        return Err(AppError::bad_request(
            "brand has job postings and cannot be deleted",
        ));
    }

    let deleted = diesel::delete(brands::table.find(brand_id)).execute(&mut conn)?;
    if deleted == 0 {
        return Err(AppError::not_found());
    }
    info!(brand_id = %brand_id, "brand deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct NavigationEntry {
    pub label: String,
    pub href: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

#[derive(Deserialize)]
pub struct ReplaceNavigationRequest {
    pub items: Vec<NavigationEntry>,
}

/// Replaces the whole navigation in one transaction; readers never observe
/// a half-written menu.
pub async fn admin_replace_navigation(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ReplaceNavigationRequest>,
) -> AppResult<Json<Vec<NavigationItemResponse>>> {
    require_staff(&user)?;

    for entry in &payload.items {
        if entry.label.trim().is_empty() || entry.href.trim().is_empty() {
            return Err(AppError::bad_request(
                "every navigation item needs a label and an href",
            ));
        }
    }

    let mut conn = state.db()?;
    let inserted = conn.transaction::<Vec<NavigationItem>, AppError, _>(|conn| {
        diesel::delete(navigation_items::table).execute(conn)?;
        let rows: Vec<NewNavigationItem> = payload
            .items
            .iter()
            .enumerate()
            .map(|(idx, entry)| NewNavigationItem {
                id: Uuid::new_v4(),
                label: entry.label.trim().to_string(),
                href: entry.href.trim().to_string(),
                position: idx as i32,
                visible: entry.visible,
            })
            .collect();
        let inserted = diesel::insert_into(navigation_items::table)
            .values(&rows)
            .get_results(conn)?;
        Ok(inserted)
    })?;

    info!(count = inserted.len(), "navigation replaced");
    Ok(Json(
        inserted
            .into_iter()
            .map(|item| NavigationItemResponse {
                id: item.id,
                label: item.label,
                href: item.href,
                position: item.position,
                visible: item.visible,
            })
            .collect(),
    ))
}
