//! Login and admin console handlers

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::auth::{verify_credentials, SessionUser};
use super::{AppError, SharedState};
use crate::content::schema::humanize;
use crate::content::{map_submission, PageSchema, PageSubmission, StoreError};
use crate::news::ArticleForm;
use crate::templates::{page_view, PageLink};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub async fn login_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if state.sessions.user(&headers).await.is_some() {
        return Ok(Redirect::to("/admin/dashboard").into_response());
    }
    Ok(render_login(&state, None)?.into_response())
}

pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if !verify_credentials(&state.config.admin, &form.username, &form.password) {
        tracing::warn!("Failed admin login for {:?}", form.username);
        return Ok(render_login(&state, Some("Invalid username or password."))?.into_response());
    }

    let token = state
        .sessions
        .create(SessionUser {
            username: form.username.clone(),
        })
        .await;
    tracing::info!("Admin {} logged in", form.username);

    Ok((
        [(header::SET_COOKIE, state.sessions.session_cookie(&token))],
        Redirect::to("/admin/dashboard"),
    )
        .into_response())
}

pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    state.sessions.destroy(&headers).await;
    (
        [(header::SET_COOKIE, state.sessions.expired_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

fn render_login(state: &SharedState, error: Option<&str>) -> Result<Html<String>, AppError> {
    let mut context = state.context("Admin Login", false);
    context.insert("error", &error);
    state.render("admin/login.html", &context)
}

pub async fn dashboard(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let content = state.store.snapshot().await;
    let pages: Vec<PageLink> = content
        .keys()
        .map(|key| PageLink {
            key: key.clone(),
            title: PageSchema::find(key)
                .map(|s| s.display_name())
                .unwrap_or_else(|| humanize(key)),
        })
        .collect();
    let article_count = state.articles.list().await.len();

    let mut context = state.context("Admin Dashboard", true);
    context.insert("pages", &pages);
    context.insert("article_count", &article_count);
    state.render("admin/dashboard.html", &context)
}

pub async fn edit_page(
    State(state): State<SharedState>,
    Path(page): Path<String>,
    Query(flags): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let content = state
        .store
        .page(&page)
        .await
        .ok_or_else(|| StoreError::UnknownPage(page.clone()))?;

    let view = page_view(&page, &content);
    let saved = flags.get("saved").map(String::as_str);

    let mut context = state.context(&format!("Edit {} Page", view.title), true);
    context.insert("page", &view);
    context.insert("saved", &(saved == Some("true")));
    context.insert("failed", &(saved == Some("false")));
    state.render("admin/edit_page.html", &context)
}

/// Apply an edit form to a page
///
/// Files are stored before the content changes; if the save then fails they
/// are logged as orphaned and the editor is sent back with `saved=false`.
pub async fn update_page(
    State(state): State<SharedState>,
    Path(page): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    if !state.store.contains_page(&page).await {
        return Err(AppError::NotFound("Page not found".to_string()));
    }

    let upload = state.uploads.read_multipart(multipart).await?;
    let submission = PageSubmission::from_fields(upload.fields.iter().map(|(k, v)| (k, v.clone())));
    let files = upload.upload_map();

    let result = state
        .store
        .update_page(&page, |content| {
            let mapped = map_submission(content, &submission, &files);
            *content = mapped.content;
            mapped.unused_uploads
        })
        .await;

    let saved = match result {
        Ok(unused) => {
            if !unused.is_empty() {
                tracing::warn!("Uploads not attached to any field of {}: {:?}", page, unused);
            }
            tracing::info!("Updated page {}", page);
            true
        }
        Err(StoreError::UnknownPage(key)) => {
            return Err(StoreError::UnknownPage(key).into());
        }
        Err(e) => {
            tracing::error!("Failed to save page {}: {}", page, e);
            log_orphans(&upload.public_paths());
            false
        }
    };

    Ok(Redirect::to(&format!("/admin/edit/{}?saved={}", page, saved)).into_response())
}

pub async fn news_list(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let articles = state.articles.list().await;
    let mut context = state.context("Manage News", true);
    context.insert("articles", &articles);
    state.render("admin/news_list.html", &context)
}

pub async fn news_add_form(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let mut context = state.context("Add New Article", true);
    context.insert("article", &None::<crate::news::Article>);
    state.render("admin/news_edit.html", &context)
}

pub async fn news_add(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = state.uploads.read_multipart(multipart).await?;
    let image = upload.file("image").map(|f| f.public_path.clone());

    if let Err(e) = state
        .articles
        .add(ArticleForm::from_submission(&upload), image)
        .await
    {
        tracing::error!("Failed to add article: {}", e);
        log_orphans(&upload.public_paths());
    }
    Ok(Redirect::to("/admin/news"))
}

pub async fn news_edit_form(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let not_found = || AppError::NotFound("Article not found".to_string());
    let id = parse_id(&id).ok_or_else(not_found)?;
    let article = state.articles.get(id).await.ok_or_else(not_found)?;

    let mut context = state.context("Edit Article", true);
    context.insert("article", &article);
    state.render("admin/news_edit.html", &context)
}

pub async fn news_edit(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = state.uploads.read_multipart(multipart).await?;
    let image = upload.file("image").map(|f| f.public_path.clone());

    let Some(id) = parse_id(&id) else {
        log_orphans(&upload.public_paths());
        return Ok(Redirect::to("/admin/news"));
    };

    match state
        .articles
        .edit(id, ArticleForm::from_submission(&upload), image)
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => log_orphans(&upload.public_paths()),
        Err(e) => {
            tracing::error!("Failed to update article {}: {}", id, e);
            log_orphans(&upload.public_paths());
        }
    }
    Ok(Redirect::to("/admin/news"))
}

pub async fn news_delete(State(state): State<SharedState>, Path(id): Path<String>) -> Redirect {
    if let Some(id) = parse_id(&id) {
        if let Err(e) = state.articles.delete(id).await {
            tracing::error!("Failed to delete article {}: {}", id, e);
        }
    }
    Redirect::to("/admin/news")
}

/// Leading integer of a path segment, so `/edit/17-old-title` still finds 17
fn parse_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

fn log_orphans(paths: &[String]) {
    if !paths.is_empty() {
        tracing::warn!("Orphaned uploads left on disk: {:?}", paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_id("17-old-title"), Some(17));
        assert_eq!(parse_id("-3"), Some(-3));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
    }
}
