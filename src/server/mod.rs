//! HTTP server: public pages, inquiry forms and the admin console

mod admin;
pub mod auth;
mod public;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::content::{ContentStore, StoreError};
use crate::news::ArticleRepository;
use crate::templates::TemplateRenderer;
use crate::upload::{UploadError, UploadStore};
use crate::Site;

use auth::SessionStore;

/// Request body limit for multipart uploads
const UPLOAD_LIMIT_BYTES: usize = 25 * 1024 * 1024;

/// Server state
pub struct AppState {
    pub config: SiteConfig,
    pub store: Arc<ContentStore>,
    pub articles: ArticleRepository,
    pub uploads: UploadStore,
    pub renderer: TemplateRenderer,
    pub sessions: SessionStore,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Open the content store and build everything the handlers share
    pub async fn new(site: &Site) -> Result<Self> {
        let store = Arc::new(ContentStore::open(site.content_path()).await);
        let articles = ArticleRepository::new(store.clone(), &site.config.article_placeholder);
        Ok(Self {
            config: site.config.clone(),
            articles,
            uploads: UploadStore::from_config(&site.base_dir, &site.config),
            renderer: TemplateRenderer::new()?,
            sessions: SessionStore::new(
                &site.config.session_cookie,
                site.config.session_idle_timeout(),
            ),
            store,
        })
    }

    /// Context every template expects
    fn context(&self, title: &str, logged_in: bool) -> Context {
        let mut context = Context::new();
        context.insert("title", title);
        context.insert("site_title", &self.config.title);
        context.insert("nav", &public::nav_links());
        context.insert("logged_in", &logged_in);
        context
    }

    fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.renderer.render(template, context)?))
    }
}

/// Handler errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            AppError::Store(StoreError::UnknownPage(key)) => (
                StatusCode::NOT_FOUND,
                format!("Page content not found for key: \"{}\".", key),
            )
                .into_response(),
            AppError::Upload(UploadError::Multipart(e)) => {
                tracing::warn!("Rejected upload: {}", e);
                (StatusCode::BAD_REQUEST, "Malformed upload").into_response()
            }
            other => {
                tracing::error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
            }
        }
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let admin = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/edit/:page", get(admin::edit_page))
        .route("/update/:page", post(admin::update_page))
        .route("/news", get(admin::news_list))
        .route("/news/add", get(admin::news_add_form).post(admin::news_add))
        .route("/news/edit/:id", get(admin::news_edit_form).post(admin::news_edit))
        .route("/news/delete/:id", post(admin::news_delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let public_dir = state.uploads.public_dir().to_path_buf();

    public::routes()
        .route("/login", get(admin::login_form).post(admin::login))
        .route("/logout", get(admin::logout))
        .nest("/admin", admin)
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(site).await?);

    if state.config.admin.is_default() {
        tracing::warn!(
            "Admin login uses the built-in default credentials; \
             set admin.username and admin.password in site.yml"
        );
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
