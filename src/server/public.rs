//! Public pages and visitor forms

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Query, State},
    http::HeaderMap,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use serde::Serialize;

use super::{AppError, SharedState};
use crate::templates::{page_view, NavLink};

/// Visitor form shown on a public page
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InquiryForm {
    pub heading: &'static str,
    pub action: &'static str,
    pub multipart: bool,
}

/// A public page and the content it shows
#[derive(Debug)]
pub struct PublicPage {
    pub path: &'static str,
    pub title: &'static str,
    /// Page keys whose content is rendered, in order
    pub content: &'static [&'static str],
    pub articles: bool,
    pub form: Option<InquiryForm>,
    pub in_nav: bool,
}

const fn inquiry(heading: &'static str, action: &'static str) -> Option<InquiryForm> {
    Some(InquiryForm {
        heading,
        action,
        multipart: false,
    })
}

pub const PUBLIC_PAGES: &[PublicPage] = &[
    PublicPage {
        path: "/",
        title: "Home",
        content: &["home"],
        articles: true,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/about",
        title: "About Us",
        content: &["about"],
        articles: false,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/conservancies",
        title: "Our Conservancies",
        content: &["george_mukoya", "muduva_nyangana"],
        articles: false,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/projects",
        title: "Projects & Programs",
        content: &["projects"],
        articles: false,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/news",
        title: "News & Updates",
        content: &[],
        articles: true,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/gallery",
        title: "Gallery",
        content: &["gallery"],
        articles: false,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/donate",
        title: "Donate & Support",
        content: &[],
        articles: false,
        form: None,
        in_nav: true,
    },
    PublicPage {
        path: "/contact",
        title: "Contact Us",
        content: &["contact"],
        articles: false,
        form: inquiry("Send us a message", "/contact-submit"),
        in_nav: true,
    },
    PublicPage {
        path: "/tour",
        title: "Website Tour",
        content: &[],
        articles: false,
        form: None,
        in_nav: false,
    },
    PublicPage {
        path: "/feedback",
        title: "Comments & Suggestions",
        content: &[],
        articles: false,
        form: inquiry("Share your feedback", "/feedback-submit"),
        in_nav: false,
    },
    PublicPage {
        path: "/natural-resources",
        title: "Natural Resources",
        content: &["natural_resources"],
        articles: false,
        form: inquiry("Product inquiry", "/natural-resources-submit"),
        in_nav: true,
    },
    PublicPage {
        path: "/hunting",
        title: "Wildlife & Trophy Hunting",
        content: &["hunting"],
        articles: false,
        form: inquiry("Hunting inquiry", "/hunting-inquiry"),
        in_nav: true,
    },
    PublicPage {
        path: "/youth-forum",
        title: "Youth Forum",
        content: &["youth_forum"],
        articles: false,
        form: inquiry("Submit an idea", "/youth-idea-submit"),
        in_nav: true,
    },
    PublicPage {
        path: "/jobs",
        title: "Jobs & Opportunities",
        content: &["jobs"],
        articles: false,
        form: Some(InquiryForm {
            heading: "Apply",
            action: "/apply-job",
            multipart: true,
        }),
        in_nav: true,
    },
    PublicPage {
        path: "/downloads",
        title: "Download Center",
        content: &["downloads"],
        articles: false,
        form: None,
        in_nav: true,
    },
];

/// Visitor forms: (path, log label, redirect target)
const INQUIRY_ROUTES: &[(&str, &str, &str)] = &[
    ("/contact-submit", "Contact Form", "/contact?submitted=true"),
    ("/feedback-submit", "Feedback Form", "/feedback?submitted=true"),
    (
        "/natural-resources-submit",
        "Natural Resources Inquiry",
        "/natural-resources?submitted=true",
    ),
    ("/hunting-inquiry", "Hunting Inquiry", "/hunting?submitted=true"),
    ("/youth-idea-submit", "Youth Idea Submission", "/youth-forum?submitted=true"),
];

pub fn nav_links() -> Vec<NavLink> {
    PUBLIC_PAGES
        .iter()
        .filter(|page| page.in_nav)
        .map(|page| NavLink {
            title: page.title.to_string(),
            path: page.path.to_string(),
        })
        .collect()
}

/// Routes for every public page and visitor form
pub fn routes() -> Router<SharedState> {
    let mut router = Router::new();

    for page in PUBLIC_PAGES {
        router = router.route(
            page.path,
            get(
                move |State(state): State<SharedState>,
                      Query(flags): Query<HashMap<String, String>>,
                      headers: HeaderMap| async move {
                    render_page(&state, page, &flags, &headers).await
                },
            ),
        );
    }

    for &(path, label, redirect) in INQUIRY_ROUTES {
        router = router.route(
            path,
            post(move |Form(fields): Form<Vec<(String, String)>>| async move {
                tracing::info!(form = label, ?fields, "Form submission received");
                Redirect::to(redirect)
            }),
        );
    }

    router.route("/apply-job", post(apply_job))
}

async fn render_page(
    state: &SharedState,
    page: &PublicPage,
    flags: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<Html<String>, AppError> {
    let logged_in = state.sessions.user(headers).await.is_some();
    let content = state.store.snapshot().await;

    let pages: Vec<_> = page
        .content
        .iter()
        .filter_map(|key| content.get(*key).map(|c| page_view(key, c)))
        .collect();
    let articles = if page.articles {
        state.articles.list().await
    } else {
        Vec::new()
    };

    let notice = if flags.get("submitted").map(String::as_str) == Some("true") {
        Some("Thank you! Your message has been received.")
    } else if flags.get("applied").map(String::as_str) == Some("true") {
        Some("Thank you! Your application has been received.")
    } else {
        None
    };

    let mut context = state.context(page.title, logged_in);
    context.insert("pages", &pages);
    context.insert("articles", &articles);
    context.insert("notice", &notice);
    context.insert("form", &page.form);
    state.render("page.html", &context)
}

/// Job application with an attached CV
async fn apply_job(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let submission = state.uploads.read_multipart(multipart).await?;
    let cv = submission.file("cv");
    tracing::info!(
        fields = ?submission.fields,
        cv = ?cv.map(|f| (&f.original_name, &f.public_path, f.size)),
        "Job application received"
    );
    Ok(Redirect::to("/jobs?applied=true"))
}
