//! Admin sessions
//!
//! Sessions live in memory and are identified by a random token carried in an
//! HttpOnly cookie. Losing them on restart only means logging in again. Idle
//! sessions expire, and the table is capped by evicting the least recently
//! used session.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use rand::RngCore;
use tokio::sync::RwLock;

use super::SharedState;
use crate::config::AdminConfig;

/// The logged-in admin
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub username: String,
}

/// Most sessions kept at once
pub const MAX_SESSIONS: usize = 1000;

struct Session {
    user: SessionUser,
    last_seen: Instant,
}

/// In-memory session table
pub struct SessionStore {
    cookie_name: String,
    idle_timeout: Duration,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>, idle_timeout: Duration) -> Self {
        Self::with_capacity(cookie_name, idle_timeout, MAX_SESSIONS)
    }

    pub fn with_capacity(
        cookie_name: impl Into<String>,
        idle_timeout: Duration,
        max_sessions: usize,
    ) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            idle_timeout,
            max_sessions: max_sessions.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session and return its token
    pub async fn create(&self, user: SessionUser) -> String {
        let token = new_token();
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        sessions.retain(|_, session| now.duration_since(session.last_seen) < self.idle_timeout);
        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.last_seen)
                .map(|(token, _)| token.clone());
            match oldest {
                Some(oldest) => {
                    tracing::debug!("Session table full, evicting the least recently used");
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }

        sessions.insert(
            token.clone(),
            Session {
                user,
                last_seen: now,
            },
        );
        token
    }

    /// User of the session named by the request cookie
    ///
    /// A live session is refreshed; an idle one is dropped.
    pub async fn user(&self, headers: &HeaderMap) -> Option<SessionUser> {
        let token = cookie_value(headers, &self.cookie_name)?;
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let session = sessions.get_mut(&token)?;
        if now.duration_since(session.last_seen) >= self.idle_timeout {
            sessions.remove(&token);
            return None;
        }
        session.last_seen = now;
        Some(session.user.clone())
    }

    /// Drop the session named by the request cookie, if any
    pub async fn destroy(&self, headers: &HeaderMap) {
        if let Some(token) = cookie_value(headers, &self.cookie_name) {
            self.sessions.write().await.remove(&token);
        }
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name, token
        )
    }

    pub fn expired_cookie(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            self.cookie_name
        )
    }
}

/// Check a login attempt against the configured credential pair
pub fn verify_credentials(admin: &AdminConfig, username: &str, password: &str) -> bool {
    constant_time_eq(admin.username.as_bytes(), username.as_bytes())
        & constant_time_eq(admin.password.as_bytes(), password.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// 128 random bits, hex encoded
fn new_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Middleware guarding `/admin/*`: no session, no entry
pub async fn require_admin(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    if state.sessions.user(request.headers()).await.is_some() {
        next.run(request).await
    } else {
        tracing::debug!("Unauthenticated request to {}", request.uri().path());
        Redirect::to("/login").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let sessions = SessionStore::new("sid", Duration::from_secs(3600));
        let token = sessions
            .create(SessionUser {
                username: "admin".into(),
            })
            .await;
        assert_eq!(token.len(), 32);

        let headers = headers_with_cookie(&format!("theme=dark; sid={}", token));
        assert_eq!(sessions.user(&headers).await.unwrap().username, "admin");

        sessions.destroy(&headers).await;
        assert!(sessions.user(&headers).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_has_no_user() {
        let sessions = SessionStore::new("sid", Duration::from_secs(3600));
        assert!(sessions.user(&headers_with_cookie("sid=forged")).await.is_none());
        assert!(sessions.user(&HeaderMap::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let sessions = SessionStore::new("sid", Duration::ZERO);
        let token = sessions
            .create(SessionUser {
                username: "admin".into(),
            })
            .await;
        let headers = headers_with_cookie(&format!("sid={}", token));
        assert!(sessions.user(&headers).await.is_none());
        assert!(sessions.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_session_table_is_capped() {
        let sessions = SessionStore::with_capacity("sid", Duration::from_secs(3600), 2);
        let mut tokens = Vec::new();
        for _ in 0..3 {
            tokens.push(
                sessions
                    .create(SessionUser {
                        username: "admin".into(),
                    })
                    .await,
            );
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(sessions.sessions.read().await.len(), 2);
        let user = |token: &str| headers_with_cookie(&format!("sid={}", token));
        assert!(sessions.user(&user(&tokens[0])).await.is_none());
        assert!(sessions.user(&user(&tokens[1])).await.is_some());
        assert!(sessions.user(&user(&tokens[2])).await.is_some());
    }

    #[test]
    fn test_verify_credentials() {
        let admin = AdminConfig::default();
        assert!(verify_credentials(&admin, "admin", "password123"));
        assert!(!verify_credentials(&admin, "admin", "password"));
        assert!(!verify_credentials(&admin, "root", "password123"));
    }

    #[test]
    fn test_cookies() {
        let sessions = SessionStore::new("sid", Duration::from_secs(3600));
        assert_eq!(sessions.session_cookie("abc"), "sid=abc; Path=/; HttpOnly; SameSite=Lax");
        assert!(sessions.expired_cookie().contains("Max-Age=0"));
    }
}
