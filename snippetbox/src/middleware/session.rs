//! Session load and save around every application request
//!
//! The session named by the request cookie is loaded from the
//! [`SessionStore`] and inserted into the request extensions, where the
//! [`Session`] extractor and the later interceptors find it. Once the inner
//! stages have produced a response the handle is committed, and a
//! `Set-Cookie` header is added only when the session changed.

use super::chain::{Handler, Interceptor};
use crate::auth::{Commit, Session, SessionId, SessionStore};
use crate::config::{SameSite, SecuritySettings};
use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::Response,
};
use std::str::FromStr;

/// Session cookie attributes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name
    pub name: String,
    /// Cookie path
    pub path: String,
    /// HTTP-only cookie
    pub http_only: bool,
    /// Secure cookie (HTTPS only)
    pub secure: bool,
    /// SameSite policy
    pub same_site: SameSite,
}

impl SessionCookie {
    /// Attributes from the security settings
    #[must_use]
    pub fn from_settings(settings: &SecuritySettings) -> Self {
        Self {
            name: settings.session_cookie_name.clone(),
            path: "/".to_string(),
            http_only: true,
            secure: settings.secure_cookies,
            same_site: settings.same_site,
        }
    }

    /// Read the session ID from the request cookies
    ///
    /// A malformed value is treated as absent.
    #[must_use]
    pub fn session_id(&self, headers: &HeaderMap) -> Option<SessionId> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| name.trim() == self.name)
            .and_then(|(_, value)| SessionId::from_str(value.trim()).ok())
    }

    /// `Set-Cookie` value issuing `id` for `max_age_secs`
    #[must_use]
    pub fn issue(&self, id: &SessionId, max_age_secs: i64) -> String {
        self.render(id.as_str(), max_age_secs)
    }

    /// `Set-Cookie` value telling the client to drop the cookie
    #[must_use]
    pub fn expire(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age_secs: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}; SameSite={}",
            self.name,
            value,
            self.path,
            max_age_secs,
            self.same_site.as_str()
        );

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }

        if self.secure {
            cookie.push_str("; Secure");
        }

        cookie
    }
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::from_settings(&SecuritySettings::default())
    }
}

/// Loads the request's session and saves it with the response
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: SessionStore,
    cookie: SessionCookie,
}

impl SessionManager {
    /// Manage sessions in `store` using `cookie` attributes
    #[must_use]
    pub const fn new(store: SessionStore, cookie: SessionCookie) -> Self {
        Self { store, cookie }
    }

    fn set_cookie(&self, response: &mut Response, commit: Commit) {
        let cookie = match commit {
            Commit::Unchanged => return,
            Commit::Saved(id) => {
                tracing::trace!(session_id = %id, "session saved");
                self.cookie.issue(&id, self.store.lifetime().num_seconds())
            }
            Commit::Destroyed(id) => {
                tracing::trace!(session_id = %id, "session destroyed");
                self.cookie.expire()
            }
        };

        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "failed to encode session cookie"),
        }
    }
}

#[async_trait]
impl Interceptor for SessionManager {
    async fn intercept(&self, mut request: Request, next: Handler) -> Response {
        let id = self.cookie.session_id(request.headers());
        let session = self.store.load(id.as_ref());
        request.extensions_mut().insert(session.clone());

        let mut response = next.run(request).await;

        let commit = self.store.commit(&session);
        self.set_cookie(&mut response, commit);
        response
    }
}

/// The session the [`SessionManager`] attached to `request`
#[must_use]
pub fn request_session(request: &Request) -> Option<Session> {
    request.extensions().get::<Session>().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::FLASH;
    use crate::middleware::Chain;
    use axum::{body::Body, response::IntoResponse};
    use std::time::Duration;

    fn manager() -> (SessionStore, Handler) {
        let store = SessionStore::new(Duration::from_secs(3600));
        let handler = Chain::new()
            .with(SessionManager::new(store.clone(), SessionCookie::default()))
            .then(Handler::new(|request: Request| async move {
                let session = request_session(&request).unwrap();
                match request.uri().path() {
                    "/put" => session.put(FLASH, "hi").unwrap(),
                    "/pop" => {
                        let _ = session.pop_string(FLASH);
                    }
                    _ => {}
                }
                "ok".into_response()
            }));
        (store, handler)
    }

    fn request(path: &str, cookie: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn set_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get(SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = SessionCookie::default();
        let id = SessionId::generate();
        let value = cookie.issue(&id, 43_200);
        assert!(value.starts_with(&format!("snippetbox_session={id}")));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=43200"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let cookie = SessionCookie::default();
        let id = SessionId::generate();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            format!("theme=dark; snippetbox_session={id}; other=1").parse().unwrap(),
        );
        assert_eq!(cookie.session_id(&headers), Some(id));

        headers.insert(COOKIE, "snippetbox_session=forged".parse().unwrap());
        assert_eq!(cookie.session_id(&headers), None);
    }

    #[tokio::test]
    async fn test_clean_session_sets_no_cookie() {
        let (store, handler) = manager();
        let response = handler.run(request("/", None)).await;
        assert!(set_cookie(&response).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_dirty_session_is_saved_and_reloaded() {
        let (store, handler) = manager();
        let response = handler.run(request("/put", None)).await;
        let cookie = set_cookie(&response).unwrap();
        assert_eq!(store.len(), 1);

        let pair = cookie.split(';').next().unwrap().to_string();
        let response = handler.run(request("/pop", Some(&pair))).await;

        let expired = set_cookie(&response).unwrap();
        assert!(expired.starts_with("snippetbox_session=;"));
        assert!(expired.contains("Max-Age=0"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_cookie_degrades_to_fresh_session() {
        let (store, handler) = manager();
        let stale = format!("snippetbox_session={}", SessionId::generate());
        let response = handler.run(request("/", Some(&stale))).await;
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        assert!(set_cookie(&response).is_none());
        assert!(store.is_empty());
    }
}
