//! Shared helpers for driving the full router in integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Method, Request, StatusCode,
    },
    Router,
};
use http_body_util::BodyExt;
use regex::Regex;
use snippetbox::{
    auth::password::{PasswordHashConfig, PasswordHasher},
    config::SnippetboxConfig,
    models::MemoryStore,
    routes,
    state::AppState,
};
use std::path::PathBuf;
use tower::ServiceExt;

/// Router plus direct access to its store
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestApp {
    /// App backed by an empty in-memory store with cheap password hashing
    pub fn new() -> Self {
        Self::with_config(SnippetboxConfig::default())
    }

    pub fn with_static_dir(static_dir: PathBuf) -> Self {
        let mut config = SnippetboxConfig::default();
        config.server.static_dir = static_dir;
        Self::with_config(config)
    }

    pub fn with_config(config: SnippetboxConfig) -> Self {
        let store = MemoryStore::with_hasher(PasswordHasher::with_config(PasswordHashConfig::fast()));
        let state = AppState::with_memory_store(config, store.clone());
        let router = routes::routes(&state);
        Self {
            router,
            store,
            state,
        }
    }

    /// A browser-like client with its own cookie jar
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

/// Response with its body collected
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    pub fn csrf_token(&self) -> Option<String> {
        let re = Regex::new(r#"name="_csrf_token" value="([^"]+)""#).unwrap();
        re.captures(&self.body).map(|c| c[1].to_string())
    }
}

/// Sends requests carrying the session cookie like a browser would
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn set_cookie(&mut self, cookie: Option<String>) {
        self.cookie = cookie;
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request(Method::GET, path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request(Method::POST, path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// POST `body` with the CSRF token in a header instead of the form
    pub async fn post_with_header_token(
        &mut self,
        path: &str,
        content_type: &str,
        body: &str,
        token: &str,
    ) -> TestResponse {
        let request = self
            .request(Method::POST, path)
            .header(CONTENT_TYPE, content_type)
            .header("x-csrf-token", token)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch `form_path` for a token, then post `fields` with it to `path`
    pub async fn submit(&mut self, form_path: &str, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let page = self.get(form_path).await;
        let token = page.csrf_token().expect("page has no CSRF token");
        let mut fields = fields.to_vec();
        fields.push(("_csrf_token", &token));
        self.post_form(path, &fields).await
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> TestResponse {
        self.submit(
            "/user/signup",
            "/user/signup",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.submit(
            "/user/login",
            "/user/login",
            &[("email", email), ("password", password)],
        )
        .await
    }

    /// Sign up and log in a fresh user
    pub async fn logged_in(&mut self, email: &str) -> TestResponse {
        let signup = self.signup("Alice", email, "correct horse battery").await;
        assert_eq!(signup.status, StatusCode::SEE_OTHER);
        let login = self.login(email, "correct horse battery").await;
        assert_eq!(login.status, StatusCode::SEE_OTHER);
        login
    }

    fn request(&self, method: Method, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        if let Some(set_cookie) = headers.get(SET_COOKIE).and_then(|v| v.to_str().ok()) {
            let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
            self.cookie = if set_cookie.contains("Max-Age=0") {
                None
            } else {
                Some(pair)
            };
        }

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
