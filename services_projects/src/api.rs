//! Backend client
//!
//! Four endpoints under the configured base URL:
//!
//! | call          | request                          |
//! |---------------|----------------------------------|
//! | `prime_csrf`  | `GET  /api/get-csrf-token/`      |
//! | `list`        | `GET  /projects/`                |
//! | `create`      | `POST /projects/` (JSON body)    |
//! | `delete`      | `DELETE /projects/{id}/`         |
//!
//! The backend hands out its CSRF token as a cookie. The HTTP client keeps
//! cookies between calls and echoes the token in a header on unsafe methods.

use std::sync::Arc;

use core_types::ProjectId;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::ACCEPT;
use reqwest::{Method, Url};
use thiserror::Error;

use crate::config::ProjectsConfig;
use crate::model::{NewProject, Project};

/// Cookie carrying the CSRF token
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the token is echoed in
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Backend call error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The project backend
pub trait ProjectApi {
    /// Fetches the CSRF token so later unsafe calls can send it
    fn prime_csrf(&self) -> ApiResult<()>;

    fn list(&self) -> ApiResult<Vec<Project>>;

    fn create(&self, project: &NewProject) -> ApiResult<Project>;

    fn delete(&self, id: ProjectId) -> ApiResult<()>;
}

/// [`ProjectApi`] over blocking HTTP
pub struct HttpProjectApi {
    client: Client,
    cookies: Arc<Jar>,
    base: Url,
}

impl HttpProjectApi {
    pub fn new(config: &ProjectsConfig) -> ApiResult<Self> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            cookies,
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Token from the `csrftoken` cookie, once the backend has set it
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == CSRF_COOKIE)
            .map(|(_, value)| value.to_string())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let unsafe_method = !method.is_safe();
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT, "application/json");
        if unsafe_method {
            if let Some(token) = self.csrf_token() {
                builder = builder.header(CSRF_HEADER, token);
            }
        }
        builder
    }
}

fn check(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

impl ProjectApi for HttpProjectApi {
    fn prime_csrf(&self) -> ApiResult<()> {
        check(self.request(Method::GET, "/api/get-csrf-token/").send()?)?;
        Ok(())
    }

    fn list(&self) -> ApiResult<Vec<Project>> {
        let response = check(self.request(Method::GET, "/projects/").send()?)?;
        Ok(response.json()?)
    }

    fn create(&self, project: &NewProject) -> ApiResult<Project> {
        let response = check(self.request(Method::POST, "/projects/").json(project).send()?)?;
        Ok(response.json()?)
    }

    fn delete(&self, id: ProjectId) -> ApiResult<()> {
        let path = format!("/projects/{}/", id);
        check(self.request(Method::DELETE, &path).send()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(url: &str) -> HttpProjectApi {
        HttpProjectApi::new(&ProjectsConfig::new(url).unwrap()).unwrap()
    }

    #[test]
    fn test_urls_join_without_double_slash() {
        let api = api("http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/projects/"), "http://localhost:8000/projects/");
    }

    #[test]
    fn test_no_token_before_priming() {
        assert_eq!(api("http://localhost:8000").csrf_token(), None);
    }

    #[test]
    fn test_token_read_from_cookie_jar() {
        let api = api("http://localhost:8000");
        let url = Url::parse("http://localhost:8000/").unwrap();
        api.cookies.add_cookie_str("sessionid=s1; Path=/", &url);
        api.cookies.add_cookie_str("csrftoken=tok123; Path=/", &url);
        assert_eq!(api.csrf_token(), Some("tok123".to_string()));
    }
}
