//! Request construction against the configured backend.

use crux_http::http::Method;
use crux_http::RequestBuilder;
use serde::Serialize;
use std::fmt;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::capabilities::{Http, HttpResult};
use crate::config::{BaseUrl, ClientConfig};
use crate::error::ApiError;
use crate::event::Event;
use crate::model::CaseId;
use crate::session::Credential;

pub const AUTH_HEADER: &str = "x-auth-token";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiPath {
    Login,
    Register,
    Cases,
    Case(CaseId),
}

impl ApiPath {
    fn segments(&self) -> Vec<&str> {
        match self {
            Self::Login => vec!["login"],
            Self::Register => vec!["register"],
            Self::Cases => vec!["api", "cases"],
            Self::Case(id) => vec!["api", "cases", id.as_str()],
        }
    }

    /// Joins this path onto `base`, keeping any path prefix the base has.
    pub fn resolve(&self, base: &BaseUrl) -> Result<Url, ApiError> {
        base.join(&self.segments())
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))
    }
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Case(_) => f.write_str("/api/cases/:id"),
            other => write!(f, "/{}", other.segments().join("/")),
        }
    }
}

/// Builds `crux_http` requests for one moment in time: the current config and
/// whatever credential is active when the request is issued.
#[derive(Clone, Copy)]
pub struct ApiClient<'a> {
    http: &'a Http<Event>,
    config: &'a ClientConfig,
    credential: Option<&'a Credential>,
}

impl<'a> ApiClient<'a> {
    #[must_use]
    pub fn new(
        http: &'a Http<Event>,
        config: &'a ClientConfig,
        credential: Option<&'a Credential>,
    ) -> Self {
        Self {
            http,
            config,
            credential,
        }
    }

    pub fn get(&self, path: &ApiPath) -> Result<RequestBuilder<Event>, ApiError> {
        self.request(Method::Get, path)
    }

    pub fn post<T: Serialize>(
        &self,
        path: &ApiPath,
        body: &T,
    ) -> Result<RequestBuilder<Event>, ApiError> {
        with_json(self.request(Method::Post, path)?, body)
    }

    pub fn put<T: Serialize>(
        &self,
        path: &ApiPath,
        body: &T,
    ) -> Result<RequestBuilder<Event>, ApiError> {
        with_json(self.request(Method::Put, path)?, body)
    }

    pub fn delete(&self, path: &ApiPath) -> Result<RequestBuilder<Event>, ApiError> {
        self.request(Method::Delete, path)
    }

    fn request(&self, method: Method, path: &ApiPath) -> Result<RequestBuilder<Event>, ApiError> {
        let url = path.resolve(&self.config.base_url)?;
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .http
            .request(method, url)
            .header("accept", "application/json")
            .header(REQUEST_ID_HEADER, request_id.as_str());

        if let Some(credential) = self.credential {
            request = request.header(AUTH_HEADER, credential.expose());
        }

        debug!(
            %method,
            %path,
            %request_id,
            authenticated = self.credential.is_some(),
            "request prepared"
        );
        Ok(request)
    }
}

fn with_json<T: Serialize>(
    request: RequestBuilder<Event>,
    body: &T,
) -> Result<RequestBuilder<Event>, ApiError> {
    request
        .body_json(body)
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

/// Collapses transport failures and non-2xx responses into one error path
/// and hands back the response body.
pub fn into_body(result: HttpResult) -> Result<Vec<u8>, ApiError> {
    let mut response = result?;
    let status = response.status();
    let body = response.take_body().unwrap_or_default();

    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::status(status.into(), &body))
    }
}
