//! HTTP adapter for the persons API.
//!
//! # Design
//! `ApiClient` is the only component in the workspace that talks to the
//! network. Each operation is split into a `build_*` step that produces an
//! `HttpRequest` and a parse step that consumes the `HttpResponse`; between
//! them every request passes through one `dispatch` chokepoint, which owns
//! the request/response logging. The base URL and the JSON content-type
//! header are attached in exactly one place, so call sites cannot drift.

use std::env;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{Message, Person, PersonInput};

/// Base URL used when [`BASE_URL_ENV`] is not set.
///
/// A bare path only resolves when the API is reached through the host that
/// serves it; point the environment variable at a full
/// `http://host:port/api` URL otherwise.
pub const DEFAULT_BASE_URL: &str = "/api";

/// Environment variable that overrides the base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

// ASCII bytes that must not appear raw in a path segment (non-ASCII
// bytes are always encoded). `/` and `%` are in the set so a name can
// neither split the segment nor inject a stray escape.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'%');

/// Synchronous client for the persons API.
///
/// Construction picks the transport: [`ApiClient::new`] wires up ureq,
/// [`ApiClient::with_transport`] accepts any [`Transport`] so tests can
/// script responses without a network.
pub struct ApiClient {
    base_url: String,
    transport: Box<dyn Transport>,
}

impl ApiClient {
    /// Client for the API rooted at `base_url`, e.g.
    /// `http://localhost:3000/api`. A trailing `/` is stripped.
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(base_url, Box::new(UreqTransport::new()))
    }

    /// Client with the base URL taken from [`BASE_URL_ENV`], falling back
    /// to [`DEFAULT_BASE_URL`].
    pub fn from_env() -> Self {
        let base_url = env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(&base_url)
    }

    /// Client executing requests through a caller-supplied transport.
    pub fn with_transport(base_url: &str, transport: Box<dyn Transport>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// GET `/hello/`, the plain greeting.
    pub fn get_hello(&self) -> Result<Message, ApiError> {
        let response = self.dispatch(self.build_get_hello())?;
        parse_body(response)
    }

    /// GET `/hello/{last_name}/`, a personalized greeting. The name is
    /// percent-encoded into the path, so spaces and non-ASCII characters
    /// are fine. Unknown last names still answer 200, with a who-is-this
    /// message.
    pub fn get_hello_person(&self, last_name: &str) -> Result<Message, ApiError> {
        let response = self.dispatch(self.build_get_hello_person(last_name))?;
        parse_body(response)
    }

    /// GET `/hello/persons/`, every person in server order.
    pub fn get_persons(&self) -> Result<Vec<Person>, ApiError> {
        let response = self.dispatch(self.build_get_persons())?;
        parse_body(response)
    }

    /// POST `/hello/persons/`, returning the created record with its
    /// server-assigned `id` and `created_at`.
    pub fn create_person(&self, input: &PersonInput) -> Result<Person, ApiError> {
        let request = self.build_create_person(input)?;
        let response = self.dispatch(request)?;
        parse_body(response)
    }

    /// GET `/hello/persons/{id}/`.
    pub fn get_person(&self, id: i64) -> Result<Person, ApiError> {
        let response = self.dispatch(self.build_get_person(id))?;
        parse_body(response)
    }

    /// PUT `/hello/persons/{id}/`, a full replace of the writable fields.
    /// `id` and `created_at` are preserved by the server.
    pub fn update_person(&self, id: i64, input: &PersonInput) -> Result<Person, ApiError> {
        let request = self.build_update_person(id, input)?;
        let response = self.dispatch(request)?;
        parse_body(response)
    }

    /// DELETE `/hello/persons/{id}/`. Any 2xx counts as deleted; the
    /// response body is ignored.
    pub fn delete_person(&self, id: i64) -> Result<(), ApiError> {
        let response = self.dispatch(self.build_delete_person(id))?;
        check_success(&response)
    }

    /// GET `/weather/`, the weather summary.
    pub fn get_weather(&self) -> Result<Message, ApiError> {
        let response = self.dispatch(self.build_get_weather())?;
        parse_body(response)
    }

    fn build_get_hello(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/hello/", None)
    }

    fn build_get_hello_person(&self, last_name: &str) -> HttpRequest {
        let segment = utf8_percent_encode(last_name, PATH_SEGMENT);
        self.request(HttpMethod::Get, &format!("/hello/{segment}/"), None)
    }

    fn build_get_persons(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/hello/persons/", None)
    }

    fn build_create_person(&self, input: &PersonInput) -> Result<HttpRequest, ApiError> {
        let body = serialize_body(input)?;
        Ok(self.request(HttpMethod::Post, "/hello/persons/", Some(body)))
    }

    fn build_get_person(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/hello/persons/{id}/"), None)
    }

    fn build_update_person(&self, id: i64, input: &PersonInput) -> Result<HttpRequest, ApiError> {
        let body = serialize_body(input)?;
        Ok(self.request(HttpMethod::Put, &format!("/hello/persons/{id}/"), Some(body)))
    }

    fn build_delete_person(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/hello/persons/{id}/"), None)
    }

    fn build_get_weather(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/weather/", None)
    }

    /// Attach the base URL and the JSON content-type header. Every request
    /// the client sends is assembled here.
    fn request(&self, method: HttpMethod, path: &str, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        }
    }

    /// The round-trip chokepoint: every request and response is logged
    /// here, transport failures at error level.
    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = ?request.method, path = %request.path, "sending request");
        match self.transport.execute(request) {
            Ok(response) => {
                debug!(status = response.status, "received response");
                Ok(response)
            }
            Err(e) => {
                error!(error = %e, "transport failed");
                Err(e)
            }
        }
    }
}

fn serialize_body<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// Any 2xx status is success; everything else surfaces status and body.
fn check_success(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Check the status, then deserialize the body into the expected shape.
fn parse_body<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_success(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
