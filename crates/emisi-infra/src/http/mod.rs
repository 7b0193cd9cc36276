//! REST backend client
//!
//! Blocking `reqwest` implementation of the repository traits. Every
//! non-success response is converted by [`error::status_error`], so callers
//! only ever see `emisi_types::ApiError` variants.

pub mod error;

use std::time::Duration;

use emisi_domain::repository::{
    ReportRepository, TestResultRepository, UserRepository, VehicleRepository,
};
use emisi_types::{
    ApiError, BatchUploadReport, Error, NewVehicle, Result, SaveOutcome, Statistics, TestResult,
    TestSubmission, User, Vehicle, VehiclePage, VehicleUpdate,
};
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use self::error::{status_error, transport};

const CLIENT_NAME: &str = concat!("uji-emisi/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpBackend`]
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Backend origin, e.g. `http://localhost:5000`
    pub base_url: String,
    pub timeout: Duration,
    /// Raw `Cookie` header value of an authenticated session
    pub session_cookie: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_secs(15),
            session_cookie: None,
        }
    }
}

/// Client for the emissions-test REST API
pub struct HttpBackend {
    client: Client,
    base: Url,
}

/// `POST /api/kendaraan` acknowledgement
#[derive(Debug, Deserialize)]
struct CreateAck {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// `GET /api/v1/users/{id}` envelope
#[derive(Debug, Deserialize)]
struct UserEnvelope {
    #[serde(default)]
    success: bool,
    user: Option<User>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let base = Url::parse(settings.base_url.trim())
            .map_err(|e| ApiError::Transport(format!("Invalid base URL '{}': {}", settings.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Transport(format!("Invalid base URL '{}'", settings.base_url)).into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_NAME));
        if let Some(cookie) = settings.session_cookie.as_deref().filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ApiError::Transport(format!("Invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(transport)?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Join path segments onto the base URL; each segment is percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Invalid base URL '{}'", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().map_err(transport)?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url());
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(status_error(status.as_u16(), status.canonical_reason(), &body).into())
    }

    fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request)?;
        let body = response.text().map_err(transport)?;
        serde_json::from_str(&body).map_err(|e| Error::from(ApiError::Decode(e.to_string())))
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);
        self.json(self.client.get(url))
    }
}

impl VehicleRepository for HttpBackend {
    fn find_page(&self, offset: usize, limit: usize) -> Result<VehiclePage> {
        let mut url = self.endpoint(&["api", "kendaraan-list"])?;
        let page = if limit == 0 { 1 } else { offset / limit + 1 };
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &limit.to_string());
        debug!("GET {}", url);
        self.json(self.client.get(url))
    }

    fn find_by_plate(&self, plat: &str) -> Result<Vehicle> {
        self.get(&["api", "kendaraan", plat])
    }

    fn create(&self, vehicle: &NewVehicle) -> Result<()> {
        let url = self.endpoint(&["api", "kendaraan"])?;
        info!("Registering vehicle {}", vehicle.plat_nomor);
        let ack: CreateAck = self.json(self.client.post(url).json(vehicle))?;
        if ack.success {
            Ok(())
        } else {
            let message = ack.message.unwrap_or_else(|| "Gagal menyimpan kendaraan".to_string());
            Err(ApiError::Status { status: 200, message }.into())
        }
    }

    fn update(&self, plat: &str, update: &VehicleUpdate) -> Result<()> {
        let url = self.endpoint(&["api", "kendaraan", plat])?;
        info!("Updating vehicle {}", plat);
        self.send(self.client.put(url).json(update))?;
        Ok(())
    }

    fn delete(&self, plat: &str) -> Result<()> {
        let url = self.endpoint(&["api", "kendaraan", plat])?;
        info!("Deleting vehicle {}", plat);
        self.send(self.client.delete(url))?;
        Ok(())
    }

    fn distinct_brands(&self) -> Result<Vec<String>> {
        self.get(&["api", "kendaraan-mereks"])
    }

    fn distinct_types(&self) -> Result<Vec<String>> {
        self.get(&["api", "kendaraan-tipes"])
    }

    fn batch_upload(&self, file_name: &str, content: Vec<u8>) -> Result<BatchUploadReport> {
        let url = self.endpoint(&["api", "kendaraan", "batch-upload"])?;
        info!("Uploading {} ({} bytes)", file_name, content.len());
        let part = multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(transport)?;
        let form = multipart::Form::new().part("file", part);
        self.json(self.client.post(url).multipart(form))
    }
}

impl TestResultRepository for HttpBackend {
    fn tested_plates(&self) -> Result<Vec<String>> {
        self.get(&["api", "hasil-uji", "tested-plats"])
    }

    fn find_result(&self, plat: &str) -> Result<Option<TestResult>> {
        match self.get(&["api", "hasil-uji", plat]) {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save_result(&self, plat: &str, submission: &TestSubmission) -> Result<SaveOutcome> {
        let url = self.endpoint(&["api", "hasil-uji", plat])?;
        info!("Saving test result for {}", plat);
        self.json(self.client.post(url).json(submission))
    }

    fn delete_result(&self, plat: &str) -> Result<()> {
        let url = self.endpoint(&["api", "hasil-uji", plat])?;
        info!("Clearing test result for {}", plat);
        self.send(self.client.delete(url))?;
        Ok(())
    }
}

impl UserRepository for HttpBackend {
    fn find_user(&self, id: i64) -> Result<User> {
        let envelope: UserEnvelope = self.get(&["api", "v1", "users", &id.to_string()])?;
        match envelope.user {
            Some(user) if envelope.success => Ok(user),
            _ => Err(ApiError::NotFound(
                envelope.error.unwrap_or_else(|| format!("User {} not found", id)),
            )
            .into()),
        }
    }
}

impl ReportRepository for HttpBackend {
    fn statistics(&self) -> Result<Statistics> {
        self.get(&["api", "statistics"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(&HttpSettings {
            base_url: base.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_plate() {
        let backend = backend("http://localhost:5000");
        let url = backend.endpoint(&["api", "kendaraan", "B 1234/CD"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/kendaraan/B%201234%2FCD");
    }

    #[test]
    fn test_endpoint_respects_base_path() {
        let backend = backend("https://emisi.example.org/admin/");
        let url = backend.endpoint(&["api", "hasil-uji", "tested-plats"]).unwrap();
        assert_eq!(url.as_str(), "https://emisi.example.org/admin/api/hasil-uji/tested-plats");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackend::new(&HttpSettings {
            base_url: "not a url".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::Api(ApiError::Transport(_)))));
    }

    #[test]
    fn test_unreachable_backend_is_transport_error() {
        let backend = HttpBackend::new(&HttpSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_millis(500),
            session_cookie: Some("session=abc".to_string()),
        })
        .unwrap();
        let err = backend.tested_plates().unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Transport(_))));
    }

    #[test]
    fn test_user_envelope_shape() {
        let envelope: UserEnvelope = serde_json::from_str(
            r#"{"success": true, "user": {"id": 3, "username": "operator1", "fullname": null, "email": "op@dishub.go.id", "is_admin": false}}"#,
        )
        .unwrap();
        let user = envelope.user.unwrap();
        assert_eq!(user.username, "operator1");
        assert!(!user.is_admin);
    }
}
