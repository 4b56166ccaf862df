use crate::api::models::{MultipartBody, MultipartField, RequestBody, ValidationBody};
use crate::api::resource::ResourceClient;
use crate::error::ApiError;
use crate::utils::error_helpers::{convert_json_error, convert_request_error};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("stockroom/", env!("CARGO_PKG_VERSION"));

/// HTTP transport shared by every resource client.
#[derive(Debug, Clone)]
pub struct StockroomClient {
    client: Client,
    pub base_url: String,
    pub api_token: Option<String>,
    timeout_secs: u64,
}

impl StockroomClient {
    // Create baseClient with default settings
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: String, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| convert_request_error(e, "client_init", timeout_secs))?;

        Ok(StockroomClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
            timeout_secs,
        })
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.api_token = Some(token);
        self
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Bind a resource client to the collection `name` (e.g. `"products"`).
    pub fn resource(&self, name: impl Into<String>) -> ResourceClient {
        ResourceClient::new(self.clone(), name)
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest");

        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        request
    }

    /// Attach a create/update payload. JSON bodies get an explicit
    /// content type; multipart bodies leave it to the transport so the
    /// boundary is set correctly.
    pub fn attach_body(
        &self,
        request: RequestBuilder,
        body: RequestBody,
        endpoint: &str,
    ) -> Result<RequestBuilder, ApiError> {
        match body {
            RequestBody::Json(fields) => Ok(request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(&fields).map_err(|e| ApiError::Decode {
                    endpoint: endpoint.to_string(),
                    message: format!("Failed to encode body: {}", e),
                })?)),
            RequestBody::Multipart(multipart) => {
                let form = multipart_form(multipart)
                    .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;
                Ok(request.multipart(form))
            }
        }
    }

    pub async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response, ApiError> {
        log::debug!("sending request to {}", endpoint);
        let response = request
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))?;
        self.expect_success(response, endpoint).await
    }

    pub async fn handle_response<T>(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.expect_success(response, endpoint).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| convert_json_error(e, endpoint))
    }

    /// Map a non-success status onto the error taxonomy; pass successes through.
    pub async fn expect_success(
        &self,
        response: Response,
        endpoint: &str,
    ) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        log::debug!("{} responded with {}", endpoint, status);

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound {
                endpoint: endpoint.to_string(),
            },
            StatusCode::UNPROCESSABLE_ENTITY => validation_error(&error_text, endpoint),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                server_message: error_text,
            },
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ApiError::Timeout {
                timeout_secs: self.timeout_secs,
                endpoint: endpoint.to_string(),
            },
            _ => ApiError::Http {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message: error_text,
            },
        })
    }
}

fn validation_error(body: &str, endpoint: &str) -> ApiError {
    match serde_json::from_str::<ValidationBody>(body) {
        Ok(parsed) => ApiError::Validation {
            endpoint: endpoint.to_string(),
            message: parsed
                .message
                .unwrap_or_else(|| "The given data was invalid.".to_string()),
            errors: parsed.errors,
        },
        Err(_) => ApiError::Validation {
            endpoint: endpoint.to_string(),
            message: body.to_string(),
            errors: Default::default(),
        },
    }
}

fn multipart_form(body: MultipartBody) -> Result<Form, reqwest::Error> {
    let mut form = Form::new();
    for (name, field) in body.into_parts() {
        form = match field {
            MultipartField::Text(value) => form.text(name, value),
            MultipartField::File(upload) => form.part(
                name,
                Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(&upload.mime)?,
            ),
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Entity;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        let client = StockroomClient::new("http://example.test/".to_string());
        assert!(client.is_ok());
        if let Ok(client) = client {
            assert_eq!(client.base_url, "http://example.test");
            assert_eq!(client.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        }
    }

    #[test]
    fn test_build_request_headers() {
        let client =
            StockroomClient::new("http://example.test".to_string()).expect("client creation failed");
        let built = client
            .build_request(Method::GET, "/api/products")
            .build()
            .expect("Failed to build request");

        assert_eq!(built.url().as_str(), "http://example.test/api/products");
        assert_eq!(built.method(), Method::GET);
        assert_eq!(
            built.headers().get("X-Requested-With").unwrap(),
            "XMLHttpRequest"
        );
        assert!(built.headers().get("authorization").is_none());
    }

    #[test]
    fn test_build_request_with_token() {
        let client = StockroomClient::new("http://example.test".to_string())
            .expect("client creation failed")
            .with_token("secret-token".to_string());
        let built = client
            .build_request(Method::DELETE, "/api/roles/3")
            .build()
            .expect("Failed to build request");

        assert_eq!(
            built.headers().get("authorization").unwrap(),
            "Bearer secret-token"
        );
    }

    #[test]
    fn test_attach_json_body_sets_content_type() {
        let client =
            StockroomClient::new("http://example.test".to_string()).expect("client creation failed");
        let fields: Entity = serde_json::from_value(json!({"name": "Acme"})).unwrap();
        let request = client.build_request(Method::POST, "/api/customers/store");
        let built = client
            .attach_body(request, RequestBody::Json(fields), "/api/customers/store")
            .expect("attach failed")
            .build()
            .expect("Failed to build request");

        assert_eq!(
            built.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_attach_multipart_body_uses_boundary() {
        let client =
            StockroomClient::new("http://example.test".to_string()).expect("client creation failed");
        let body = MultipartBody::new().text("name", "Widget");
        let request = client.build_request(Method::POST, "/api/products/store");
        let built = client
            .attach_body(request, RequestBody::Multipart(body), "/api/products/store")
            .expect("attach failed")
            .build()
            .expect("Failed to build request");

        let content_type = built.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_validation_error_decoding() {
        let err = validation_error(
            r#"{"message":"Invalid","errors":{"email":["Email is invalid"]}}"#,
            "/api/customers/store",
        );
        assert_eq!(
            err.field_errors().and_then(|e| e.first("email")),
            Some("Email is invalid")
        );

        let err = validation_error("not json", "/api/customers/store");
        assert!(err.field_errors().is_some_and(|e| e.is_empty()));
    }
}
