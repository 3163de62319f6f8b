// REST implementation of the MDM backend

use crate::backend::MdmBackend;
use crate::config::BackendConfig;
use crate::errors::BackendError;
use crate::models::{ObjectDescriptor, ScheduleProcessRequest, ScheduleSettings, StartProcessRequest};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Talks JSON to the MDM service.
///
/// Endpoints are resolved relative to `base_url`:
/// `GET objects`, `GET objects/{name}/fields`, `GET objects/{name}/dependents`,
/// `GET|PUT|DELETE schedule`, `POST process/start`.
pub struct RestBackend {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Many(Vec<ErrorEntry>),
    One(ErrorEntry),
}

/// Pull the collaborator's message out of an error response body
fn remote_error_message(status: StatusCode, body: &str) -> String {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Many(entries)) => entries.into_iter().next().map(|e| e.message),
        Ok(ErrorBody::One(entry)) => Some(entry.message),
        Err(_) => None,
    };

    message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Backend responded with status {}", status))
}

impl RestBackend {
    /// Create a new RestBackend from configuration
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = Uuid::new_v4();
        debug!(%method, %url, %request_id, "Sending backend request");

        let request = self
            .client
            .request(method, url)
            .header("X-Request-Id", request_id.to_string());
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and turn non-2xx answers into `BackendError::Remote`
    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Remote(remote_error_message(status, &body)))
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl MdmBackend for RestBackend {
    #[instrument(skip(self))]
    async fn get_objects(&self) -> Result<Vec<ObjectDescriptor>, BackendError> {
        self.get_json(&["objects"]).await
    }

    #[instrument(skip(self))]
    async fn get_fields(&self, object_name: &str) -> Result<Vec<String>, BackendError> {
        self.get_json(&["objects", object_name, "fields"]).await
    }

    #[instrument(skip(self))]
    async fn has_dependent_objects(&self, object_name: &str) -> Result<bool, BackendError> {
        self.get_json(&["objects", object_name, "dependents"]).await
    }

    #[instrument(skip(self))]
    async fn get_schedule_settings(&self) -> Result<Option<ScheduleSettings>, BackendError> {
        let url = self.endpoint(&["schedule"])?;
        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();

        // No schedule was ever saved
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Remote(remote_error_message(status, &body)));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(serde_json::from_str::<Option<ScheduleSettings>>(&body)?)
    }

    #[instrument(skip(self, request), fields(object = %request.object_name))]
    async fn start_mdm_process(&self, request: &StartProcessRequest) -> Result<(), BackendError> {
        let url = self.endpoint(&["process", "start"])?;
        self.send(self.request(Method::POST, url).json(request))
            .await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(object = %request.object_name, is_scheduled = request.is_scheduled))]
    async fn schedule_mdm_process(
        &self,
        request: &ScheduleProcessRequest,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&["schedule"])?;
        self.send(self.request(Method::PUT, url).json(request))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_scheduled_job(&self) -> Result<(), BackendError> {
        let url = self.endpoint(&["schedule"])?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> RestBackend {
        RestBackend::new(&BackendConfig {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
            api_token: None,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let backend = backend("http://localhost:8080/api/mdm/");
        let url = backend.endpoint(&["objects", "Account", "fields"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/mdm/objects/Account/fields");
    }

    #[test]
    fn test_endpoint_escapes_object_names() {
        let backend = backend("http://localhost:8080");
        let url = backend.endpoint(&["objects", "My Object/x", "fields"]).unwrap();
        assert_eq!(url.path(), "/objects/My%20Object%2Fx/fields");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = RestBackend::new(&BackendConfig {
            base_url: "mailto:ops@example.com".to_string(),
            timeout_seconds: 5,
            api_token: None,
        });
        assert!(matches!(result, Err(BackendError::InvalidUrl(_))));
    }

    #[test]
    fn test_remote_error_message_shapes() {
        assert_eq!(
            remote_error_message(StatusCode::BAD_REQUEST, r#"[{"message": "Object not supported"}]"#),
            "Object not supported"
        );
        assert_eq!(
            remote_error_message(StatusCode::BAD_REQUEST, r#"{"message": "Job already queued"}"#),
            "Job already queued"
        );
        assert_eq!(
            remote_error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>"),
            "Backend responded with status 500 Internal Server Error"
        );
    }
}
