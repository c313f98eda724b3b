use crate::error::{KgError, Result};
use crate::query::QueryDescriptor;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Outcome of a single API call: exactly one of the two holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    /// Parsed JSON body of a 200 response.
    Success(Value),
    /// Numeric status code of any non-200 response.
    Failure(u16),
}

/// Authenticated client for the knowledge-graph REST API
///
/// Holds the immutable base URL and bearer token; every request carries the
/// `Authorization: Bearer <token>` header. One network call per invocation,
/// no caching, no retry.
#[derive(Debug)]
pub struct KgClient {
    client: Client,
    base_url: Url,
    token: String,
}

impl KgClient {
    /// Create a new client for the given API root.
    ///
    /// Fails if `base_url` is not a valid URL. The URL should end with a
    /// trailing slash so relative joins land under the API root.
    pub fn new(base_url: &str, token: String) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| KgError::Config(format!("invalid base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Resolve a path relative to the API root.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| KgError::Config(format!("invalid endpoint path {}: {}", path, e)))
    }

    /// Issue an authenticated GET and classify the outcome by status code.
    pub async fn get_json(&self, url: Url) -> Result<ApiResult> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 200 {
            Ok(ApiResult::Success(response.json().await?))
        } else {
            Ok(ApiResult::Failure(status.as_u16()))
        }
    }

    /// POST a query descriptor as JSON and classify the outcome by status code.
    pub async fn post_query(&self, url: Url, query: &QueryDescriptor) -> Result<ApiResult> {
        log::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json")
            .json(query)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 200 {
            Ok(ApiResult::Success(response.json().await?))
        } else {
            Ok(ApiResult::Failure(status.as_u16()))
        }
    }
}

/// Translate an [`ApiResult`] into the payload or a typed error.
///
/// This is the single point where transport failures become errors; the
/// resolver and query layers propagate them unchanged.
pub fn check_response(result: ApiResult) -> Result<Value> {
    match result {
        ApiResult::Success(mut body) => match body.get_mut("data") {
            Some(data) => Ok(data.take()),
            None => Err(KgError::MissingProperty("data".to_string())),
        },
        ApiResult::Failure(401) => Err(KgError::Auth),
        ApiResult::Failure(code) => Err(KgError::Request(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> KgClient {
        KgClient::new(&format!("{}/", server.uri()), "test-token".to_string()).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = KgClient::new("not a url", "t".to_string()).unwrap_err();
        assert!(matches!(err, KgError::Config(_)));
    }

    #[tokio::test]
    async fn test_get_json_success_wraps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"x": 1}})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = client.endpoint("thing").unwrap();
        let result = client.get_json(url).await.unwrap();
        assert_eq!(result, ApiResult::Success(json!({"data": {"x": 1}})));
    }

    #[tokio::test]
    async fn test_get_json_non_200_becomes_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = client.endpoint("thing").unwrap();
        let result = client.get_json(url).await.unwrap();
        assert_eq!(result, ApiResult::Failure(404));
    }

    #[tokio::test]
    async fn test_post_query_sends_descriptor_body() {
        let query = QueryDescriptor::for_type("https://openminds.ebrains.eu/core/DatasetVersion");
        let expected_body = serde_json::to_value(&query).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/queries/"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(&expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = client.endpoint("queries/").unwrap();
        let result = client.post_query(url, &query).await.unwrap();
        assert_eq!(result, ApiResult::Success(json!({"data": []})));
    }

    #[test]
    fn test_check_response_returns_data_field() {
        let payload = check_response(ApiResult::Success(json!({"data": [1, 2]}))).unwrap();
        assert_eq!(payload, json!([1, 2]));
    }

    #[test]
    fn test_check_response_missing_data_field() {
        let err = check_response(ApiResult::Success(json!({"other": 1}))).unwrap_err();
        assert!(matches!(err, KgError::MissingProperty(ref k) if k == "data"));
    }

    #[test]
    fn test_check_response_401_is_auth_error() {
        let err = check_response(ApiResult::Failure(401)).unwrap_err();
        assert!(matches!(err, KgError::Auth));
        assert!(err.to_string().contains("token has expired"));
    }

    #[test]
    fn test_check_response_other_status_is_request_error() {
        let err = check_response(ApiResult::Failure(500)).unwrap_err();
        assert!(matches!(err, KgError::Request(500)));
    }
}
