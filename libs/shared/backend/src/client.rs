use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    multipart::Form,
    Client, Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use shared_config::PortalConfig;
use shared_models::error::AppError;

/// Thin client for the portal's REST backend. Paths are relative to the
/// normalized backend URL (`doctors/`, `admin/my-doctors/`, ...).
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.backend_url.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| AppError::Auth("Token contains invalid header characters".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn builder(&self, method: Method, path: &str, auth_token: Option<&str>) -> Result<RequestBuilder, AppError> {
        let url = self.url(path);
        debug!("Making {} request to {}", method, url);

        Ok(self.client.request(method, &url).headers(self.get_headers(auth_token)?))
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let mut req = self.builder(method, path, auth_token)?;

        if let Some(body_data) = body {
            req = req
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(&body_data);
        }

        let response = req.send().await?;
        Self::decode(response).await
    }

    pub async fn get<T>(&self, path: &str, auth_token: Option<&str>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, path, auth_token, None).await
    }

    /// GET with query parameters serialized from `query`.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q, auth_token: Option<&str>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .builder(Method::GET, path, auth_token)?
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B, auth_token: Option<&str>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, auth_token, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, auth_token: Option<&str>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, auth_token, Some(body)).await
    }

    /// Sends a multipart form (file uploads). reqwest sets the boundary header.
    pub async fn multipart<T>(
        &self,
        method: Method,
        path: &str,
        form: Form,
        auth_token: Option<&str>,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .builder(method, path, auth_token)?
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T>(response: Response) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(AppError::Backend {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// Pulls the human-readable message out of an error body. The backend uses
/// `{"error": ...}` for most failures and `{"message": ...}` for auth ones.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message", "detail"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
