//! HTTP adapter for the reservation backend

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::models::{ReservationStatusUpdate, TableStatusUpdate};
use shared::{DiningTable, Reservation, ReservationQuery, ReservationStatus, TableQuery, TableStatus};

use crate::{ClientError, ClientResult, FloorApi, FloorConfig};

/// HTTP client implementing [`FloorApi`] over the backend's REST API
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &FloorConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request with query parameters
    async fn get<T: DeserializeOwned, Q: serde::Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        let request = self.authorize(self.client.get(self.url(path)).query(query));
        let response = request.send().await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(path, error = %e, "Undecodable backend response");
            ClientError::Serialization(e)
        })
    }

    /// Make a PATCH request with JSON body, ignoring the response body
    async fn patch<B: serde::Serialize>(&self, path: &str, body: &B) -> ClientResult<()> {
        let request = self.authorize(self.client.patch(self.url(path)).json(body));
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    /// Map non-success statuses to client errors
    async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await?;
        tracing::debug!(status = %status, body = %text, "Backend rejected request");
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ClientError::Validation(text))
            }
            _ => Err(ClientError::Internal(text)),
        }
    }
}

#[async_trait]
impl FloorApi for HttpClient {
    async fn fetch_tables(&self, query: TableQuery) -> ClientResult<Vec<DiningTable>> {
        self.get("api/mesas/", &query).await
    }

    async fn fetch_reservations(&self, query: ReservationQuery) -> ClientResult<Vec<Reservation>> {
        self.get("api/reservas/", &query).await
    }

    async fn set_table_status(&self, table_id: i64, status: TableStatus) -> ClientResult<()> {
        self.patch(
            &format!("api/mesas/{}/estado/", table_id),
            &TableStatusUpdate { status },
        )
        .await
    }

    async fn set_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> ClientResult<()> {
        self.patch(
            &format!("api/reservas/{}/estado/", reservation_id),
            &ReservationStatusUpdate { status },
        )
        .await
    }
}
