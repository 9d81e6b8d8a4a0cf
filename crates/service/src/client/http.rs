use async_trait::async_trait;
use configs::ApperConfig;
use models::RecordId;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

use super::{ClientError, DeleteParams, FetchParams, FetchResponse, MutationParams, MutationResponse, RecordClient, RecordResponse};

pub const PUBLIC_KEY_HEADER: &str = "X-Apper-Public-Key";

/// JSON-over-HTTP record client for the hosted backend.
#[derive(Clone)]
pub struct ApperHttpClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    public_key: String,
}

impl ApperHttpClient {
    pub fn new(cfg: &ApperConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            project_id: cfg.project_id.clone(),
            public_key: cfg.public_key.clone(),
        })
    }

    fn url(&self, table: &str, op: &str) -> String {
        format!("{}/{}/tables/{}/records/{}", self.base_url, self.project_id, table, op)
    }

    async fn post<B, R>(&self, url: String, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .http
            .post(&url)
            .header(PUBLIC_KEY_HEADER, &self.public_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        debug!(%url, status = status.as_u16(), bytes = bytes.len(), "record_client_response");

        // Error statuses still carry the {success, message} envelope when the backend produced them.
        match serde_json::from_slice::<R>(&bytes) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(ClientError::Decode(e.to_string())),
            Err(_) => Err(ClientError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            }),
        }
    }
}

#[async_trait]
impl RecordClient for ApperHttpClient {
    #[instrument(skip(self, params))]
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse, ClientError> {
        self.post(self.url(table, "fetch"), params).await
    }

    #[instrument(skip(self, params))]
    async fn get_record_by_id(&self, table: &str, id: RecordId, params: &FetchParams) -> Result<RecordResponse, ClientError> {
        self.post(self.url(table, &id.to_string()), params).await
    }

    #[instrument(skip(self, params), fields(records = params.records.len()))]
    async fn create_record(&self, table: &str, params: &MutationParams) -> Result<MutationResponse, ClientError> {
        self.post(self.url(table, "create"), params).await
    }

    #[instrument(skip(self, params), fields(records = params.records.len()))]
    async fn update_record(&self, table: &str, params: &MutationParams) -> Result<MutationResponse, ClientError> {
        self.post(self.url(table, "update"), params).await
    }

    #[instrument(skip(self, params), fields(records = params.record_ids.len()))]
    async fn delete_record(&self, table: &str, params: &DeleteParams) -> Result<MutationResponse, ClientError> {
        self.post(self.url(table, "delete"), params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApperConfig {
        ApperConfig {
            project_id: "proj".into(),
            public_key: "pk".into(),
            base_url: base_url.into(),
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
        }
    }

    #[test]
    fn urls_are_scoped_by_project_and_table() {
        let client = ApperHttpClient::new(&config("https://backend.example.com/")).unwrap();
        assert_eq!(client.url("reminder_c", "fetch"), "https://backend.example.com/proj/tables/reminder_c/records/fetch");
        assert_eq!(client.url("reminder_c", "12"), "https://backend.example.com/proj/tables/reminder_c/records/12");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let client = ApperHttpClient::new(&config("http://127.0.0.1:1")).unwrap();
        let err = client
            .fetch_records("reminder_c", &FetchParams::with_fields(&["Name"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
