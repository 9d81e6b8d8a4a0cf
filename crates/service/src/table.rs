//! Typed access to one backend table: builds params, unwraps envelopes and
//! maps records into UI models.

use std::sync::Arc;

use models::errors::ModelError;
use models::{Record, RecordId};
use serde::Serialize;
use tracing::error;

use crate::client::{DeleteParams, FetchParams, MutationParams, MutationResponse, RecordClient, RecordResult};
use crate::errors::ServiceError;

pub struct RecordTable<C> {
    client: Arc<C>,
    name: &'static str,
    fields: &'static [&'static str],
}

impl<C> Clone for RecordTable<C> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), name: self.name, fields: self.fields }
    }
}

impl<C: RecordClient> RecordTable<C> {
    pub fn new(client: Arc<C>, name: &'static str, fields: &'static [&'static str]) -> Self {
        Self { client, name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Params selecting every known column of the table.
    pub fn params(&self) -> FetchParams {
        FetchParams::with_fields(self.fields)
    }

    pub async fn fetch<T>(&self, params: &FetchParams) -> Result<Vec<T>, ServiceError>
    where
        T: for<'a> TryFrom<&'a Record, Error = ModelError>,
    {
        let resp = self.client.fetch_records(self.name, params).await?;
        if !resp.success {
            return Err(backend(resp.message));
        }
        let rows = resp.data.unwrap_or_default();
        Ok(rows.iter().map(|r| T::try_from(r)).collect::<Result<Vec<_>, _>>()?)
    }

    /// `Ok(None)` when the backend has no such row.
    pub async fn get<T>(&self, id: RecordId) -> Result<Option<T>, ServiceError>
    where
        T: for<'a> TryFrom<&'a Record, Error = ModelError>,
    {
        let resp = self.client.get_record_by_id(self.name, id, &self.params()).await?;
        if !resp.success {
            return Err(backend(resp.message));
        }
        Ok(resp.data.as_ref().map(|r| T::try_from(r)).transpose()?)
    }

    /// Like [`get`](Self::get), but absence is [`ServiceError::NotFound`].
    pub async fn require<T>(&self, id: RecordId, entity: &str) -> Result<T, ServiceError>
    where
        T: for<'a> TryFrom<&'a Record, Error = ModelError>,
    {
        self.get(id).await?.ok_or_else(|| ServiceError::not_found(entity))
    }

    pub async fn create<P: Serialize + Sync>(&self, payload: &P) -> Result<Record, ServiceError> {
        let params = MutationParams::single(Record::from_payload(payload)?);
        let resp = self.client.create_record(self.name, &params).await?;
        self.first_success(resp, "create")
    }

    pub async fn update<P: Serialize + Sync>(&self, payload: &P) -> Result<Record, ServiceError> {
        let params = MutationParams::single(Record::from_payload(payload)?);
        let resp = self.client.update_record(self.name, &params).await?;
        self.first_success(resp, "update")
    }

    /// True iff exactly one row was deleted.
    pub async fn delete(&self, id: RecordId) -> Result<bool, ServiceError> {
        let resp = self.client.delete_record(self.name, &DeleteParams::single(id)).await?;
        if !resp.success {
            return Err(backend(resp.message));
        }
        let Some(results) = resp.results else { return Ok(false) };
        self.log_failures(&results, "delete");
        Ok(results.iter().filter(|r| r.success).count() == 1)
    }

    fn first_success(&self, resp: MutationResponse, action: &str) -> Result<Record, ServiceError> {
        if !resp.success {
            return Err(backend(resp.message));
        }
        let results = resp.results.unwrap_or_default();
        self.log_failures(&results, action);
        results
            .into_iter()
            .filter(|r| r.success)
            .find_map(|r| r.data)
            .ok_or_else(|| ServiceError::NoRecord(format!("{} {}", action, self.name)))
    }

    fn log_failures(&self, results: &[RecordResult], action: &str) {
        let failed: Vec<&RecordResult> = results.iter().filter(|r| !r.success).collect();
        if failed.is_empty() {
            return;
        }
        let details = serde_json::to_string(&failed).unwrap_or_default();
        error!(table = self.name, failed = failed.len(), %details, "failed to {} records", action);
    }
}

fn backend(message: Option<String>) -> ServiceError {
    ServiceError::Backend(message.unwrap_or_else(|| "request failed".to_string()))
}

/// Collapse a failed read into its fallback value, logging the cause.
pub fn or_fallback<T: Default>(res: Result<T, ServiceError>, what: &str) -> T {
    res.unwrap_or_else(|e| {
        error!(error = %e, code = e.code(), "Error {}", what);
        T::default()
    })
}

/// Logs and passes through an error on a propagating operation.
pub fn logged<T>(res: Result<T, ServiceError>, what: &str) -> Result<T, ServiceError> {
    res.inspect_err(|e| error!(error = %e, code = e.code(), "Error {}", what))
}
