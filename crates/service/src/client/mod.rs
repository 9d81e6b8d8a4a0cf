//! Record client abstraction over the hosted backend.
//!
//! Services never talk to the backend directly: they receive an
//! `Arc<impl RecordClient>` at construction. [`http::ApperHttpClient`] talks to
//! the real backend, [`mock::InMemoryRecordClient`] keeps tables in memory.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use models::{Record, RecordId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failures below the response envelope: the call never produced one.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

/// One entry of `fields`: `{ "field": { "Name": "title_c" } }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub field: FieldName,
}

impl FieldSpec {
    pub fn named(name: &str) -> Self {
        Self { field: FieldName { name: name.to_string() } }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    Contains,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhereCondition {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    pub sorttype: SortType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: u32,
    pub offset: u32,
}

/// Query for `fetch_records` and `get_record_by_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<WhereCondition>,
    #[serde(rename = "orderBy", default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "pagingInfo", default, skip_serializing_if = "Option::is_none")]
    pub paging: Option<PagingInfo>,
}

impl FetchParams {
    pub fn with_fields(fields: &[&str]) -> Self {
        Self { fields: fields.iter().map(|f| FieldSpec::named(f)).collect(), ..Self::default() }
    }

    pub fn filter<I>(mut self, field: &str, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.conditions.push(WhereCondition {
            field_name: field.to_string(),
            operator,
            values: values.into_iter().collect(),
        });
        self
    }

    pub fn where_eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::EqualTo, [value.into()])
    }

    pub fn order_by(mut self, field: &str, sorttype: SortType) -> Self {
        self.order_by.push(OrderBy { field_name: field.to_string(), sorttype });
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.paging = Some(PagingInfo { limit, offset });
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.name.as_str())
    }
}

/// Body of create and update calls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationParams {
    pub records: Vec<Record>,
}

impl MutationParams {
    pub fn single(record: Record) -> Self {
        Self { records: vec![record] }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteParams {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<RecordId>,
}

impl DeleteParams {
    pub fn single(id: RecordId) -> Self {
        Self { record_ids: vec![id] }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<Record>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of one record inside a create/update/delete call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Table-level CRUD against the hosted backend.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse, ClientError>;
    async fn get_record_by_id(&self, table: &str, id: RecordId, params: &FetchParams) -> Result<RecordResponse, ClientError>;
    async fn create_record(&self, table: &str, params: &MutationParams) -> Result<MutationResponse, ClientError>;
    async fn update_record(&self, table: &str, params: &MutationParams) -> Result<MutationResponse, ClientError>;
    async fn delete_record(&self, table: &str, params: &DeleteParams) -> Result<MutationResponse, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetch_params_serialize_to_sdk_shape() {
        let params = FetchParams::with_fields(&["Name", "title_c"])
            .where_eq("recipient_c", 4)
            .order_by("Id", SortType::Desc)
            .page(20, 40);
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({
            "fields": [{ "field": { "Name": "Name" } }, { "field": { "Name": "title_c" } }],
            "where": [{ "FieldName": "recipient_c", "Operator": "EqualTo", "Values": [4] }],
            "orderBy": [{ "fieldName": "Id", "sorttype": "DESC" }],
            "pagingInfo": { "limit": 20, "offset": 40 }
        }));
    }

    #[test]
    fn empty_clauses_are_omitted() {
        let value = serde_json::to_value(FetchParams::with_fields(&["Name"])).unwrap();
        assert!(value.get("where").is_none());
        assert!(value.get("orderBy").is_none());
        assert!(value.get("pagingInfo").is_none());
    }

    #[test]
    fn envelopes_tolerate_missing_members() {
        let resp: MutationResponse = serde_json::from_value(json!({ "success": false, "message": "denied" })).unwrap();
        assert!(!resp.success);
        assert!(resp.results.is_none());

        let resp: FetchResponse = serde_json::from_value(json!({ "success": true, "data": null })).unwrap();
        assert!(resp.data.is_none());
    }

    #[test]
    fn delete_params_use_record_ids_key() {
        let value = serde_json::to_value(DeleteParams::single(7)).unwrap();
        assert_eq!(value, json!({ "RecordIds": [7] }));
    }
}
