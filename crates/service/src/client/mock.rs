//! In-memory record client for tests, demos and offline runs.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use models::record::{now_iso, parse_float, parse_int, CREATED_ON, ID, NAME};
use models::{Record, RecordId};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::{
    ClientError, DeleteParams, FetchParams, FetchResponse, MutationParams, MutationResponse, Operator, RecordClient,
    RecordResponse, RecordResult, SortType, WhereCondition,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Fetch,
    Get,
    Create,
    Update,
    Delete,
}

/// How a scripted call fails.
#[derive(Clone, Debug, PartialEq)]
pub enum Failure {
    /// The backend answers `{ success: false, message }`.
    Envelope(String),
    /// The call never gets an answer.
    Transport(String),
    /// The envelope succeeds but every record in it is rejected.
    RejectRecords(String),
    /// The envelope succeeds with exactly these per-record outcomes.
    Results(Vec<RecordResult>),
}

#[derive(Clone, Debug)]
struct ScriptedFailure {
    op: Op,
    table: String,
    failure: Failure,
    remaining: Option<usize>,
}

/// One journaled call with its serialized params.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub op: Op,
    pub table: String,
    pub params: Value,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Record>>,
    next_ids: HashMap<String, RecordId>,
    lookups: HashMap<String, String>,
    failures: Vec<ScriptedFailure>,
    journal: Vec<Call>,
}

impl State {
    fn take_failure(&mut self, op: Op, table: &str) -> Option<Failure> {
        let idx = self.failures.iter().position(|f| f.op == op && f.table == table)?;
        let failure = self.failures[idx].failure.clone();
        match self.failures[idx].remaining {
            Some(1) => {
                self.failures.remove(idx);
            }
            Some(n) => self.failures[idx].remaining = Some(n - 1),
            None => {}
        }
        Some(failure)
    }

    fn record<P: Serialize>(&mut self, op: Op, table: &str, params: &P) {
        let params = serde_json::to_value(params).unwrap_or(Value::Null);
        self.journal.push(Call { op, table: table.to_string(), params });
    }

    fn allocate_id(&mut self, table: &str) -> RecordId {
        let max_seen = self
            .tables
            .get(table)
            .and_then(|rows| rows.iter().filter_map(Record::id).max())
            .unwrap_or(0);
        let next = self.next_ids.entry(table.to_string()).or_insert(0);
        *next = (*next).max(max_seen) + 1;
        *next
    }

    fn insert(&mut self, table: &str, mut record: Record) -> Record {
        let id = match record.id() {
            Some(id) => id,
            None => self.allocate_id(table),
        };
        let map = record.as_map_mut();
        map.insert(ID.into(), json!(id));
        map.entry(CREATED_ON.to_string()).or_insert_with(|| json!(now_iso()));
        self.tables.entry(table.to_string()).or_default().push(record.clone());
        record
    }

    /// Resolve registered lookup fields from bare ids to `{Id, Name}`.
    fn expand(&self, record: &Record) -> Record {
        let mut out = record.clone();
        for (field, target) in &self.lookups {
            if matches!(record.get(field), Some(Value::Object(_))) {
                continue;
            }
            let Some(id) = record.get(field).and_then(parse_int) else { continue };
            let name = self
                .tables
                .get(target)
                .and_then(|rows| rows.iter().find(|r| r.id() == Some(id)))
                .and_then(|r| r.opt_str(NAME))
                .unwrap_or_default();
            out.as_map_mut().insert(field.clone(), json!({ "Id": id, "Name": name }));
        }
        out
    }

    /// Keep system fields plus the requested ones.
    fn project(&self, record: &Record, params: &FetchParams) -> Record {
        let expanded = self.expand(record);
        if params.fields.is_empty() {
            return expanded;
        }
        let mut map = serde_json::Map::new();
        for (key, value) in expanded.as_map() {
            if key == ID || key == CREATED_ON || params.field_names().any(|f| f == key) {
                map.insert(key.clone(), value.clone());
            }
        }
        Record::new(map)
    }
}

/// Backend stand-in keeping every table in memory.
#[derive(Default)]
pub struct InMemoryRecordClient {
    state: Mutex<State>,
}

impl InMemoryRecordClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows as-is, assigning `Id`/`CreatedOn` where missing.
    pub async fn seed<I>(&self, table: &str, rows: I) -> Vec<RecordId>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut state = self.state.lock().await;
        rows.into_iter()
            .filter_map(|row| Record::from_value(row).ok())
            .map(|record| state.insert(table, record))
            .filter_map(|record| record.id())
            .collect()
    }

    /// Resolve `field` against `target_table` on reads, as the backend does for lookups.
    pub async fn register_lookup(&self, field: &str, target_table: &str) {
        self.state.lock().await.lookups.insert(field.to_string(), target_table.to_string());
    }

    /// Fail the next `op` on `table`.
    pub async fn fail_next(&self, op: Op, table: &str, failure: Failure) {
        self.script(op, table, failure, Some(1)).await;
    }

    /// Fail every `op` on `table` from now on.
    pub async fn fail_always(&self, op: Op, table: &str, failure: Failure) {
        self.script(op, table, failure, None).await;
    }

    async fn script(&self, op: Op, table: &str, failure: Failure, remaining: Option<usize>) {
        self.state.lock().await.failures.push(ScriptedFailure { op, table: table.to_string(), failure, remaining });
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failures.clear();
    }

    pub async fn records(&self, table: &str) -> Vec<Record> {
        self.state.lock().await.tables.get(table).cloned().unwrap_or_default()
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.journal.clone()
    }

    pub async fn calls_for(&self, op: Op, table: &str) -> Vec<Call> {
        self.calls().await.into_iter().filter(|c| c.op == op && c.table == table).collect()
    }
}

const SCRIPTED_RESULTS: &str = "per-record results only apply to mutations";

fn scripted(results: Vec<RecordResult>) -> MutationResponse {
    MutationResponse { success: true, results: Some(results), message: None }
}

fn rejected(records: usize, message: &str) -> MutationResponse {
    let results = (0..records)
        .map(|_| RecordResult { success: false, data: None, message: Some(message.to_string()), errors: vec![json!(message)] })
        .collect();
    MutationResponse { success: true, results: Some(results), message: None }
}

fn not_found(id: Option<RecordId>) -> RecordResult {
    let message = match id {
        Some(id) => format!("Record with Id {id} does not exist"),
        None => "Record Id is required".to_string(),
    };
    RecordResult { success: false, data: None, message: Some(message), errors: Vec::new() }
}

#[async_trait]
impl RecordClient for InMemoryRecordClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> Result<FetchResponse, ClientError> {
        let mut state = self.state.lock().await;
        state.record(Op::Fetch, table, params);
        match state.take_failure(Op::Fetch, table) {
            Some(Failure::Transport(m)) => return Err(ClientError::Transport(m)),
            Some(Failure::Envelope(m)) | Some(Failure::RejectRecords(m)) => {
                return Ok(FetchResponse { success: false, data: None, message: Some(m) })
            }
            Some(Failure::Results(_)) => {
                return Ok(FetchResponse { success: false, data: None, message: Some(SCRIPTED_RESULTS.into()) })
            }
            None => {}
        }

        let mut rows: Vec<Record> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| params.conditions.iter().all(|c| matches(r, c))).cloned().collect())
            .unwrap_or_default();
        for order in params.order_by.iter().rev() {
            rows.sort_by(|a, b| {
                let ord = compare_fields(a.get(&order.field_name), b.get(&order.field_name));
                match order.sorttype {
                    SortType::Asc => ord,
                    SortType::Desc => ord.reverse(),
                }
            });
        }
        if let Some(paging) = params.paging {
            rows = rows.into_iter().skip(paging.offset as usize).take(paging.limit as usize).collect();
        }
        let data = rows.iter().map(|r| state.project(r, params)).collect();
        Ok(FetchResponse { success: true, data: Some(data), message: None })
    }

    async fn get_record_by_id(&self, table: &str, id: RecordId, params: &FetchParams) -> Result<RecordResponse, ClientError> {
        let mut state = self.state.lock().await;
        state.record(Op::Get, table, &json!({ "id": id, "params": params }));
        match state.take_failure(Op::Get, table) {
            Some(Failure::Transport(m)) => return Err(ClientError::Transport(m)),
            Some(Failure::Envelope(m)) | Some(Failure::RejectRecords(m)) => {
                return Ok(RecordResponse { success: false, data: None, message: Some(m) })
            }
            Some(Failure::Results(_)) => {
                return Ok(RecordResponse { success: false, data: None, message: Some(SCRIPTED_RESULTS.into()) })
            }
            None => {}
        }
        let data = state
            .tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.id() == Some(id)))
            .map(|r| state.project(r, params));
        Ok(RecordResponse { success: true, data, message: None })
    }

    async fn create_record(&self, table: &str, params: &MutationParams) -> Result<MutationResponse, ClientError> {
        let mut state = self.state.lock().await;
        state.record(Op::Create, table, params);
        match state.take_failure(Op::Create, table) {
            Some(Failure::Transport(m)) => return Err(ClientError::Transport(m)),
            Some(Failure::Envelope(m)) => return Ok(MutationResponse { success: false, results: None, message: Some(m) }),
            Some(Failure::RejectRecords(m)) => return Ok(rejected(params.records.len(), &m)),
            Some(Failure::Results(results)) => return Ok(scripted(results)),
            None => {}
        }
        let results = params
            .records
            .iter()
            .map(|record| {
                let mut fresh = record.clone();
                fresh.as_map_mut().remove(ID);
                let stored = state.insert(table, fresh);
                RecordResult { success: true, data: Some(stored), message: None, errors: Vec::new() }
            })
            .collect();
        Ok(MutationResponse { success: true, results: Some(results), message: None })
    }

    async fn update_record(&self, table: &str, params: &MutationParams) -> Result<MutationResponse, ClientError> {
        let mut state = self.state.lock().await;
        state.record(Op::Update, table, params);
        match state.take_failure(Op::Update, table) {
            Some(Failure::Transport(m)) => return Err(ClientError::Transport(m)),
            Some(Failure::Envelope(m)) => return Ok(MutationResponse { success: false, results: None, message: Some(m) }),
            Some(Failure::RejectRecords(m)) => return Ok(rejected(params.records.len(), &m)),
            Some(Failure::Results(results)) => return Ok(scripted(results)),
            None => {}
        }
        let rows = state.tables.entry(table.to_string()).or_default();
        let results = params
            .records
            .iter()
            .map(|patch| {
                let id = patch.id();
                match rows.iter_mut().find(|r| id.is_some() && r.id() == id) {
                    Some(row) => {
                        for (key, value) in patch.as_map() {
                            row.as_map_mut().insert(key.clone(), value.clone());
                        }
                        RecordResult { success: true, data: Some(row.clone()), message: None, errors: Vec::new() }
                    }
                    None => not_found(id),
                }
            })
            .collect();
        Ok(MutationResponse { success: true, results: Some(results), message: None })
    }

    async fn delete_record(&self, table: &str, params: &DeleteParams) -> Result<MutationResponse, ClientError> {
        let mut state = self.state.lock().await;
        state.record(Op::Delete, table, params);
        match state.take_failure(Op::Delete, table) {
            Some(Failure::Transport(m)) => return Err(ClientError::Transport(m)),
            Some(Failure::Envelope(m)) => return Ok(MutationResponse { success: false, results: None, message: Some(m) }),
            Some(Failure::RejectRecords(m)) => return Ok(rejected(params.record_ids.len(), &m)),
            Some(Failure::Results(results)) => return Ok(scripted(results)),
            None => {}
        }
        let rows = state.tables.entry(table.to_string()).or_default();
        let results = params
            .record_ids
            .iter()
            .map(|id| match rows.iter().position(|r| r.id() == Some(*id)) {
                Some(idx) => {
                    let removed = rows.remove(idx);
                    RecordResult { success: true, data: Some(removed), message: None, errors: Vec::new() }
                }
                None => not_found(Some(*id)),
            })
            .collect();
        Ok(MutationResponse { success: true, results: Some(results), message: None })
    }
}

/// Comparable view of a field: lookups compare by their `Id`.
fn scalar(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get(ID).unwrap_or(value),
        other => other,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    let (a, b) = (scalar(a), scalar(b));
    if let (Value::Number(_), _) | (_, Value::Number(_)) = (a, b) {
        if let (Some(x), Some(y)) = (parse_float(a), parse_float(b)) {
            return x.partial_cmp(&y);
        }
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn matches(record: &Record, cond: &WhereCondition) -> bool {
    let Some(value) = record.get(&cond.field_name) else { return false };
    cond.values.iter().any(|expected| {
        let ord = compare_values(value, expected);
        match cond.operator {
            Operator::EqualTo => ord == Some(Ordering::Equal),
            Operator::NotEqualTo => ord != Some(Ordering::Equal),
            Operator::GreaterThan => ord == Some(Ordering::Greater),
            Operator::GreaterThanOrEqualTo => matches!(ord, Some(Ordering::Greater | Ordering::Equal)),
            Operator::LessThan => ord == Some(Ordering::Less),
            Operator::LessThanOrEqualTo => matches!(ord, Some(Ordering::Less | Ordering::Equal)),
            Operator::Contains => match (scalar(value), expected) {
                (Value::String(hay), Value::String(needle)) => hay.contains(needle.as_str()),
                _ => false,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MutationParams;

    #[tokio::test]
    async fn create_assigns_ids_and_fetch_filters() -> Result<(), anyhow::Error> {
        let client = InMemoryRecordClient::new();
        client.seed("t", [json!({ "Name": "a", "recipient_c": { "Id": 1, "Name": "R" } }), json!({ "Name": "b", "recipient_c": 2 })]).await;

        let created = client
            .create_record("t", &MutationParams::single(Record::from_value(json!({ "Name": "c", "recipient_c": 1 }))?))
            .await?;
        let data = created.results.unwrap()[0].data.clone().unwrap();
        assert_eq!(data.id(), Some(3));
        assert!(data.get(CREATED_ON).is_some());

        let params = FetchParams::with_fields(&["Name", "recipient_c"]).where_eq("recipient_c", 1).order_by("Name", SortType::Desc);
        let resp = client.fetch_records("t", &params).await?;
        let names: Vec<String> = resp.data.unwrap().iter().map(|r| r.str_or("Name", "")).collect();
        assert_eq!(names, vec!["c", "a"]);
        Ok(())
    }

    #[tokio::test]
    async fn fetch_projects_requested_fields() -> Result<(), anyhow::Error> {
        let client = InMemoryRecordClient::new();
        client.seed("t", [json!({ "Name": "a", "secret_c": "x" })]).await;
        let resp = client.fetch_records("t", &FetchParams::with_fields(&["Name"])).await?;
        let row = &resp.data.unwrap()[0];
        assert!(row.get("secret_c").is_none());
        assert!(row.get(ID).is_some());
        Ok(())
    }

    #[tokio::test]
    async fn range_filters_compare_iso_dates() -> Result<(), anyhow::Error> {
        let client = InMemoryRecordClient::new();
        client
            .seed("t", [json!({ "d": "2024-01-01T00:00:00.000Z" }), json!({ "d": "2024-02-01T00:00:00.000Z" })])
            .await;
        let params = FetchParams::default()
            .filter("d", Operator::GreaterThanOrEqualTo, [json!("2024-01-15T00:00:00.000Z")]);
        let resp = client.fetch_records("t", &params).await?;
        assert_eq!(resp.data.unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed() -> Result<(), anyhow::Error> {
        let client = InMemoryRecordClient::new();
        client.fail_next(Op::Fetch, "t", Failure::Envelope("boom".into())).await;
        let first = client.fetch_records("t", &FetchParams::default()).await?;
        assert!(!first.success);
        assert_eq!(first.message.as_deref(), Some("boom"));
        let second = client.fetch_records("t", &FetchParams::default()).await?;
        assert!(second.success);

        client.fail_always(Op::Delete, "t", Failure::Transport("down".into())).await;
        assert!(client.delete_record("t", &DeleteParams::single(1)).await.is_err());
        assert!(client.delete_record("t", &DeleteParams::single(1)).await.is_err());
        assert_eq!(client.calls_for(Op::Delete, "t").await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() -> Result<(), anyhow::Error> {
        let client = InMemoryRecordClient::new();
        let patch = Record::from_value(json!({ "Id": 99, "Name": "x" }))?;
        let resp = client.update_record("t", &MutationParams::single(patch)).await?;
        assert!(!resp.results.unwrap()[0].success);
        let resp = client.delete_record("t", &DeleteParams::single(99)).await?;
        assert!(!resp.results.unwrap()[0].success);
        Ok(())
    }

    #[tokio::test]
    async fn registered_lookups_resolve_names() -> Result<(), anyhow::Error> {
        let client = InMemoryRecordClient::new();
        client.seed("recipient_c", [json!({ "Id": 5, "Name": "Grandma" })]).await;
        client.register_lookup("recipient_c", "recipient_c").await;
        client.seed("t", [json!({ "recipient_c": 5 })]).await;
        let resp = client.fetch_records("t", &FetchParams::default()).await?;
        let row = &resp.data.unwrap()[0];
        assert_eq!(row.lookup("recipient_c").map(|l| l.name), Some("Grandma".to_string()));
        Ok(())
    }
}
