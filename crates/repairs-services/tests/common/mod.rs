//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use repairs_core::{
    Connection, ConnectionConfig, DatabaseDriver, QueryResult, RepairsError, Result, Value,
};
use repairs_services::{Notice, Notifier, Session};
use std::sync::Arc;

/// Mock connection for testing service-layer logic without a real database.
///
/// Responses are chosen by SQL pattern: the first registered pattern the
/// statement contains wins. Failures are scripted the same way and carry
/// a SQLSTATE, like the real driver's errors.
pub struct MockConnection {
    pub driver: String,
    /// SQLSTATE every statement fails with
    pub fail_all: Mutex<Option<String>>,
    /// `(pattern, SQLSTATE)`: statements containing the pattern fail
    pub query_failures: Vec<(String, String)>,
    /// `(pattern, result)`: statements containing the pattern return the result
    pub query_responses: Vec<(String, QueryResult)>,
    /// Every statement and its parameters, in call order
    pub query_log: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    pub close_count: Arc<Mutex<usize>>,
    pub closed: Mutex<bool>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            driver: "mock".to_string(),
            fail_all: Mutex::new(None),
            query_failures: vec![],
            query_responses: vec![],
            query_log: Arc::new(Mutex::new(Vec::new())),
            close_count: Arc::new(Mutex::new(0)),
            closed: Mutex::new(false),
        }
    }

    pub fn with_failure(self, sql_state: &str) -> Self {
        self.fail_with(sql_state);
        self
    }

    /// Make every later statement fail with `sql_state`
    pub fn fail_with(&self, sql_state: &str) {
        *self.fail_all.lock() = Some(sql_state.to_string());
    }

    /// Fail statements containing `sql_contains` with `sql_state`
    pub fn with_query_failure(mut self, sql_contains: &str, sql_state: &str) -> Self {
        self.query_failures
            .push((sql_contains.to_string(), sql_state.to_string()));
        self
    }

    /// Register a response for statements containing the given pattern
    pub fn with_query_response(mut self, sql_contains: &str, result: QueryResult) -> Self {
        self.query_responses.push((sql_contains.to_string(), result));
        self
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Parameters of the first statement containing `sql_contains`
    pub fn params_of(&self, sql_contains: &str) -> Option<Vec<Value>> {
        self.query_log
            .lock()
            .iter()
            .find(|(sql, _)| sql.contains(sql_contains))
            .map(|(_, params)| params.clone())
    }

    pub fn called(&self, sql_contains: &str) -> bool {
        self.query_log().iter().any(|sql| sql.contains(sql_contains))
    }

    pub fn close_count(&self) -> usize {
        *self.close_count.lock()
    }

    fn respond(&self, sql: &str) -> Result<QueryResult> {
        if let Some(state) = self.fail_all.lock().as_deref() {
            return Err(RepairsError::driver(state, "scripted failure"));
        }
        for (pattern, state) in &self.query_failures {
            if sql.contains(pattern.as_str()) {
                return Err(RepairsError::driver(state.as_str(), "scripted failure"));
            }
        }
        for (pattern, result) in &self.query_responses {
            if sql.contains(pattern.as_str()) {
                return Ok(result.clone());
            }
        }
        Ok(QueryResult::empty())
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        &self.driver
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.query_log.lock().push((sql.to_string(), params.to_vec()));
        self.respond(sql)
    }

    async fn close(&self) -> Result<()> {
        *self.close_count.lock() += 1;
        *self.closed.lock() = true;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

/// Driver handing out one shared `MockConnection`
pub struct MockDriver {
    pub connection: Arc<MockConnection>,
    /// SQLSTATE every connect attempt fails with
    pub connect_failure: Mutex<Option<String>>,
    pub connect_count: Mutex<usize>,
}

impl MockDriver {
    pub fn new(connection: MockConnection) -> Self {
        Self {
            connection: Arc::new(connection),
            connect_failure: Mutex::new(None),
            connect_count: Mutex::new(0),
        }
    }

    pub fn with_connect_failure(self, sql_state: &str) -> Self {
        self.fail_connect_with(sql_state);
        self
    }

    /// Make every later connect attempt fail with `sql_state`
    pub fn fail_connect_with(&self, sql_state: &str) {
        *self.connect_failure.lock() = Some(sql_state.to_string());
    }

    pub fn connect_count(&self) -> usize {
        *self.connect_count.lock()
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        *self.connect_count.lock() += 1;
        if let Some(state) = self.connect_failure.lock().as_deref() {
            return Err(RepairsError::driver(state, "scripted connect failure"));
        }
        *self.connection.closed.lock() = false;
        Ok(self.connection.clone() as Arc<dyn Connection>)
    }

    fn build_connection_string(&self, config: &ConnectionConfig) -> String {
        format!("mock://{}", config.host)
    }
}

pub fn session(driver: &Arc<MockDriver>) -> Session {
    Session::new(
        Arc::clone(driver) as Arc<dyn DatabaseDriver>,
        ConnectionConfig::new("mock", "test-host"),
    )
}

/// Notifier that records every notice it receives
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Result rows; `columns` only documents the select list the procedure returns
pub fn mock_query_result(columns: &[&str], rows: Vec<Vec<Value>>) -> QueryResult {
    debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
    QueryResult::from_values(rows)
}

pub fn flag_result(flag: i64) -> QueryResult {
    mock_query_result(&["result"], vec![vec![Value::Int64(flag)]])
}

pub fn version_result(major: i64, minor: i64) -> QueryResult {
    mock_query_result(
        &["major", "minor"],
        vec![vec![Value::Int64(major), Value::Int64(minor)]],
    )
}

pub fn access_result(access_type: Option<i64>, is_super_user: bool) -> QueryResult {
    mock_query_result(
        &["AccessType", "isSuperUser"],
        vec![vec![access_type.into(), Value::Bool(is_super_user)]],
    )
}

pub fn user_info_result() -> QueryResult {
    mock_query_result(
        &["UserID", "ShortUserName", "AccessType", "isSuperUser"],
        vec![vec![
            Value::Int32(24),
            Value::String("TestName".into()),
            Value::Int32(1),
            Value::Bool(false),
        ]],
    )
}

pub fn references_result() -> QueryResult {
    let rows = [
        ("status_list", 1, "Созд."),
        ("status_list", 2, "Фикс."),
        ("status_list", 3, "Удал."),
        ("People", 24, "TestName"),
        ("ListObjects", 5, "Киев"),
        ("TypeStore", 7, "Склад 1"),
        ("ListMfrs", 8, "Toyota"),
    ];
    mock_query_result(
        &["ref_type", "ref_id", "ref_name"],
        rows.iter()
            .map(|(t, id, name)| {
                vec![
                    Value::String((*t).into()),
                    Value::Int32(*id),
                    Value::String((*name).into()),
                ]
            })
            .collect(),
    )
}

/// A `get_repair_list` row: every column NULL except the ones given
pub fn repair_row(id: i64, status: Option<&str>, serial_number: Option<&str>) -> Vec<Value> {
    let mut row = vec![Value::Null; 20];
    row[0] = Value::Int64(id);
    row[4] = text(status);
    row[12] = text(serial_number);
    row
}

fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

pub fn repair_list_result(rows: Vec<Vec<Value>>) -> QueryResult {
    let columns = [
        "ID", "CreatedBy", "created_at", "StatusID", "Status", "rc", "store", "OutfitOrder",
        "owner", "tech_type", "mfr", "model", "SN", "WorkingHours", "date_broken",
        "date_repair_finished", "FaultDescription", "PerformedWork", "NumberOfUnits",
        "UnitOfMeasure",
    ];
    mock_query_result(&columns, rows)
}

/// Connection that lets `RepairApp::start` through
pub fn startup_connection(major: i64, minor: i64) -> MockConnection {
    MockConnection::new()
        .with_query_response("get_version_for_comparison", version_result(major, minor))
        .with_query_response("Access_Check", access_result(Some(1), false))
        .with_query_response("get_user_info", user_info_result())
        .with_query_response("get_references", references_result())
}
