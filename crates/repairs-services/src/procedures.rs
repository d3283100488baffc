//! Typed stored-procedure calls
//!
//! Every procedure lives in the `technics` schema. Arguments are passed by
//! name and bound positionally, so a call renders as
//! `exec technics.X @Name = @P1, ...` with the values in the same order.

use std::sync::Arc;

use chrono::NaiveDate;
use repairs_core::{ClientVersion, Connection, QueryResult, Row, Value};

use crate::error::{DataAccessError, DataResult};
use crate::filters::FilterSet;
use crate::form::RepairDraft;
use crate::models::{
    MeasureUnit, MovementRequest, ObjectRow, OwnerBinding, ReferenceRow, RepairSnapshot,
    TechnicsInfo, UserInfo,
};
use crate::repair::RepairRecord;

const SCHEMA: &str = "technics";

/// A stored-procedure invocation with named arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    name: &'static str,
    args: Vec<(&'static str, Value)>,
}

impl ProcedureCall {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.args.push((name, value.into()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Statement text with `@P<n>` placeholders
    pub fn sql(&self) -> String {
        let mut sql = format!("exec {}.{}", SCHEMA, self.name);
        for (i, (name, _)) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            sql.push_str(&format!("{}@{} = @P{}", sep, name, i + 1));
        }
        sql
    }

    pub fn params(&self) -> Vec<Value> {
        self.args.iter().map(|(_, v)| v.clone()).collect()
    }
}

/// Stored procedures of one open connection
///
/// Network and unexpected failures come back as `DataAccessError`.
/// Programming errors (malformed call, missing procedure) are logged and
/// surface as `None` or an empty list; callers treat that as "no result".
pub struct Procedures {
    connection: Arc<dyn Connection>,
}

impl Procedures {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    async fn fetch(&self, call: &ProcedureCall) -> DataResult<Option<QueryResult>> {
        let sql = call.sql();
        tracing::debug!(procedure = call.name(), "calling stored procedure");
        match self.connection.query(&sql, &call.params()).await {
            Ok(result) => Ok(Some(result)),
            Err(err) => match DataAccessError::from_execute(err) {
                Some(classified) => {
                    tracing::error!(procedure = call.name(), error = %classified, "stored procedure failed");
                    Err(classified)
                }
                None => {
                    tracing::warn!(procedure = call.name(), sql = %sql, "programming error swallowed");
                    Ok(None)
                }
            },
        }
    }

    async fn fetch_rows<T>(
        &self,
        call: &ProcedureCall,
        decode: impl Fn(&Row) -> Option<T>,
    ) -> DataResult<Option<Vec<T>>> {
        let Some(result) = self.fetch(call).await? else {
            return Ok(None);
        };
        let mut decoded = Vec::with_capacity(result.rows.len());
        for row in &result.rows {
            match decode(row) {
                Some(value) => decoded.push(value),
                None => tracing::warn!(procedure = call.name(), "skipping undecodable row"),
            }
        }
        Ok(Some(decoded))
    }

    async fn fetch_first(&self, call: &ProcedureCall) -> DataResult<Option<Row>> {
        Ok(self.fetch(call).await?.and_then(QueryResult::into_first_row))
    }

    /// Run a mutating procedure and read its success flag.
    ///
    /// `Some(true)` only when the first column of the first row is `1`.
    async fn mutate(&self, call: &ProcedureCall) -> DataResult<Option<bool>> {
        let Some(result) = self.fetch(call).await? else {
            return Ok(None);
        };
        let flag = result
            .into_first_row()
            .and_then(|row| row.value(0).as_i64());
        if flag.is_none() {
            tracing::warn!(procedure = call.name(), "no success flag returned");
        }
        Ok(Some(flag == Some(1)))
    }

    /// Whether the current login may use the application
    #[tracing::instrument(skip(self))]
    pub async fn access_check(&self) -> DataResult<bool> {
        let row = self.fetch_first(&ProcedureCall::new("Access_Check")).await?;
        Ok(row.is_some_and(|row| {
            matches!(row.value(0).as_i64(), Some(1..=3))
                || row.value(1).as_bool().unwrap_or(false)
        }))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user_info(&self) -> DataResult<Option<UserInfo>> {
        let row = self.fetch_first(&ProcedureCall::new("get_user_info")).await?;
        Ok(row.as_ref().and_then(UserInfo::from_row))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_references(&self) -> DataResult<Vec<ReferenceRow>> {
        let call = ProcedureCall::new("get_references");
        Ok(self
            .fetch_rows(&call, ReferenceRow::from_row)
            .await?
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_objects(&self) -> DataResult<Vec<ObjectRow>> {
        let call = ProcedureCall::new("get_objects");
        Ok(self
            .fetch_rows(&call, ObjectRow::from_row)
            .await?
            .unwrap_or_default())
    }

    /// Server's `(major, minor)`, compared with the client's at startup
    #[tracing::instrument(skip(self))]
    pub async fn get_version_for_comparison(&self) -> DataResult<Option<ClientVersion>> {
        let row = self
            .fetch_first(&ProcedureCall::new("get_version_for_comparison"))
            .await?;
        Ok(row.and_then(|row| {
            let major = u32::try_from(row.value(0).as_i64()?).ok()?;
            let minor = u32::try_from(row.value(1).as_i64()?).ok()?;
            Some(ClientVersion::new(major, minor))
        }))
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_repair_list(&self, filters: &FilterSet) -> DataResult<Option<Vec<RepairRecord>>> {
        let call = filters
            .params()
            .into_iter()
            .fold(ProcedureCall::new("get_repair_list"), |call, (name, value)| {
                call.arg(name, value)
            });
        self.fetch_rows(&call, RepairRecord::from_row).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_technics_info(&self) -> DataResult<Vec<TechnicsInfo>> {
        let call = ProcedureCall::new("get_technics_info");
        Ok(self
            .fetch_rows(&call, TechnicsInfo::from_row)
            .await?
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_measure_units(&self) -> DataResult<Vec<MeasureUnit>> {
        let call = ProcedureCall::new("get_measure_units");
        Ok(self
            .fetch_rows(&call, MeasureUnit::from_row)
            .await?
            .unwrap_or_default())
    }

    /// Owner and location of `serial_number` on `date`, most relevant first
    #[tracing::instrument(skip(self))]
    pub async fn get_object_owner_info(
        &self,
        serial_number: &str,
        date: NaiveDate,
    ) -> DataResult<Vec<OwnerBinding>> {
        let call = ProcedureCall::new("get_object_owner_info")
            .arg("SN", serial_number)
            .arg("date", Value::Date(date));
        Ok(self
            .fetch_rows(&call, |row| Some(OwnerBinding::from_row(row)))
            .await?
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_current_repair(&self, repair_id: i64) -> DataResult<Option<RepairSnapshot>> {
        let call = ProcedureCall::new("get_current_repair").arg("RepairID", repair_id);
        Ok(self
            .fetch_first(&call)
            .await?
            .map(|row| RepairSnapshot::from_row(&row)))
    }

    #[tracing::instrument(skip(self, draft), fields(sn = %draft.serial_number))]
    pub async fn create_repair(&self, user_id: i64, draft: &RepairDraft) -> DataResult<Option<bool>> {
        let call = draft_args(
            ProcedureCall::new("CREATE_REPAIR").arg("UserID", user_id),
            draft,
        );
        self.mutate(&call).await
    }

    #[tracing::instrument(skip(self, draft), fields(sn = %draft.serial_number))]
    pub async fn update_repair(
        &self,
        user_id: i64,
        repair_id: i64,
        draft: &RepairDraft,
    ) -> DataResult<Option<bool>> {
        let call = draft_args(
            ProcedureCall::new("UPDATE_REPAIR")
                .arg("UserID", user_id)
                .arg("RepairID", repair_id),
            draft,
        );
        self.mutate(&call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_movement(&self, user_id: i64, movement: &MovementRequest) -> DataResult<Option<bool>> {
        let call = ProcedureCall::new("ADD_MOVEMENT")
            .arg("UserID", user_id)
            .arg("ID", movement.technics_id)
            .arg("SN", movement.serial_number.as_str())
            .arg("ObjectID", movement.object_id)
            .arg("date_movement", Value::Date(movement.date));
        self.mutate(&call).await
    }

    /// Run arbitrary SQL; used as a connectivity check
    #[tracing::instrument(skip(self))]
    pub async fn raw_query(&self, sql: &str) -> DataResult<Vec<Row>> {
        match self.connection.query(sql, &[]).await {
            Ok(result) => Ok(result.rows),
            Err(err) => match DataAccessError::from_execute(err) {
                Some(classified) => Err(classified),
                None => {
                    tracing::warn!(sql, "programming error swallowed");
                    Ok(Vec::new())
                }
            },
        }
    }
}

fn draft_args(call: ProcedureCall, draft: &RepairDraft) -> ProcedureCall {
    call.arg("SN", draft.serial_number.as_str())
        .arg("ObjectID", draft.object_id)
        .arg("date_broken", Value::Date(draft.broken_date))
        .arg("date_repair_finished", draft.finished_date)
        .arg("OutfitOrder", draft.work_order.clone())
        .arg("WorkingHours", draft.hours)
        .arg("UnitOfMeasureID", draft.unit_of_measure_id)
        .arg("NumberOfUnits", draft.unit_count)
        .arg("FaultDescription", draft.fault_description.clone())
        .arg("PerformedWork", draft.performed_work.clone())
        .arg("StatusID", draft.status.id())
}
