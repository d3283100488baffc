//! Integration tests for RepairApp
//!
//! Startup gate, refresh and filters, click-to-sort and saving, driven
//! through the MockDriver with a recording notifier.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use repairs_core::{ClientVersion, Value};
use repairs_services::{
    ActionError, ClickRegion, DataAccessError, Dimension, MovementRequest, Notice, RepairApp,
    RepairColumn, RepairForm, RepairStatus, SaveOutcome, SortState, StartupError, StatusTag,
};

use common::{
    access_result, flag_result, mock_query_result, repair_list_result, repair_row, session,
    startup_connection, MockConnection, MockDriver, RecordingNotifier,
};

const CLIENT: ClientVersion = ClientVersion::new(1, 4);

async fn start(
    connection: MockConnection,
) -> (Arc<MockDriver>, Arc<RecordingNotifier>, RepairApp<Arc<RecordingNotifier>>) {
    let driver = Arc::new(MockDriver::new(connection));
    let notifier = Arc::new(RecordingNotifier::default());
    let app = RepairApp::start(session(&driver), Arc::clone(&notifier), CLIENT)
        .await
        .expect("app should start");
    (driver, notifier, app)
}

fn listed(app: &RepairApp<Arc<RecordingNotifier>>) -> Vec<i64> {
    app.table().rows().iter().map(|r| r.id).collect()
}

fn form_refs_connection() -> MockConnection {
    startup_connection(1, 4)
        .with_query_response(
            "get_technics_info",
            mock_query_result(
                &["SN", "tech_type", "model", "mfr"],
                vec![vec![
                    Value::String("SN-100".into()),
                    Value::String("Погрузчик".into()),
                    Value::String("X1".into()),
                    Value::String("Toyota".into()),
                ]],
            ),
        )
        .with_query_response(
            "get_measure_units",
            mock_query_result(&["label", "id"], vec![vec![Value::String("шт.".into()), Value::Int32(4)]]),
        )
        .with_query_response(
            "get_objects",
            mock_query_result(
                &["id", "rc", "store"],
                vec![vec![
                    Value::Int32(10),
                    Value::String("Киев".into()),
                    Value::String("Склад 1".into()),
                ]],
            ),
        )
}

fn valid_form() -> RepairForm {
    RepairForm {
        serial_number: "SN-100".into(),
        broken_date: "20.11.2019".into(),
        region: "Киев".into(),
        store: "Склад 1".into(),
        ..RepairForm::default()
    }
}

// ============ Startup Tests ============

#[tokio::test]
async fn start_loads_user_and_references_on_one_connection() {
    let (driver, notifier, app) = start(startup_connection(1, 4)).await;

    assert_eq!(app.user().user_id, 24);
    assert_eq!(app.user().short_user_name, "TestName");
    assert_eq!(
        app.references().choices(Dimension::Status),
        vec!["Все", "Созд.", "Фикс.", "Удал."]
    );
    assert_eq!(driver.connect_count(), 1);
    assert_eq!(driver.connection.close_count(), 1);
    assert!(notifier.notices().is_empty());

    let log = driver.connection.query_log();
    assert!(log[0].contains("get_version_for_comparison"));
    assert!(log[1].contains("Access_Check"));
}

#[tokio::test]
async fn version_mismatch_stops_before_references_load() {
    let driver = Arc::new(MockDriver::new(startup_connection(1, 5)));
    let notifier = Arc::new(RecordingNotifier::default());

    let err = RepairApp::start(session(&driver), Arc::clone(&notifier), CLIENT)
        .await
        .err()
        .expect("startup must be refused");

    assert!(matches!(
        err,
        StartupError::UpdateRequired { server: Some(v), .. } if v == ClientVersion::new(1, 5)
    ));
    assert!(!driver.connection.called("Access_Check"));
    assert!(!driver.connection.called("get_references"));
    assert!(!driver.connection.called("get_user_info"));
    assert_eq!(driver.connection.close_count(), 1);
    assert_eq!(
        notifier.notices(),
        vec![Notice::UpdateRequired {
            client: CLIENT,
            server: Some(ClientVersion::new(1, 5)),
        }]
    );
}

#[tokio::test]
async fn missing_server_version_requires_update() {
    let driver = Arc::new(MockDriver::new(MockConnection::new()));
    let notifier = Arc::new(RecordingNotifier::default());

    let err = RepairApp::start(session(&driver), Arc::clone(&notifier), CLIENT)
        .await
        .err()
        .expect("startup must be refused");
    assert!(matches!(err, StartupError::UpdateRequired { server: None, .. }));
}

#[tokio::test]
async fn access_denied_stops_before_references_load() {
    let connection = MockConnection::new()
        .with_query_response("Access_Check", access_result(Some(9), false))
        .with_query_response("get_version_for_comparison", common::version_result(1, 4));
    let driver = Arc::new(MockDriver::new(connection));
    let notifier = Arc::new(RecordingNotifier::default());

    let err = RepairApp::start(session(&driver), Arc::clone(&notifier), CLIENT)
        .await
        .err()
        .expect("startup must be refused");

    assert!(matches!(err, StartupError::AccessDenied));
    assert!(!driver.connection.called("get_references"));
    assert_eq!(notifier.notices(), vec![Notice::AccessDenied]);
}

#[tokio::test]
async fn login_failure_at_startup_is_notified() {
    let driver = Arc::new(MockDriver::new(startup_connection(1, 4)).with_connect_failure("28000"));
    let notifier = Arc::new(RecordingNotifier::default());

    let err = RepairApp::start(session(&driver), Arc::clone(&notifier), CLIENT)
        .await
        .err()
        .expect("startup must be refused");

    assert!(matches!(err, StartupError::Data(DataAccessError::Login { .. })));
    assert_eq!(notifier.notices(), vec![Notice::LoginFailed]);
    assert!(driver.connection.query_log().is_empty());
}

// ============ Refresh & Filter Tests ============

#[tokio::test]
async fn refresh_replaces_rows() {
    let connection = startup_connection(1, 4).with_query_response(
        "get_repair_list",
        repair_list_result(vec![
            repair_row(2, Some("Фикс."), Some("SN-2")),
            repair_row(1, Some("Созд."), Some("SN-1")),
        ]),
    );
    let (_driver, _notifier, mut app) = start(connection).await;

    app.refresh().await.unwrap();
    assert_eq!(listed(&app), vec![2, 1]);

    let rendered = app.rendered_rows();
    assert_eq!(rendered[0].tag, Some(StatusTag::Fixed));
    assert_eq!(rendered[1].tag, Some(StatusTag::Created));
}

#[rstest]
#[case::lost_link("08S01")]
#[case::unable_to_connect("08001")]
#[case::general_warning("01000")]
#[tokio::test]
async fn network_failure_notifies_once_and_keeps_rows(#[case] state: &str) {
    let connection = startup_connection(1, 4).with_query_response(
        "get_repair_list",
        repair_list_result(vec![repair_row(1, None, None), repair_row(2, None, None)]),
    );
    let (driver, notifier, mut app) = start(connection).await;
    app.refresh().await.unwrap();

    driver.connection.fail_with(state);
    let err = app.set_filter(Dimension::Status, "Фикс.").await.unwrap_err();

    assert!(err.is_network());
    assert_eq!(listed(&app), vec![1, 2]);
    assert_eq!(notifier.notices(), vec![Notice::NetworkError]);
}

#[tokio::test]
async fn connect_failure_on_refresh_notifies_once_and_keeps_rows() {
    let connection = startup_connection(1, 4).with_query_response(
        "get_repair_list",
        repair_list_result(vec![repair_row(5, None, None)]),
    );
    let (driver, notifier, mut app) = start(connection).await;
    app.refresh().await.unwrap();

    driver.fail_connect_with("08001");
    assert!(app.refresh().await.is_err());

    assert_eq!(listed(&app), vec![5]);
    assert_eq!(notifier.notices(), vec![Notice::NetworkError]);
}

#[tokio::test]
async fn swallowed_list_error_shows_no_rows() {
    let connection = startup_connection(1, 4).with_query_response(
        "get_repair_list",
        repair_list_result(vec![repair_row(5, None, None)]),
    );
    let (driver, notifier, mut app) = start(connection).await;
    app.refresh().await.unwrap();

    driver.connection.fail_with("42000");
    app.refresh().await.unwrap();

    assert!(app.table().rows().is_empty());
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn filters_resolve_labels_and_clear_to_nulls() {
    let (driver, _notifier, mut app) = start(startup_connection(1, 4)).await;

    app.apply_filters([(Dimension::Region, "Киев"), (Dimension::Manufacturer, "Toyota")])
        .await
        .unwrap();
    let params = driver.connection.params_of("get_repair_list").unwrap();
    assert_eq!(params[1], Value::Int64(5));
    assert_eq!(params[4], Value::Int64(8));
    assert_eq!(params[0], Value::Null);

    app.clear_filters().await.unwrap();
    assert!(app.filters().is_all());
    let lists: Vec<_> = driver
        .connection
        .query_log
        .lock()
        .iter()
        .filter(|(sql, _)| sql.contains("get_repair_list"))
        .map(|(_, params)| params.clone())
        .collect();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1], vec![Value::Null; 7]);
}

#[tokio::test]
async fn unknown_label_selects_everything() {
    let (driver, _notifier, mut app) = start(startup_connection(1, 4)).await;

    app.set_filter(Dimension::Owner, "Нет такого").await.unwrap();
    let params = driver.connection.params_of("get_repair_list").unwrap();
    assert_eq!(params[3], Value::Null);
}

// ============ Sort Tests ============

#[tokio::test]
async fn heading_clicks_toggle_sort_with_nulls_last() {
    let connection = startup_connection(1, 4).with_query_response(
        "get_repair_list",
        repair_list_result(vec![
            repair_row(1, None, Some("B")),
            repair_row(2, Some("Фикс."), None),
            repair_row(3, Some("Созд."), Some("A")),
        ]),
    );
    let (_driver, _notifier, mut app) = start(connection).await;
    app.refresh().await.unwrap();

    let status = RepairColumn::displayed()
        .position(|c| c == RepairColumn::Status)
        .unwrap();

    assert!(app.click(ClickRegion::Heading(status)));
    assert_eq!(listed(&app), vec![3, 2, 1]);
    assert!(app.click(ClickRegion::Heading(status)));
    assert_eq!(listed(&app), vec![2, 3, 1]);
    assert_eq!(app.table().sort_state(), SortState::Descending(RepairColumn::Status));

    assert!(!app.click(ClickRegion::Cell));
    assert_eq!(listed(&app), vec![2, 3, 1]);

    assert!(app.sort_by_heading("Серийный номер"));
    assert_eq!(listed(&app), vec![3, 1, 2]);
    assert!(!app.sort_by_heading("StatusID"));
}

#[tokio::test]
async fn click_before_any_rows_is_ignored() {
    let (_driver, _notifier, mut app) = start(startup_connection(1, 4)).await;
    assert!(!app.click(ClickRegion::Heading(0)));
    assert_eq!(app.table().sort_state(), SortState::Unsorted);
}

// ============ Save Tests ============

#[tokio::test]
async fn create_repair_saves_and_reloads() {
    let connection = form_refs_connection()
        .with_query_response("CREATE_REPAIR", flag_result(1))
        .with_query_response(
            "get_repair_list",
            repair_list_result(vec![repair_row(9, Some("Созд."), Some("SN-100"))]),
        );
    let (driver, notifier, mut app) = start(connection).await;

    let refs = app.load_form_refs().await.unwrap();
    assert_eq!(refs.object_id("Киев", "Склад 1"), Some(10));

    let outcome = app
        .create_repair(&valid_form(), &refs, RepairStatus::Created)
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Saved);
    assert_eq!(notifier.notices(), vec![Notice::Saved]);
    assert_eq!(listed(&app), vec![9]);

    let params = driver.connection.params_of("CREATE_REPAIR").unwrap();
    assert_eq!(params[0], Value::Int64(24));
    assert_eq!(params[2], Value::Int64(10));
    assert_eq!(params[11], Value::Int64(1));
}

#[tokio::test]
async fn rejected_save_is_notified() {
    let connection = form_refs_connection().with_query_response("CREATE_REPAIR", flag_result(0));
    let (driver, notifier, mut app) = start(connection).await;
    let refs = app.load_form_refs().await.unwrap();

    let outcome = app
        .create_repair(&valid_form(), &refs, RepairStatus::Fixed)
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Rejected);
    assert_eq!(notifier.notices(), vec![Notice::SaveFailed]);
    assert!(!driver.connection.called("get_repair_list"));
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let (driver, notifier, mut app) = start(form_refs_connection()).await;
    let refs = app.load_form_refs().await.unwrap();
    let form = RepairForm {
        hours: "много".into(),
        ..valid_form()
    };

    let err = app
        .create_repair(&form, &refs, RepairStatus::Created)
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::Form(_)));
    assert!(matches!(notifier.notices().as_slice(), [Notice::InvalidForm(_)]));
    assert!(!driver.connection.called("CREATE_REPAIR"));
}

#[tokio::test]
async fn copy_repair_prefills_form() {
    let mut snapshot = vec![Value::Null; 15];
    snapshot[0] = Value::String("SN-100".into());
    snapshot[6] = Value::Date(NaiveDate::from_ymd_opt(2019, 11, 20).unwrap());
    snapshot[8] = Value::String("Киев".into());
    snapshot[9] = Value::String("Склад 1".into());
    let columns: Vec<String> = (0..15).map(|i| format!("c{i}")).collect();
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    let connection = form_refs_connection()
        .with_query_response("get_current_repair", mock_query_result(&columns, vec![snapshot]))
        .with_query_response("UPDATE_REPAIR", flag_result(1));
    let (driver, _notifier, mut app) = start(connection).await;

    let form = app.copy_repair(77).await.unwrap();
    assert_eq!(form.serial_number, "SN-100");
    assert_eq!(form.broken_date, "20.11.2019");
    assert_eq!(
        driver.connection.params_of("get_current_repair").unwrap(),
        vec![Value::Int64(77)]
    );

    let refs = app.load_form_refs().await.unwrap();
    let outcome = app
        .update_repair(77, &form, &refs, RepairStatus::Fixed)
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Saved);
    let params = driver.connection.params_of("UPDATE_REPAIR").unwrap();
    assert_eq!(params[1], Value::Int64(77));
    assert_eq!(params[12], Value::Int64(2));
}

#[tokio::test]
async fn copy_of_missing_repair_is_notified() {
    let (_driver, notifier, app) = start(startup_connection(1, 4)).await;

    let err = app.copy_repair(404).await.unwrap_err();
    assert!(matches!(err, ActionError::RepairNotFound(404)));
    assert_eq!(notifier.notices(), vec![Notice::RepairNotFound(404)]);
}

#[tokio::test]
async fn lookup_binding_without_rows_is_notified() {
    let (_driver, notifier, app) = start(startup_connection(1, 4)).await;
    let date = NaiveDate::from_ymd_opt(2019, 11, 20).unwrap();

    let binding = app.lookup_binding("SN-100", date).await.unwrap();
    assert_eq!(binding, None);
    assert_eq!(notifier.notices(), vec![Notice::NoObjectBinding]);
}

#[tokio::test]
async fn move_technics_network_error() {
    let (driver, notifier, mut app) = start(startup_connection(1, 4)).await;
    driver.connection.fail_with("08S01");

    let err = app
        .move_technics(MovementRequest {
            technics_id: Some(3),
            serial_number: "SN-100".into(),
            object_id: 10,
            date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ActionError::Data(DataAccessError::Network { .. })));
    assert_eq!(notifier.notices(), vec![Notice::NetworkError]);
}

#[tokio::test]
async fn save_stands_when_reload_fails() {
    let connection = form_refs_connection()
        .with_query_response("CREATE_REPAIR", flag_result(1))
        .with_query_failure("get_repair_list", "08S01");
    let (driver, notifier, mut app) = start(connection).await;
    let refs = app.load_form_refs().await.unwrap();

    let outcome = app
        .create_repair(&valid_form(), &refs, RepairStatus::Created)
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Saved);
    assert!(driver.connection.called("get_repair_list"));
    assert_eq!(notifier.notices(), vec![Notice::Saved, Notice::NetworkError]);
}
