//! `repairs` - command-line front end for the technics repairs client

mod args;
mod hints;
mod logging;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use repairs_core::{AppConfig, ClientVersion, ConnectionConfig};
use repairs_driver_mssql::MssqlDriver;
use repairs_services::{
    ActionError, DataAccessError, FormReferences, MovementRequest, Notice, Notifier, RepairApp,
    RepairForm, SaveOutcome, Session, StartupError, parse_form_date,
};

use crate::args::{Cli, Command, ListArgs, MoveArgs, SaveArgs};
use crate::output::TerminalNotifier;

type App = RepairApp<TerminalNotifier>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging_config = if cli.verbose {
        logging::LoggingConfig::verbose()
    } else {
        logging::LoggingConfig::production()
    };
    // Held until exit so the file writer gets flushed
    let _log_guard = match logging::init(logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("FATAL: Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to build runtime");
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "command failed");
            if !already_notified(&err) {
                eprintln!("error: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

/// Errors raised by `RepairApp` have been shown through the notifier
fn already_notified(err: &anyhow::Error) -> bool {
    err.is::<StartupError>() || err.is::<ActionError>() || err.is::<DataAccessError>()
}

fn client_version() -> anyhow::Result<ClientVersion> {
    ClientVersion::parse(env!("CARGO_PKG_VERSION"))
        .context("package version is not major.minor.patch")
}

fn open_session(cli: &Cli) -> anyhow::Result<Session> {
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("cannot use configuration {}", cli.config.display()))?;
    let session = Session::new(
        Arc::new(MssqlDriver::new()),
        ConnectionConfig::from_app_config(&config),
    );
    tracing::info!(target_db = %session.describe(), "configuration loaded");
    Ok(session)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Command::About => {
            about(&cli);
            return Ok(());
        }
        Command::Check => return check(open_session(&cli)?).await,
        _ => {}
    }

    let session = open_session(&cli)?;
    let mut app = RepairApp::start(session, TerminalNotifier, client_version()?).await?;

    match cli.command {
        Command::List(list) => list_repairs(&mut app, list).await,
        Command::Create(save) => save_new(&mut app, RepairForm::default(), &save).await,
        Command::Copy { id, save } => {
            let form = app.copy_repair(id).await?;
            save_new(&mut app, form, &save).await
        }
        Command::Update { id, save } => update(&mut app, id, &save).await,
        Command::Move(movement) => move_technics(&mut app, movement).await,
        Command::Check | Command::About => Ok(()),
    }
}

fn about(cli: &Cli) {
    println!("repairs {}", env!("CARGO_PKG_VERSION"));
    println!("configuration: {}", cli.config.display());
    println!("logs:          {}", logging::log_directory().display());
}

async fn check(session: Session) -> anyhow::Result<()> {
    let answered = session
        .ping()
        .await
        .inspect_err(|err| TerminalNotifier.notify(Notice::from(err)))?;
    if answered {
        println!("{}: OK", session.describe());
        Ok(())
    } else {
        bail!("{} answered unexpectedly", session.describe())
    }
}

async fn list_repairs(app: &mut App, list: ListArgs) -> anyhow::Result<()> {
    app.apply_filters(list.filters.labels()).await?;
    for heading in &list.sort {
        if !app.sort_by_heading(heading) {
            tracing::warn!(heading = %heading, "heading not sortable");
        }
    }
    output::print_repairs(app.table());
    Ok(())
}

/// Fill region and store from the equipment binding on the broken date
async fn complete_binding(app: &App, form: &mut RepairForm) -> anyhow::Result<()> {
    if !SaveArgs::needs_binding(form) {
        return Ok(());
    }
    let Some(date) = parse_form_date(&form.broken_date) else {
        return Ok(());
    };
    if let Some(binding) = app.lookup_binding(form.serial_number.trim(), date).await? {
        tracing::debug!(region = ?binding.region, store = ?binding.store, "binding applied");
        form.apply_binding(&binding);
    }
    Ok(())
}

/// Print suggestions for form values the server does not know
fn print_hints(refs: &FormReferences, form: &RepairForm) {
    for hint in hints::form_hints(refs, form) {
        eprintln!("hint: {}", hint);
    }
}

async fn save_new(app: &mut App, mut form: RepairForm, save: &SaveArgs) -> anyhow::Result<()> {
    save.apply(&mut form);
    complete_binding(app, &mut form).await?;
    let refs = app.load_form_refs().await?;
    print_hints(&refs, &form);
    let outcome = app.create_repair(&form, &refs, save.status.into()).await?;
    saved(outcome)
}

async fn update(app: &mut App, id: i64, save: &SaveArgs) -> anyhow::Result<()> {
    let mut form = app.copy_repair(id).await?;
    save.apply(&mut form);
    complete_binding(app, &mut form).await?;
    let refs = app.load_form_refs().await?;
    print_hints(&refs, &form);
    let outcome = app.update_repair(id, &form, &refs, save.status.into()).await?;
    saved(outcome)
}

async fn move_technics(app: &mut App, movement: MoveArgs) -> anyhow::Result<()> {
    let date = parse_form_date(&movement.date)
        .with_context(|| format!("invalid movement date {:?}", movement.date))?;
    let refs = app.load_form_refs().await?;
    let object_id = refs
        .object_id(&movement.region, &movement.store)
        .with_context(|| {
            format!(
                "no object {} / {} ({})",
                movement.region,
                movement.store,
                hints::object_hint(&refs, &movement.region)
            )
        })?;

    let outcome = app
        .move_technics(MovementRequest {
            technics_id: movement.technics_id,
            serial_number: movement.sn,
            object_id,
            date,
        })
        .await?;
    saved(outcome)
}

fn saved(outcome: SaveOutcome) -> anyhow::Result<()> {
    match outcome {
        SaveOutcome::Saved => Ok(()),
        SaveOutcome::Rejected => bail!("the server rejected the changes"),
    }
}
