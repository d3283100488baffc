//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use repairs_core::CONFIG_FILE_NAME;
use repairs_services::{Dimension, RepairForm, RepairStatus};

#[derive(Parser, Debug)]
#[command(name = "repairs")]
#[command(author, version, about = "Technics repairs client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME, env = "REPAIRS_CONFIG")]
    pub config: PathBuf,

    /// Print log output on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List repairs matching the filters
    List(ListArgs),
    /// Register a new repair
    Create(SaveArgs),
    /// Register a new repair pre-filled from an existing one
    Copy {
        /// Repair to copy
        id: i64,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Change an existing repair
    Update {
        /// Repair to change
        id: i64,
        #[command(flatten)]
        save: SaveArgs,
    },
    /// Move equipment to another object
    Move(MoveArgs),
    /// Check that the server answers
    Check,
    /// Show version and file locations
    About,
}

/// Filter labels; an omitted or "Все" label selects everything
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long, value_name = "LABEL")]
    pub created_by: Option<String>,
    #[arg(long, value_name = "LABEL")]
    pub region: Option<String>,
    #[arg(long, value_name = "LABEL")]
    pub store: Option<String>,
    #[arg(long, value_name = "LABEL")]
    pub owner: Option<String>,
    #[arg(long, value_name = "LABEL")]
    pub mfr: Option<String>,
    #[arg(long, value_name = "LABEL")]
    pub tech_type: Option<String>,
    #[arg(long, value_name = "LABEL")]
    pub status: Option<String>,
}

impl FilterArgs {
    /// Given labels paired with their dimension
    pub fn labels(&self) -> Vec<(Dimension, &str)> {
        [
            (Dimension::CreatedBy, &self.created_by),
            (Dimension::Region, &self.region),
            (Dimension::Store, &self.store),
            (Dimension::Owner, &self.owner),
            (Dimension::Manufacturer, &self.mfr),
            (Dimension::EquipmentType, &self.tech_type),
            (Dimension::Status, &self.status),
        ]
        .into_iter()
        .filter_map(|(dimension, label)| label.as_deref().map(|l| (dimension, l)))
        .collect()
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filters: FilterArgs,

    /// Click the heading with this name; repeat to click several times
    #[arg(long, value_name = "HEADING")]
    pub sort: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusArg {
    #[default]
    Created,
    Fixed,
}

impl From<StatusArg> for RepairStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Created => RepairStatus::Created,
            StatusArg::Fixed => RepairStatus::Fixed,
        }
    }
}

/// Repair form fields; only the given ones override the pre-filled form
#[derive(Args, Debug, Default)]
pub struct SaveArgs {
    #[arg(long)]
    pub sn: Option<String>,
    /// Date the equipment broke (dd.mm.yy or dd.mm.yyyy)
    #[arg(long, value_name = "DATE")]
    pub broken: Option<String>,
    /// Date the repair was finished
    #[arg(long, value_name = "DATE")]
    pub finished: Option<String>,
    #[arg(long)]
    pub work_order: Option<String>,
    #[arg(long)]
    pub hours: Option<String>,
    #[arg(long)]
    pub units: Option<String>,
    /// Unit of measure label
    #[arg(long)]
    pub unit: Option<String>,
    /// Region; looked up from the equipment binding when omitted
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub store: Option<String>,
    #[arg(long)]
    pub fault: Option<String>,
    #[arg(long)]
    pub work: Option<String>,
    #[arg(long, value_enum, default_value_t)]
    pub status: StatusArg,
}

impl SaveArgs {
    /// Overlay the given fields onto `form`
    pub fn apply(&self, form: &mut RepairForm) {
        fn set(field: &mut String, value: &Option<String>) {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
        set(&mut form.serial_number, &self.sn);
        set(&mut form.broken_date, &self.broken);
        set(&mut form.work_order, &self.work_order);
        set(&mut form.hours, &self.hours);
        set(&mut form.unit_count, &self.units);
        set(&mut form.unit_of_measure, &self.unit);
        set(&mut form.region, &self.region);
        set(&mut form.store, &self.store);
        set(&mut form.fault_description, &self.fault);
        set(&mut form.performed_work, &self.work);
        if let Some(finished) = &self.finished {
            form.finished_date = Some(finished.clone()).filter(|d| !d.trim().is_empty());
        }
    }

    /// Whether region and store still have to come from the binding
    pub fn needs_binding(form: &RepairForm) -> bool {
        form.region.trim().is_empty() || form.store.trim().is_empty()
    }
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    #[arg(long)]
    pub sn: String,
    /// Technics ID when the server knows it
    #[arg(long)]
    pub technics_id: Option<i64>,
    /// Destination region
    #[arg(long)]
    pub region: String,
    /// Destination store
    #[arg(long)]
    pub store: String,
    /// Movement date (dd.mm.yy or dd.mm.yyyy)
    #[arg(long, value_name = "DATE")]
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_collects_filters_and_sorts() {
        let cli = Cli::try_parse_from([
            "repairs", "list", "--region", "Киев", "--status", "Фикс.", "--sort", "Статус",
            "--sort", "Статус",
        ])
        .unwrap();
        let Command::List(list) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(
            list.filters.labels(),
            vec![(Dimension::Region, "Киев"), (Dimension::Status, "Фикс.")]
        );
        assert_eq!(list.sort, vec!["Статус", "Статус"]);
        assert_eq!(cli.config, PathBuf::from("config.ini"));
    }

    #[rstest]
    #[case(&["repairs", "check"])]
    #[case(&["repairs", "about", "--config", "other.ini"])]
    #[case(&["repairs", "copy", "12", "--hours", "10"])]
    #[case(&["repairs", "move", "--sn", "A1", "--region", "Киев", "--store", "Склад 1", "--date", "01.02.20"])]
    fn test_commands_parse(#[case] argv: &[&str]) {
        assert!(Cli::try_parse_from(argv).is_ok());
    }

    #[test]
    fn test_save_args_override_only_given_fields() {
        let mut form = RepairForm {
            serial_number: "SN-1".into(),
            region: "Киев".into(),
            finished_date: Some("01.01.20".into()),
            ..RepairForm::default()
        };
        let args = SaveArgs {
            hours: Some("12,5".into()),
            finished: Some(String::new()),
            ..SaveArgs::default()
        };
        args.apply(&mut form);

        assert_eq!(form.serial_number, "SN-1");
        assert_eq!(form.hours, "12,5");
        assert_eq!(form.finished_date, None);
        assert!(SaveArgs::needs_binding(&form));
    }

    #[test]
    fn test_status_defaults_to_created() {
        let cli = Cli::try_parse_from(["repairs", "create", "--sn", "A1"]).unwrap();
        let Command::Create(save) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(RepairStatus::from(save.status), RepairStatus::Created);
    }
}
