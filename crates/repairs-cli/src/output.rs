//! Terminal rendering: the repair table and notices

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use repairs_services::{
    Notice, Notifier, RenderedRow, RepairColumn, RepairTable, SortState, StatusTag,
};

/// Prints notices on stderr and mirrors them into the log
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(title = notice.title(), %notice, "notice");
        } else {
            tracing::info!(title = notice.title(), %notice, "notice");
        }
        eprintln!("{}: {}", notice.title(), notice);
    }
}

/// Row background for a status tag
pub fn tag_color(tag: StatusTag) -> Color {
    match tag {
        StatusTag::Created => Color::Rgb { r: 0xff, g: 0xff, b: 0xc8 },
        StatusTag::Fixed => Color::Rgb { r: 0x90, g: 0xee, b: 0x90 },
        StatusTag::Deleted => Color::Rgb { r: 0xf6, g: 0x6e, b: 0x6e },
    }
}

/// Displayed headings, the sorted one marked with its direction
pub fn headings(sort: SortState) -> Vec<String> {
    RepairColumn::displayed()
        .map(|column| {
            let marker = match sort {
                SortState::Ascending(c) if c == column => " ▲",
                SortState::Descending(c) if c == column => " ▼",
                _ => "",
            };
            format!("{}{}", column.heading(), marker)
        })
        .collect()
}

/// Build the full table for `rows`; every call redraws from scratch
pub fn repair_table(rows: &[RenderedRow], sort: SortState) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headings(sort)
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    for row in rows {
        let cells = row.cells.iter().map(|text| {
            let cell = Cell::new(text);
            match row.tag {
                Some(tag) => cell.bg(tag_color(tag)).fg(Color::Black),
                None => cell,
            }
        });
        table.add_row(cells);
    }
    table
}

pub fn print_repairs(table: &RepairTable) {
    let rows = table.render();
    println!("{}", repair_table(&rows, table.sort_state()));
    println!("{} repairs", rows.len());
}
