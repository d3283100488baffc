//! Suggestions printed next to a rejected form
//!
//! The CLI has no drop-down lists, so when a typed value does not match the
//! server lookups the known values are listed instead.

use repairs_services::{FormReferences, RepairForm};

const MAX_SUGGESTIONS: usize = 10;

/// Hints for every form field whose value is not in `refs`
pub fn form_hints(refs: &FormReferences, form: &RepairForm) -> Vec<String> {
    let mut hints = Vec::new();

    let serial_number = form.serial_number.trim();
    if !serial_number.is_empty() && refs.technics(serial_number).is_none() {
        let like = refs.serial_numbers_like(serial_number);
        hints.push(if like.is_empty() {
            format!("no equipment with serial number {}", serial_number)
        } else {
            format!(
                "serial numbers starting with {}: {}",
                serial_number,
                listing(like.into_iter())
            )
        });
    }

    let (region, store) = (form.region.trim(), form.store.trim());
    if !region.is_empty() && !store.is_empty() && refs.object_id(region, store).is_none() {
        hints.push(object_hint(refs, region));
    }

    let unit = form.unit_of_measure.trim();
    if !unit.is_empty() && refs.measure_unit_id(unit).is_none() {
        hints.push(format!(
            "units of measure: {}",
            listing(refs.measure_units().labels())
        ));
    }

    hints
}

/// Known stores of `region`, or the known regions when it has none
pub fn object_hint(refs: &FormReferences, region: &str) -> String {
    let stores = refs.stores(region);
    if stores.is_empty() {
        format!("regions: {}", listing(refs.regions().into_iter()))
    } else {
        format!("stores in {}: {}", region, listing(stores.into_iter()))
    }
}

fn listing<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let values: Vec<&str> = values.collect();
    let mut text = values
        .iter()
        .take(MAX_SUGGESTIONS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if values.len() > MAX_SUGGESTIONS {
        text.push_str(&format!(" (+{} more)", values.len() - MAX_SUGGESTIONS));
    }
    text
}
