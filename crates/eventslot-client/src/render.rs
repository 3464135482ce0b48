//! Output rendering for expanded slots.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use eventslot_core::time::from_utc;
use eventslot_core::{Event, SlotSpan};
use eventslot_store::StoredSlot;
use serde::Serialize;
use uuid::Uuid;

use crate::config::{OutputFormat, check_date_format};
use crate::error::ClientResult;

const DAY_FORMAT: &str = "%a %Y-%m-%d";
const JSON_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Rendering choices resolved from flags and configuration.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Zone timed slots are shown in; each slot's own zone when `None`.
    pub zone: Option<Tz>,
    pub date_format: String,
}

/// One slot, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub id: Uuid,
    pub title: String,
    pub all_day: bool,
    /// Local start in [`zone`](Self::zone), or the date for day slots.
    pub start: String,
    pub end: String,
    /// Zone the local times are in; absent for day slots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_utc: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl SlotView {
    pub fn new(stored: &StoredSlot, zone: Option<Tz>, date_format: &str) -> Self {
        let slot = &stored.slot;
        let (all_day, start, end, zone, start_utc) = match slot.span {
            SlotSpan::Day { start, end } => (
                true,
                start.format(DAY_FORMAT).to_string(),
                end.format(DAY_FORMAT).to_string(),
                None,
                None,
            ),
            SlotSpan::Timed {
                start,
                start_zone,
                end,
                end_zone,
            } => {
                // a display zone applies to both ends
                let (start_zone, end_zone) = zone
                    .map(|z| (z, z))
                    .unwrap_or((start_zone, end_zone));
                let label = if start_zone == end_zone {
                    start_zone.name().to_string()
                } else {
                    format!("{} -> {}", start_zone.name(), end_zone.name())
                };
                (
                    false,
                    local(start, start_zone, date_format),
                    local(end, end_zone, date_format),
                    Some(label),
                    Some(start),
                )
            }
        };

        Self {
            id: stored.id,
            title: slot.details.title.clone(),
            all_day,
            start,
            end,
            zone,
            start_utc,
            location: slot.details.location.clone(),
        }
    }
}

fn local(instant: DateTime<Utc>, zone: Tz, format: &str) -> String {
    let wall: NaiveDateTime = from_utc(instant, zone);
    wall.format(format).to_string()
}

/// JSON document printed by `eventslot expand --json`.
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionReport {
    pub event_id: Uuid,
    pub title: String,
    pub frequency: String,
    /// Slots produced before any limit was applied.
    pub total: usize,
    pub slots: Vec<SlotView>,
}

/// Renders `slots` of `event` in the requested format.
///
/// `total` is the number of slots before truncation, reported when it
/// differs from what is shown.
pub fn render(
    event: &Event,
    slots: &[StoredSlot],
    total: usize,
    options: &RenderOptions,
) -> ClientResult<String> {
    match options.format {
        OutputFormat::Table => {
            check_date_format(&options.date_format)?;
            Ok(table(event, slots, total, options))
        }
        OutputFormat::Json => {
            let report = ExpansionReport {
                event_id: event.id,
                title: event.details.title.clone(),
                frequency: event.rule.frequency().to_string(),
                total,
                slots: views(slots, options, JSON_FORMAT),
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}

fn views(slots: &[StoredSlot], options: &RenderOptions, date_format: &str) -> Vec<SlotView> {
    slots
        .iter()
        .map(|stored| SlotView::new(stored, options.zone, date_format))
        .collect()
}

fn table(event: &Event, slots: &[StoredSlot], total: usize, options: &RenderOptions) -> String {
    let views = views(slots, options, &options.date_format);
    if views.is_empty() {
        return format!("{}: no slots", event.details.title);
    }

    let start_width = column_width("START", views.iter().map(|v| v.start.as_str()));
    let end_width = column_width("END", views.iter().map(|v| v.end.as_str()));
    let zone_width = column_width(
        "ZONE",
        views.iter().map(|v| v.zone.as_deref().unwrap_or("all day")),
    );
    let index_width = views.len().to_string().len().max(1);

    let mut lines = Vec::with_capacity(views.len() + 2);
    lines.push(format!(
        "{:>index_width$}  {:<start_width$}  {:<end_width$}  {:<zone_width$}  TITLE",
        "#", "START", "END", "ZONE",
    ));
    for (i, view) in views.iter().enumerate() {
        lines.push(format!(
            "{:>index_width$}  {:<start_width$}  {:<end_width$}  {:<zone_width$}  {}",
            i + 1,
            view.start,
            view.end,
            view.zone.as_deref().unwrap_or("all day"),
            view.title,
        ));
    }
    if total > views.len() {
        lines.push(format!("... {} of {total} slots shown", views.len()));
    }
    lines.join("\n")
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(str::len).chain([header.len()]).max().unwrap_or(0)
}
