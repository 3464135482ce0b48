//! `eventslot expand`: load an event file, expand it and print its slots.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use eventslot_store::{MemoryStore, SlotService};
use tracing::debug;

use crate::cli::ExpandArgs;
use crate::config::{ClientConfig, OutputFormat};
use crate::error::{ClientError, ClientResult};
use crate::event_file::EventFile;
use crate::render::{RenderOptions, render};

/// Expansion settings after merging flags over configuration.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    pub render: RenderOptions,
    pub limit: Option<usize>,
    /// Inclusive date range, read in the display zone (UTC if unset).
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl ExpandOptions {
    /// Resolves flags against the configuration.
    pub fn resolve(args: &ExpandArgs, config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let format = if args.json {
            OutputFormat::Json
        } else {
            config.display.format
        };
        let zone = match args.zone {
            Some(zone) => Some(zone),
            None => config.display.zone()?,
        };
        let range = args.from.zip(args.to);
        if let Some((from, to)) = range {
            if to < from {
                return Err(ClientError::config(format!(
                    "--to {to} is before --from {from}"
                )));
            }
        }

        Ok(Self {
            render: RenderOptions {
                format,
                zone,
                date_format: config.display.date_format.clone(),
            },
            limit: args.limit.or(config.display.limit),
            range,
        })
    }
}

/// Expands the event in `path` and returns the rendered output.
pub async fn expand(path: &Path, options: &ExpandOptions) -> ClientResult<String> {
    let event = EventFile::load(path)?.into_event(path)?;
    debug!(event_id = %event.id, path = %path.display(), "loaded event");

    let service = SlotService::new(Arc::new(MemoryStore::new()));
    let created = service.create(&event).await?;

    let mut slots = match options.range {
        None => created,
        Some((from, to)) => {
            let zone = options.render.zone.unwrap_or(Tz::UTC);
            let end = to
                .succ_opt()
                .ok_or_else(|| ClientError::config(format!("--to {to} is out of range")))?;
            service
                .slots_between(
                    from.and_time(NaiveTime::MIN),
                    zone,
                    end.and_time(NaiveTime::MIN),
                    zone,
                )
                .await?
        }
    };

    let total = slots.len();
    if let Some(limit) = options.limit {
        slots.truncate(limit);
    }
    render(&event, &slots, total, &options.render)
}

/// Runs `eventslot expand`.
pub async fn run(args: &ExpandArgs, config: &ClientConfig) -> ClientResult<()> {
    let options = ExpandOptions::resolve(args, config)?;
    let output = expand(&args.event_file, &options).await?;
    println!("{output}");
    Ok(())
}
