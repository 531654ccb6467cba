use std::io::Write;

use clap::Parser;
use donorlink::{
    ItemType, Urgency,
    domain::{Filter, Query, SortKey},
};
use tracing::instrument;

use super::{
    render::{self, OutputFormat},
    shell::Session,
    terminal::Colorize,
};

/// Command arguments for `browse`.
///
/// Only active needs are ever listed; pending and fulfilled needs are the
/// shelters' business.
#[derive(Debug, Parser)]
pub struct Browse {
    /// Case-insensitive text to look for in the name, description or category
    #[arg(short, long)]
    search: Option<String>,

    /// Category to show (food, clothing, hygiene, blankets, other or all)
    #[arg(short, long, default_value_t = Filter::All)]
    category: Filter<ItemType>,

    /// Urgency to show (low, medium, high or all)
    #[arg(short, long, default_value_t = Filter::All)]
    urgency: Filter<Urgency>,

    /// Sort order (urgency or distance)
    #[arg(long, default_value_t)]
    sort: SortKey,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Browse {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let query = Query::new()
            .search(self.search.as_deref().unwrap_or_default())
            .category(self.category)
            .urgency(self.urgency)
            .sort(self.sort);

        let store = &session.store;
        let selection = store.browse(&query);

        match self.output {
            OutputFormat::Json => render::json(out, &render::need_rows(store, selection.iter())),
            OutputFormat::Table => {
                if selection.is_empty() {
                    writeln!(out, "{}", "No needs match your filters.".dim())?;
                    return Ok(());
                }
                render::needs_table(out, store, selection.iter())?;
                let count = selection.len();
                let noun = if count == 1 { "need" } else { "needs" };
                writeln!(out, "{}", format!("{count} {noun} open to donors").dim())?;
                Ok(())
            }
        }
    }
}

/// Command arguments for `recent`.
#[derive(Debug, Parser)]
pub struct Recent {
    /// How many needs to show (default: from configuration)
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Recent {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let limit = self.limit.unwrap_or(session.config.recent_limit);
        let store = &session.store;

        match self.output {
            OutputFormat::Json => render::json(out, &render::need_rows(store, store.recent(limit))),
            OutputFormat::Table => {
                let mut recent = store.recent(limit).peekable();
                if recent.peek().is_none() {
                    writeln!(out, "{}", "No needs have been posted yet.".dim())?;
                    return Ok(());
                }
                render::needs_table(out, store, recent)
            }
        }
    }
}
