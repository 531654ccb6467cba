use std::io::Write;

use clap::Parser;

use super::{
    render::{self, OutputFormat},
    shell::Session,
    terminal::Colorize,
};

/// Command arguments for `impact`.
///
/// Totals cover needs the shelters have confirmed as fulfilled.
#[derive(Debug, Parser)]
pub struct Impact {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Impact {
    pub fn run(self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let impact = session.store.impact();

        if self.output == OutputFormat::Json {
            return render::json(out, &impact);
        }

        writeln!(out, "{}", "Community impact".strong())?;
        for (label, value) in [
            ("Meals shared", impact.meals_shared.to_string()),
            ("Shelters served", impact.shelters_served.to_string()),
            ("Items donated", impact.items_donated.to_string()),
            ("Donors connected", impact.donors_connected.to_string()),
        ] {
            writeln!(out, "  {label:<18}{}", value.success())?;
        }
        Ok(())
    }
}
