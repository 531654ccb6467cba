use std::io::Write;

use clap::Parser;
use donorlink::NeedId;
use tracing::instrument;

use super::{parse_quantity, shell::Session, terminal::Colorize};

/// Command arguments for `pledge`.
///
/// Pledging moves the need to pending until the shelter confirms the items
/// have arrived.
#[derive(Debug, Parser)]
pub struct Pledge {
    /// The need to donate to
    need: NeedId,

    /// Number of units you will donate
    #[arg(value_parser = parse_quantity, allow_hyphen_values = true)]
    quantity: u32,
}

impl Pledge {
    #[instrument(level = "debug", skip(session, out))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let receipt = session.store.pledge(&self.need, self.quantity)?;
        let shelter = &receipt.shelter;

        writeln!(out, "{}", receipt.acknowledgement.to_string().success())?;
        writeln!(out)?;
        writeln!(
            out,
            "Please deliver {} x {} to:",
            receipt.donated,
            receipt.need.name()
        )?;
        writeln!(out, "  {}", shelter.name().strong())?;
        writeln!(out, "  {}", shelter.address())?;
        writeln!(out, "  {}  {}", shelter.phone(), shelter.email())?;
        writeln!(out, "  {}", shelter.directions_url().info())?;
        Ok(())
    }
}
