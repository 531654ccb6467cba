use std::io::Write;

use clap::Parser;
use donorlink::domain::Marker;
use tracing::instrument;

use super::{
    render::{self, OutputFormat, PinRow, ShelterRow},
    shell::Session,
    terminal::Colorize,
};

/// Command arguments for `map`.
///
/// Prints one entry per shelter with active needs: the data a map widget
/// would plot, with a marker emphasis and a popup listing.
#[derive(Debug, Parser)]
pub struct Map {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Map {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let store = &session.store;
        let pins = store.map_feed();

        if self.output == OutputFormat::Json {
            let rows: Vec<_> = pins.iter().map(|pin| PinRow::new(store, pin)).collect();
            return render::json(out, &rows);
        }

        if pins.is_empty() {
            writeln!(out, "{}", "No shelters currently need donations.".dim())?;
            return Ok(());
        }

        for pin in &pins {
            let marker = format!("[{}]", render::marker_label(pin.marker));
            let marker = match pin.marker {
                Marker::HighUrgency => marker.danger(),
                Marker::Standard => marker.info(),
            };

            writeln!(out, "{} {marker}", pin.shelter.name().strong())?;
            writeln!(
                out,
                "  {}  ({})",
                pin.shelter.address(),
                pin.shelter.coordinate()
            )?;
            for need in &pin.needs {
                writeln!(
                    out,
                    "  - {:<6} {} ({} needed)  {}",
                    need.urgency().label(),
                    need.name(),
                    need.quantity(),
                    need.id().as_str().dim()
                )?;
            }
            writeln!(out, "  {}", pin.shelter.directions_url().dim())?;
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Command arguments for `shelters`.
#[derive(Debug, Parser)]
pub struct Shelters {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Shelters {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let shelters = session.store.shelters();

        match self.output {
            OutputFormat::Json => {
                let rows: Vec<_> = shelters.iter().map(ShelterRow::from).collect();
                render::json(out, &rows)
            }
            OutputFormat::Table => {
                if shelters.is_empty() {
                    writeln!(out, "{}", "No shelters have signed up yet.".dim())?;
                    return Ok(());
                }
                let rows: Vec<_> = shelters
                    .iter()
                    .map(|shelter| {
                        vec![
                            shelter.id().to_string(),
                            shelter.name().to_string(),
                            shelter.address(),
                            shelter.phone().to_string(),
                            shelter.email().to_string(),
                        ]
                    })
                    .collect();
                render::table(out, &["ID", "Name", "Address", "Phone", "Email"], &rows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use donorlink::{ShelterId, session::DemoAuthenticator};

    use crate::cli::shell::tests::{execute, session};

    #[test]
    fn map_pins_every_shelter_with_active_needs() {
        let mut session = session();
        let output = execute(&mut session, &["map --output json"]);
        let pins: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();

        let shelters: Vec<_> = pins.iter().map(|pin| pin["shelter"]["id"].clone()).collect();
        assert_eq!(shelters, ["shelter-1", "shelter-2", "shelter-3", "shelter-4"]);
        assert!(pins.iter().all(|pin| {
            pin["needs"]
                .as_array()
                .unwrap()
                .iter()
                .all(|need| need["status"] == "Active")
        }));
    }

    #[test]
    fn marker_reflects_high_urgency() {
        let mut session = session();
        let output = execute(&mut session, &["map --output json"]);
        let pins: Vec<serde_json::Value> = serde_json::from_str(&output).unwrap();

        let markers: Vec<_> = pins.iter().map(|pin| pin["marker"].clone()).collect();
        assert_eq!(
            markers,
            ["high-urgency", "high-urgency", "standard", "high-urgency"]
        );
    }

    #[test]
    fn shelter_without_active_needs_is_not_pinned() {
        let mut session = session();
        session.authenticator = Box::new(DemoAuthenticator::new(Some(ShelterId::new("shelter-3"))));
        execute(
            &mut session,
            &["login info@ballardwarming.org pw", "delete need-5"],
        );
        let output = execute(&mut session, &["map"]);
        assert!(!output.contains("Ballard Warming House"));
        assert!(output.contains("Hope Harbor Shelter"));
    }

    #[test]
    fn shelters_lists_contact_details() {
        let mut session = session();
        let output = execute(&mut session, &["shelters"]);
        assert!(output.contains("1510 Rainier Ave S, Seattle, WA"));
        assert!(output.contains("help@northgatefamily.org"));
    }
}
