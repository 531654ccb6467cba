//! Table and JSON rendering shared by the listing commands.

use std::{fmt, io::Write};

use anyhow::Context;
use clap::ValueEnum;
use donorlink::{
    Need, Shelter, Store,
    domain::{MapPin, Marker},
};
use serde::Serialize;

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
        })
    }
}

/// Writes rows as space-aligned columns under a ruled header.
pub fn table(out: &mut dyn Write, headers: &[&str], rows: &[Vec<String>]) -> anyhow::Result<()> {
    let widths = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .map(|row| row.get(idx).map_or(0, |value| value.chars().count()))
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect::<Vec<_>>();

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(headers.iter().map(ToString::to_string).collect()))?;
    writeln!(
        out,
        "{}",
        line(widths.iter().map(|&width| "-".repeat(width)).collect())
    )?;
    for row in rows {
        writeln!(out, "{}", line(row.clone()))?;
    }
    Ok(())
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to render json output")?;
    writeln!(out)?;
    Ok(())
}

/// Writes the donor-facing listing of needs.
///
/// On narrow terminals the category and shelter columns are dropped.
pub fn needs_table<'a>(
    out: &mut dyn Write,
    store: &Store,
    needs: impl Iterator<Item = &'a Need>,
) -> anyhow::Result<()> {
    let narrow = super::terminal::is_narrow();

    let rows = needs
        .map(|need| {
            let mut row = vec![need.id().to_string(), need.name().to_string()];
            if !narrow {
                row.push(need.item_type().to_string());
            }
            row.push(need.urgency().to_string());
            row.push(need.quantity().to_string());
            if !narrow {
                row.push(shelter_name(store, need));
            }
            row
        })
        .collect::<Vec<_>>();

    let headers: &[&str] = if narrow {
        &["ID", "Item", "Urgency", "Needed"]
    } else {
        &["ID", "Item", "Category", "Urgency", "Needed", "Shelter"]
    };
    table(out, headers, &rows)
}

fn shelter_name(store: &Store, need: &Need) -> String {
    store
        .shelter(need.shelter_id())
        .map_or_else(|| need.shelter_id().to_string(), |shelter| shelter.name().to_string())
}

/// A need as rendered in JSON output.
#[derive(Debug, Serialize)]
pub struct NeedRow<'a> {
    id: &'a str,
    shelter_id: &'a str,
    shelter: String,
    category: &'static str,
    name: &'a str,
    description: &'a str,
    urgency: &'static str,
    status: &'static str,
    quantity: u32,
    original_quantity: u32,
    progress: String,
    posted: String,
}

impl<'a> NeedRow<'a> {
    pub fn new(store: &Store, need: &'a Need) -> Self {
        Self {
            id: need.id().as_str(),
            shelter_id: need.shelter_id().as_str(),
            shelter: shelter_name(store, need),
            category: need.item_type().label(),
            name: need.name(),
            description: need.description(),
            urgency: need.urgency().label(),
            status: need.status().label(),
            quantity: need.quantity(),
            original_quantity: need.original_quantity(),
            progress: need.progress().to_string(),
            posted: need.posted().to_rfc3339(),
        }
    }
}

/// Renders each need for JSON output.
pub fn need_rows<'a>(store: &Store, needs: impl Iterator<Item = &'a Need>) -> Vec<NeedRow<'a>> {
    needs.map(|need| NeedRow::new(store, need)).collect()
}

/// A shelter as rendered in JSON output.
#[derive(Debug, Serialize)]
pub struct ShelterRow<'a> {
    id: &'a str,
    name: &'a str,
    address: String,
    email: &'a str,
    phone: &'a str,
    latitude: f64,
    longitude: f64,
    directions: String,
}

impl<'a> From<&'a Shelter> for ShelterRow<'a> {
    fn from(shelter: &'a Shelter) -> Self {
        Self {
            id: shelter.id().as_str(),
            name: shelter.name(),
            address: shelter.address(),
            email: shelter.email(),
            phone: shelter.phone(),
            latitude: shelter.coordinate().latitude,
            longitude: shelter.coordinate().longitude,
            directions: shelter.directions_url(),
        }
    }
}

/// A map pin as rendered in JSON output.
#[derive(Debug, Serialize)]
pub struct PinRow<'a> {
    shelter: ShelterRow<'a>,
    marker: &'static str,
    needs: Vec<NeedRow<'a>>,
}

impl<'a> PinRow<'a> {
    pub fn new(store: &Store, pin: &MapPin<'a>) -> Self {
        Self {
            shelter: ShelterRow::from(pin.shelter),
            marker: marker_label(pin.marker),
            needs: need_rows(store, pin.needs.iter().copied()),
        }
    }
}

pub const fn marker_label(marker: Marker) -> &'static str {
    match marker {
        Marker::HighUrgency => "high-urgency",
        Marker::Standard => "standard",
    }
}
