use std::io::Write;

use clap::Parser;
use donorlink::{
    ItemType, Need, NeedId, NewNeed, Status, Urgency,
    session::Update,
};
use serde::Serialize;
use tracing::instrument;

use super::{
    parse_quantity,
    render::{self, NeedRow, OutputFormat, ShelterRow},
    shell::Session,
    terminal::Colorize,
};

/// Command arguments for `dashboard`.
///
/// Lists every need the logged-in shelter has posted, whatever its status,
/// newest first.
#[derive(Debug, Parser)]
pub struct Dashboard {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Serialize)]
struct DashboardJson<'a> {
    shelter: ShelterRow<'a>,
    summary: donorlink::domain::DashboardSummary,
    needs: Vec<NeedRow<'a>>,
}

impl Dashboard {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let store = &session.store;
        let dashboard = store.dashboard()?;

        if self.output == OutputFormat::Json {
            return render::json(
                out,
                &DashboardJson {
                    shelter: ShelterRow::from(dashboard.shelter),
                    summary: dashboard.summary,
                    needs: render::need_rows(store, dashboard.needs.iter().copied()),
                },
            );
        }

        let summary = dashboard.summary;
        writeln!(out, "{}", dashboard.shelter.name().strong())?;
        writeln!(
            out,
            "{}  {}  {}",
            format!("Active: {}", summary.active).info(),
            format!("Pending: {}", summary.pending).warning(),
            format!("Fulfilled: {}", summary.fulfilled).success(),
        )?;
        writeln!(out)?;

        if dashboard.needs.is_empty() {
            writeln!(
                out,
                "{}",
                "You have not posted any needs yet. Use 'post' to add one.".dim()
            )?;
            return Ok(());
        }

        let rows: Vec<_> = dashboard
            .needs
            .iter()
            .map(|need| {
                vec![
                    need.id().to_string(),
                    need.name().to_string(),
                    need.item_type().to_string(),
                    need.urgency().to_string(),
                    need.status().to_string(),
                    need.progress().to_string(),
                ]
            })
            .collect();
        render::table(
            out,
            &["ID", "Item", "Category", "Urgency", "Status", "Progress"],
            &rows,
        )
    }
}

/// Command arguments for `post`.
///
/// Example:
///   post --category food --name "Canned Soup" --quantity 40 --urgency high
#[derive(Debug, Parser)]
pub struct Post {
    /// Item category
    #[arg(short, long)]
    category: ItemType,

    /// Short item name
    #[arg(short, long)]
    name: String,

    /// Number of units needed
    #[arg(short, long, value_parser = parse_quantity, allow_hyphen_values = true)]
    quantity: u32,

    /// How urgently the items are needed
    #[arg(short, long, default_value_t = Urgency::Medium)]
    urgency: Urgency,

    /// Sizes, brands or other details
    #[arg(short, long, default_value = "")]
    description: String,
}

impl Post {
    #[instrument(level = "debug", skip(session, out))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let need = session.store.post_need(NewNeed {
            item_type: self.category,
            name: self.name,
            quantity: self.quantity,
            urgency: self.urgency,
            description: self.description,
        })?;

        writeln!(
            out,
            "{}",
            format!("Posted {} ({}): {}", need.name(), need.id(), need.progress()).success()
        )?;
        Ok(())
    }
}

/// Command arguments for `status`.
///
/// Setting a pending need back to active means the pledge fell through, and
/// the full quantity is needed again.
#[derive(Debug, Parser)]
pub struct SetStatus {
    /// The need to update
    need: NeedId,

    /// New status (active, pending or fulfilled)
    status: Status,
}

impl SetStatus {
    #[instrument(level = "debug", skip(session, out))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        match session.store.set_status(&self.need, self.status)? {
            Update::Updated(need) => writeln!(
                out,
                "{}",
                format!("Marked {} as {}: {}", need.name(), need.status(), need.progress())
                    .success()
            )?,
            Update::Unchanged => unchanged(out, session, &self.need, "status", self.status)?,
        }
        Ok(())
    }
}

/// Command arguments for `urgency`.
#[derive(Debug, Parser)]
pub struct SetUrgency {
    /// The need to update
    need: NeedId,

    /// New urgency (low, medium or high)
    urgency: Urgency,
}

impl SetUrgency {
    #[instrument(level = "debug", skip(session, out))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        match session.store.set_urgency(&self.need, self.urgency)? {
            Update::Updated(need) => writeln!(
                out,
                "{}",
                format!("{} is now {} urgency", need.name(), need.urgency()).success()
            )?,
            Update::Unchanged => unchanged(out, session, &self.need, "urgency", self.urgency)?,
        }
        Ok(())
    }
}

fn unchanged(
    out: &mut dyn Write,
    session: &Session,
    id: &NeedId,
    field: &str,
    value: impl std::fmt::Display,
) -> anyhow::Result<()> {
    let name = session.store.need(id).map_or(id.as_str(), Need::name);
    writeln!(
        out,
        "{}",
        format!("{name} already has {field} {value}; unchanged").dim()
    )?;
    Ok(())
}

/// Command arguments for `edit`.
///
/// Units already pledged are kept, so the total cannot drop below them, and
/// a need always asks for at least one unit.
#[derive(Debug, Parser)]
pub struct Edit {
    /// The need to update
    need: NeedId,

    /// New total quantity
    #[arg(value_parser = parse_quantity, allow_hyphen_values = true)]
    total: u32,
}

impl Edit {
    #[instrument(level = "debug", skip(session, out))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let need = session.store.edit_total(&self.need, self.total)?;
        writeln!(
            out,
            "{}",
            format!(
                "Updated {}: {} of {} still needed",
                need.name(),
                need.quantity(),
                need.original_quantity()
            )
            .success()
        )?;
        Ok(())
    }
}

/// Command arguments for `delete`.
#[derive(Debug, Parser)]
pub struct Delete {
    /// The need to delete
    need: NeedId,
}

impl Delete {
    #[instrument(level = "debug", skip(session, out))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let need = session.store.delete_need(&self.need)?;
        writeln!(out, "Deleted {} ({}).", need.name(), need.id())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use donorlink::{NeedId, Status};
    use test_case::test_case;

    use crate::cli::shell::{
        Session,
        tests::{execute, session},
    };

    fn logged_in() -> Session {
        let mut session = session();
        execute(&mut session, &["login staff@hopeharbor.org pw"]);
        session
    }

    fn need(session: &Session, id: &str) -> donorlink::Need {
        session.store.need(&NeedId::new(id)).unwrap().clone()
    }

    #[test]
    fn dashboard_requires_login() {
        let mut session = session();
        let output = execute(&mut session, &["dashboard"]);
        assert!(output.contains("please log in as a shelter first"));
    }

    #[test]
    fn dashboard_shows_own_needs_with_progress() {
        let mut session = logged_in();
        execute(&mut session, &["pledge need-2 20"]);
        let output = execute(&mut session, &["dashboard --output json"]);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["summary"]["active"], 1);
        assert_eq!(json["summary"]["pending"], 1);
        assert_eq!(json["summary"]["fulfilled"], 1);

        let progress: Vec<_> = json["needs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|need| need["progress"].clone())
            .collect();
        assert_eq!(
            progress,
            ["50 units needed", "20/120 units pledged", "48 units received"]
        );
    }

    #[test]
    fn post_adds_an_active_need_first() {
        let mut session = logged_in();
        let output = execute(
            &mut session,
            &["post --category food --name 'Oat Milk' --quantity 12 --urgency high"],
        );
        assert!(output.contains("Posted Oat Milk"));
        assert!(output.contains("12 units needed"));

        let first = &session.store.needs()[0];
        assert_eq!(first.name(), "Oat Milk");
        assert_eq!(first.status(), Status::Active);
        assert_eq!(first.shelter_id().as_str(), "shelter-1");

        let output = execute(&mut session, &["recent -n 1"]);
        assert!(output.contains("Oat Milk"));
    }

    #[test_case("post --category food --name Rice --quantity 0", "quantity must be at least 1"; "zero quantity")]
    #[test_case("post --category food --name ' ' --quantity 3", "item name must not be empty"; "blank name")]
    #[test_case("post --category toys --name Ball --quantity 3", "unknown category 'toys'"; "bad category")]
    fn post_rejects_invalid_drafts(line: &str, message: &str) {
        let mut session = logged_in();
        let before = session.store.needs().len();
        let output = execute(&mut session, &[line]);
        assert!(output.contains(message), "{output}");
        assert_eq!(session.store.needs().len(), before);
    }

    #[test]
    fn reverting_to_active_restores_the_full_quantity() {
        let mut session = logged_in();
        execute(&mut session, &["pledge need-1 50"]);
        assert_eq!(need(&session, "need-1").quantity(), 0);

        let output = execute(&mut session, &["status need-1 active"]);
        assert!(output.contains("50 units needed"));
        let need = need(&session, "need-1");
        assert_eq!(need.status(), Status::Active);
        assert_eq!(need.quantity(), 50);
    }

    #[test]
    fn same_status_is_reported_unchanged() {
        let mut session = logged_in();
        let output = execute(&mut session, &["status need-1 Active"]);
        assert!(output.contains("already has status Active; unchanged"));
    }

    #[test]
    fn urgency_can_be_changed() {
        let mut session = logged_in();
        let output = execute(&mut session, &["urgency need-2 high", "urgency need-2 high"]);
        assert!(output.contains("Canned Soup is now High urgency"));
        assert!(output.contains("already has urgency High"));
    }

    #[test]
    fn edit_cannot_drop_below_pledged() {
        let mut session = logged_in();
        let output = execute(
            &mut session,
            &["pledge need-2 100", "edit need-2 99", "edit need-2 150"],
        );
        assert!(output.contains("donors have already pledged 100 units"));
        assert!(output.contains("50 of 150 still needed"));
    }

    #[test_case("edit need-1 0"; "zero")]
    #[test_case("edit need-1 -4"; "negative")]
    fn edit_to_zero_keeps_the_need(line: &str) {
        let mut session = logged_in();
        let output = execute(&mut session, &[line]);
        assert!(output.contains("quantity must be at least 1"), "{output}");
        let need = need(&session, "need-1");
        assert_eq!((need.original_quantity(), need.quantity()), (50, 50));
    }

    #[test]
    fn other_shelters_needs_are_off_limits() {
        let mut session = logged_in();
        let before = session.store.clone();
        let output = execute(
            &mut session,
            &[
                "status need-3 fulfilled",
                "urgency need-3 low",
                "edit need-3 1",
                "delete need-3",
            ],
        );
        assert_eq!(output.matches("belongs to another shelter").count(), 4);
        assert_eq!(session.store, before);
    }

    #[test]
    fn delete_removes_the_need() {
        let mut session = logged_in();
        let output = execute(&mut session, &["delete need-9"]);
        assert!(output.contains("Deleted Peanut Butter (need-9)."));
        assert!(session.store.need(&NeedId::new("need-9")).is_none());
    }
}
