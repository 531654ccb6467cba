use std::io::Write;

use clap::Parser;
use donorlink::{ShelterProfile, session::Credentials};
use tracing::instrument;

use super::{shell::Session, terminal::Colorize};

/// Command arguments for `login`.
///
/// This is a demonstration login: any well-formed email and non-empty
/// password is accepted.
#[derive(Debug, Parser)]
pub struct Login {
    /// Shelter email address
    email: String,

    /// Password
    password: String,
}

impl Login {
    #[instrument(level = "debug", skip_all, fields(email = %self.email))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let credentials = Credentials::new(self.email, self.password);
        let shelter = session
            .store
            .sign_in(session.authenticator.as_ref(), &credentials)?;
        writeln!(
            out,
            "{}",
            format!("Logged in as {} ({})", shelter.name(), shelter.id()).success()
        )?;
        Ok(())
    }
}

/// Command arguments for `signup`.
#[derive(Debug, Parser)]
pub struct Signup {
    /// Shelter name
    #[arg(long)]
    name: String,

    /// Contact email address
    #[arg(long)]
    email: String,

    /// Street address
    #[arg(long)]
    street: String,

    /// City
    #[arg(long)]
    city: String,

    /// State
    #[arg(long)]
    state: String,

    /// Contact phone number
    #[arg(long)]
    phone: String,
}

impl Signup {
    #[instrument(level = "debug", skip_all, fields(name = %self.name))]
    pub fn run(self, session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
        let profile = ShelterProfile {
            name: self.name.trim().to_string(),
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };

        let shelter = session.store.sign_up(profile, session.locator.as_ref())?;
        writeln!(
            out,
            "{}",
            format!("Welcome, {}! You are logged in as {}.", shelter.name(), shelter.id())
                .success()
        )?;
        writeln!(
            out,
            "{}",
            format!("Map location: {}", shelter.coordinate()).dim()
        )?;
        Ok(())
    }
}

pub fn logout(session: &mut Session, out: &mut dyn Write) -> anyhow::Result<()> {
    match session.store.sign_out() {
        Some(id) => writeln!(out, "Logged out of {id}.")?,
        None => writeln!(out, "{}", "Not logged in.".dim())?,
    }
    Ok(())
}

pub fn whoami(session: &Session, out: &mut dyn Write) -> anyhow::Result<()> {
    match session.store.active_shelter() {
        Some(shelter) => writeln!(out, "{} ({})", shelter.name(), shelter.id())?,
        None => writeln!(out, "{}", "Not logged in; browsing as a donor.".dim())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use crate::cli::shell::tests::{execute, session};

    #[test]
    fn login_resolves_to_the_demo_shelter() {
        let mut session = session();
        let output = execute(
            &mut session,
            &["login anyone@example.org hunter2", "whoami"],
        );
        assert!(output.contains("Logged in as Hope Harbor Shelter (shelter-1)"));
        assert_eq!(
            session.store.active_shelter().unwrap().id().as_str(),
            "shelter-1"
        );
    }

    #[test]
    fn login_rejects_malformed_email() {
        let mut session = session();
        let output = execute(&mut session, &["login nobody secret"]);
        assert!(output.contains("please enter a valid email address"));
        assert!(session.store.active_shelter().is_none());
    }

    #[test]
    fn login_without_shelters_fails() {
        let mut session = session();
        session.store = donorlink::Store::default();
        let output = execute(&mut session, &["login a@b.org pw"]);
        assert!(output.contains("No shelters available to log in."));
    }

    #[test]
    fn signup_creates_and_activates_a_shelter() {
        let mut session = session();
        let output = execute(
            &mut session,
            &[
                "signup --name 'Eastside Refuge' --email hi@eastside.org --street '9 Elm St' \
                 --city Bellevue --state WA --phone 555-0199",
            ],
        );
        assert!(output.contains("Welcome, Eastside Refuge!"));
        assert!(output.contains("Map location: 47.6000, -122.3000"));

        let active = session.store.active_shelter().unwrap();
        assert_eq!(active.name(), "Eastside Refuge");
        assert_eq!(active.address(), "9 Elm St, Bellevue, WA");
        assert_eq!(session.store.shelters().len(), 5);
    }

    fn signup_line(field: &str, value: &str) -> String {
        let mut line = String::from("signup");
        for (flag, default) in [
            ("name", "Eastside Refuge"),
            ("email", "hi@eastside.org"),
            ("street", "9 Elm St"),
            ("city", "Bellevue"),
            ("state", "WA"),
            ("phone", "555-0199"),
        ] {
            let value = if flag == field { value } else { default };
            line.push_str(&format!(" --{flag} '{value}'"));
        }
        line
    }

    #[test_case("name", "shelter name is required"; "blank name")]
    #[test_case("street", "street is required"; "blank street")]
    #[test_case("city", "city is required"; "blank city")]
    #[test_case("state", "state is required"; "blank state")]
    #[test_case("phone", "phone is required"; "blank phone")]
    #[test_case("email", "email is required"; "blank email")]
    fn signup_rejects_blank_fields(field: &str, message: &str) {
        let mut session = session();
        let output = execute(&mut session, &[&signup_line(field, " ")]);
        assert!(output.contains(message), "{output}");
        assert_eq!(session.store.shelters().len(), 4);
        assert!(session.store.active_shelter().is_none());
    }

    #[test]
    fn signup_rejects_implausible_email() {
        let mut session = session();
        let output = execute(&mut session, &[&signup_line("email", "eastside.org")]);
        assert!(output.contains("please enter a valid email address"));
        assert_eq!(session.store.shelters().len(), 4);
    }

    #[test]
    fn signup_without_an_address_is_a_usage_error() {
        let mut session = session();
        let output = execute(&mut session, &["signup --name Refuge --email hi@refuge.org"]);
        assert!(output.contains("--street"), "{output}");
        assert_eq!(session.store.shelters().len(), 4);
    }

    #[test]
    fn logout_clears_the_session() {
        let mut session = session();
        let output = execute(
            &mut session,
            &["login a@b.org pw", "logout", "logout", "whoami"],
        );
        assert!(output.contains("Logged out of shelter-1."));
        assert!(output.contains("Not logged in."));
        assert!(output.contains("browsing as a donor"));
    }
}
