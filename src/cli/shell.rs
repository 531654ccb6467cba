//! The interactive session.
//!
//! Each input line is split into words, parsed with clap and dispatched
//! against a single [`Session`]. Mistakes (bad arguments, refused
//! transitions) are reported and the session carries on; only I/O failures
//! end it.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::{Parser, error::ErrorKind};
use donorlink::{
    Config, Seed, Store, StoreError,
    session::{Authenticator, CoordinateProvider, DemoAuthenticator, JitteredCoordinates},
};

use super::{
    account::{self, Login, Signup},
    browse::{Browse, Recent},
    dashboard::{Dashboard, Delete, Edit, Post, SetStatus, SetUrgency},
    impact::Impact,
    map::{Map, Shelters},
    pledge::Pledge,
    terminal::Colorize,
};

/// Everything a running session owns.
pub struct Session {
    pub store: Store,
    pub authenticator: Box<dyn Authenticator>,
    pub locator: Box<dyn CoordinateProvider>,
    pub config: Config,
}

/// Whether the session should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl Session {
    pub fn new(
        store: Store,
        authenticator: Box<dyn Authenticator>,
        locator: Box<dyn CoordinateProvider>,
        config: Config,
    ) -> Self {
        Self {
            store,
            authenticator,
            locator,
            config,
        }
    }

    /// Starts a session from the configured seed.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let seed = if !config.seed {
            Seed::empty()
        } else if let Some(path) = &config.seed_path {
            Seed::load(path)?
        } else {
            Seed::builtin()?
        };
        let store = seed
            .into_store()
            .context("failed to build the session from seed data")?;

        tracing::info!(
            shelters = store.shelters().len(),
            needs = store.needs().len(),
            "session started"
        );

        let authenticator = DemoAuthenticator::new(config.demo_shelter().cloned());
        let locator = JitteredCoordinates::new(config.reference(), config.jitter_span());
        Ok(Self::new(
            store,
            Box::new(authenticator),
            Box::new(locator),
            config,
        ))
    }

    /// Executes one command line.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned. Everything else is written to `out`.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> anyhow::Result<Flow> {
        let words = match split_words(line) {
            Ok(words) => words,
            Err(e) => {
                writeln!(out, "{}", format!("warning: {e}").warning())?;
                return Ok(Flow::Continue);
            }
        };

        if words.first().is_none_or(|word| word.starts_with('#')) {
            return Ok(Flow::Continue);
        }

        let line = match Line::try_parse_from(&words) {
            Ok(line) => line,
            Err(e) => {
                let rendered = e.render().to_string();
                match e.kind() {
                    ErrorKind::DisplayHelp
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                    | ErrorKind::DisplayVersion => write!(out, "{rendered}")?,
                    _ => write!(out, "{}", rendered.warning())?,
                }
                return Ok(Flow::Continue);
            }
        };

        match self.dispatch(line.command, out) {
            Ok(flow) => Ok(flow),
            Err(e) => report(e, out).map(|()| Flow::Continue),
        }
    }

    fn dispatch(&mut self, command: SessionCommand, out: &mut dyn Write) -> anyhow::Result<Flow> {
        tracing::debug!(?command, "dispatching");
        match command {
            SessionCommand::Browse(command) => command.run(self, out)?,
            SessionCommand::Recent(command) => command.run(self, out)?,
            SessionCommand::Map(command) => command.run(self, out)?,
            SessionCommand::Shelters(command) => command.run(self, out)?,
            SessionCommand::Pledge(command) => command.run(self, out)?,
            SessionCommand::Login(command) => command.run(self, out)?,
            SessionCommand::Signup(command) => command.run(self, out)?,
            SessionCommand::Logout => account::logout(self, out)?,
            SessionCommand::Whoami => account::whoami(self, out)?,
            SessionCommand::Dashboard(command) => command.run(self, out)?,
            SessionCommand::Post(command) => command.run(self, out)?,
            SessionCommand::Status(command) => command.run(self, out)?,
            SessionCommand::Urgency(command) => command.run(self, out)?,
            SessionCommand::Edit(command) => command.run(self, out)?,
            SessionCommand::Delete(command) => command.run(self, out)?,
            SessionCommand::Impact(command) => command.run(self, out)?,
            SessionCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

/// Writes a recoverable error, or hands back a fatal one.
fn report(error: anyhow::Error, out: &mut dyn Write) -> anyhow::Result<()> {
    if error.downcast_ref::<io::Error>().is_some() {
        return Err(error);
    }

    if error
        .downcast_ref::<StoreError>()
        .is_some_and(StoreError::is_integrity)
    {
        tracing::error!("{error}");
        writeln!(out, "{}", format!("integrity error: {error}").danger())?;
    } else {
        writeln!(out, "{}", format!("warning: {error}").warning())?;
    }
    Ok(())
}

/// Reads and executes lines until end of input or `quit`.
pub fn run(
    session: &mut Session,
    mut input: impl BufRead,
    out: &mut dyn Write,
    prompt: bool,
) -> anyhow::Result<()> {
    if prompt {
        writeln!(
            out,
            "{} {}",
            "DonorLink".strong(),
            "type 'help' for commands, 'quit' to leave".dim()
        )?;
    }

    let mut line = String::new();
    loop {
        if prompt {
            write!(out, "donorlink> ")?;
            out.flush()?;
        }

        line.clear();
        if input.read_line(&mut line).context("failed to read input")? == 0 {
            break;
        }
        if session.execute_line(&line, out)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// One line of session input.
#[derive(Debug, Parser)]
#[command(name = "donorlink", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Debug, clap::Subcommand)]
enum SessionCommand {
    /// List needs open to donors
    Browse(Browse),

    /// Show the most recently posted needs
    Recent(Recent),

    /// Show shelters with active needs, as map pins
    Map(Map),

    /// List every registered shelter
    Shelters(Shelters),

    /// Pledge units against a need
    Pledge(Pledge),

    /// Log in as a shelter
    Login(Login),

    /// Register a new shelter and log in as it
    Signup(Signup),

    /// Log out of the current shelter
    Logout,

    /// Show who is logged in
    Whoami,

    /// Show the logged-in shelter's needs
    Dashboard(Dashboard),

    /// Post a new need for the logged-in shelter
    Post(Post),

    /// Change the status of one of your needs
    Status(SetStatus),

    /// Change the urgency of one of your needs
    Urgency(SetUrgency),

    /// Change the total quantity of one of your needs
    Edit(Edit),

    /// Delete one of your needs
    Delete(Delete),

    /// Show community impact totals
    Impact(Impact),

    /// Leave the session
    #[command(alias = "exit")]
    Quit,
}

/// A quote that was opened and never closed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unterminated {0} quote")]
pub struct UnterminatedQuote(char);

/// Splits a command line into words.
///
/// Words are separated by whitespace. Single quotes group text literally;
/// double quotes group text and honour backslash escapes, as does bare text.
pub fn split_words(line: &str) -> Result<Vec<String>, UnterminatedQuote> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => word.push(c),
            (_, '\\') => {
                if let Some(escaped) = chars.next() {
                    word.push(escaped);
                }
                in_word = true;
            }
            (Some(_), _) => word.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            (None, _) => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(UnterminatedQuote(open));
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

#[cfg(test)]
pub mod tests {
    use donorlink::{
        Coordinate, ShelterId,
        session::{FixedCoordinates, IntegrityError},
    };
    use test_case::test_case;

    use super::*;

    /// A session over the built-in seed with deterministic coordinates.
    pub fn session() -> Session {
        let config = Config::default();
        Session::new(
            Seed::builtin().unwrap().into_store().unwrap(),
            Box::new(DemoAuthenticator::new(Some(ShelterId::new("shelter-1")))),
            Box::new(FixedCoordinates(Coordinate::new(47.6, -122.3))),
            config,
        )
    }

    /// Runs each line and returns everything written.
    pub fn execute(session: &mut Session, lines: &[&str]) -> String {
        let mut out = Vec::new();
        for line in lines {
            session.execute_line(line, &mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test_case("browse", &["browse"]; "single word")]
    #[test_case("  pledge   need-1  5 ", &["pledge", "need-1", "5"]; "extra whitespace")]
    #[test_case("post --name \"Winter Coats\"", &["post", "--name", "Winter Coats"]; "double quotes")]
    #[test_case("post --name 'Kids\" Socks'", &["post", "--name", "Kids\" Socks"]; "single quotes")]
    #[test_case(r"post --name Wool\ Socks", &["post", "--name", "Wool Socks"]; "escaped space")]
    #[test_case("post --description \"\"", &["post", "--description", ""]; "empty quotes")]
    #[test_case("", &[]; "empty line")]
    fn splits_words(line: &str, expected: &[&str]) {
        assert_eq!(split_words(line).unwrap(), expected);
    }

    #[test]
    fn unterminated_quote_is_reported() {
        assert_eq!(
            split_words("post --name \"Coats").unwrap_err(),
            UnterminatedQuote('"')
        );
    }

    #[test]
    fn blank_lines_and_comments_are_ignored() {
        let mut session = session();
        assert_eq!(execute(&mut session, &["", "   ", "# a comment"]), "");
    }

    #[test]
    fn quit_and_exit_stop_the_session() {
        let mut session = session();
        let mut out = Vec::new();
        assert_eq!(session.execute_line("quit", &mut out).unwrap(), Flow::Quit);
        assert_eq!(session.execute_line("exit", &mut out).unwrap(), Flow::Quit);
    }

    #[test]
    fn unknown_command_is_a_warning() {
        let mut session = session();
        let output = execute(&mut session, &["donate need-1 5", "impact"]);
        assert!(output.contains("unrecognized subcommand"));
        assert!(output.contains("Meals shared"));
    }

    #[test]
    fn help_lists_commands() {
        let mut session = session();
        let output = execute(&mut session, &["help"]);
        assert!(output.contains("pledge"));
        assert!(output.contains("dashboard"));
    }

    #[test]
    fn validation_errors_do_not_end_the_session() {
        let mut session = session();
        let output = execute(&mut session, &["pledge need-1 0", "pledge need-1 999"]);
        assert!(output.contains("please enter a quantity between 1 and 50 (got 0)"));
        assert!(output.contains("please enter a quantity between 1 and 50 (got 999)"));
    }

    #[test]
    fn integrity_errors_are_distinct() {
        let mut out = Vec::new();
        report(
            anyhow::Error::new(StoreError::Integrity(
                IntegrityError::DuplicateShelter(ShelterId::new("s")),
            )),
            &mut out,
        )
        .unwrap();
        assert!(
            String::from_utf8(out)
                .unwrap()
                .contains("integrity error: duplicate shelter id 's'")
        );
    }

    #[test]
    fn io_errors_are_fatal() {
        let error = anyhow::Error::new(io::Error::other("disk on fire"));
        assert!(report(error, &mut Vec::new()).is_err());
    }

    #[test]
    fn shell_reads_until_quit() {
        let mut session = session();
        let input = b"impact\nquit\nbrowse\n";
        let mut out = Vec::new();
        run(&mut session, &input[..], &mut out, false).unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Meals shared"));
        assert!(!output.contains("Wool Blankets"));
    }

    #[test]
    fn seedless_config_starts_empty() {
        let mut config = Config::default();
        config.seed = false;
        let session = Session::from_config(config).unwrap();
        assert!(session.store.shelters().is_empty());
    }
}
