use std::process;

use clap::Parser;

use pwgen::i18n::{Catalog, Localizer};
use pwgen::session::{FileStore, SessionStore};
use pwgen::CategoryFlags;

mod clipboard;
mod config;
mod generate;
mod lang;
mod logging;
mod prompt;
mod table;

#[derive(Parser)]
#[command(name = "pwgen", about = "Generate random passwords")]
struct Args {
    /// The conversation whose language and last request are used.
    #[arg(long, global = true, env = "PWGEN_SESSION", default_value_t = 0)]
    session: i64,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Choose a language, then show a greeting and the available commands.
    Start,
    /// Generate a password. Without arguments, the previous request is repeated (or asked for).
    #[command(alias = "gen")]
    Generate {
        /// Password length, from 4 to 35 characters.
        length: Option<String>,
        /// Character categories: U uppercase, L lowercase, D digits, S special symbols. Add X to
        /// exclude similar characters (i, l, 1, O, 0).
        flags: Option<String>,
        /// Copy the password to the clipboard instead of printing it.
        #[arg(long)]
        copy: bool,
    },
    /// Show or change the display language.
    #[command(subcommand)]
    Lang(LangCommand),
}

#[derive(clap::Subcommand)]
enum LangCommand {
    /// Show the current language.
    Get,
    /// Change the language.
    Set { code: String },
    /// Forget this conversation's language and last request.
    Clear,
    /// List the available languages.
    List,
}

/// Everything a command needs; built once per run and passed down by reference.
pub(crate) struct App {
    pub(crate) session: i64,
    pub(crate) config: config::Config,
    pub(crate) catalog: Catalog,
    pub(crate) store: FileStore,
}

impl App {
    fn load(session: i64) -> Result<App, ProgError> {
        let config = config::Config::load()?;
        let catalog = Catalog::embedded()?;
        let store = FileStore::open(config.session_dir()?, config.store_options())?;
        tracing::debug!(session, dir = %store.dir().display(), "opened session store");
        Ok(App {
            session,
            config,
            catalog,
            store,
        })
    }

    /// The conversation's language, or the configured default. Session store trouble is logged,
    /// not fatal: it only affects which language messages are shown in.
    pub(crate) fn language(&self) -> String {
        match pwgen::session::language(&self.store, self.session) {
            Ok(Some(language)) if self.catalog.has_language(&language) => language,
            Ok(_) => self.config.default_language.clone(),
            Err(err) => {
                tracing::warn!(session = self.session, error = %err, "failed to read the session language");
                self.config.default_language.clone()
            }
        }
    }

    pub(crate) fn localizer(&self) -> Localizer<'_> {
        self.catalog.localizer(&self.language())
    }

    /// The length and flags of the last successful generation in this conversation.
    pub(crate) fn remembered_request(&self) -> (Option<usize>, Option<CategoryFlags>) {
        match self.store.get(self.session) {
            Ok(session) => (session.password_length, session.flags),
            Err(err) => {
                if !err.is_not_found() {
                    tracing::warn!(session = self.session, error = %err, "failed to read the session");
                }
                (None, None)
            }
        }
    }
}

fn run() -> Result<(), ProgError> {
    let args = Args::parse();
    let app = App::load(args.session)?;

    match args.command {
        Command::Start => lang::start(&app)?,
        Command::Generate {
            length,
            flags,
            copy,
        } => generate::generate(&app, length, flags, copy)?,
        Command::Lang(LangCommand::Get) => lang::show_language(&app)?,
        Command::Lang(LangCommand::Set { code }) => lang::set_language(&app, &code)?,
        Command::Lang(LangCommand::Clear) => lang::clear_session(&app)?,
        Command::Lang(LangCommand::List) => lang::list_languages(&app)?,
    }

    Ok(())
}

fn main() {
    logging::init();
    match run() {
        Ok(()) => (),
        Err(ProgError::Generate(err)) => {
            tracing::error!(error = ?err, "password generation failed");
            eprintln!("{}", ProgError::Generate(err));
            process::exit(2);
        }
        Err(ProgError::Other(err)) => {
            tracing::error!(error = ?err, "unexpected failure");
            eprintln!("{err:?}");
            process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProgError {
    /// A bad request, already rendered in the user's language.
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Language selection cancelled; exiting.")]
    SelectionCancelled,
    #[error("Failed to generate a password: {0}")]
    Generate(#[source] pwgen::GenerateError),
    #[error("Session store error: {0}")]
    Session(pwgen::session::SessionError),
    #[error("Failed to load messages: {0}")]
    Locale(pwgen::i18n::LocaleError),
    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for ProgError {
    fn from(err: anyhow::Error) -> ProgError {
        ProgError::Other(err)
    }
}

impl From<pwgen::session::SessionError> for ProgError {
    fn from(err: pwgen::session::SessionError) -> ProgError {
        ProgError::Session(err)
    }
}

impl From<pwgen::i18n::LocaleError> for ProgError {
    fn from(err: pwgen::i18n::LocaleError) -> ProgError {
        ProgError::Locale(err)
    }
}
