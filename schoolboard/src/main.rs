//! Command-line front end for the school records admin console.
//!
//! Each subcommand maps onto one presentation-layer action: sign in, load
//! the dashboard, show the signed-in user, or sign out. The session persists
//! between invocations in the configured state directory.

use std::env;
use std::ffi::OsString;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroizing;

use schoolboard::ClientSettings;
use schoolboard::domain::{
    DASHBOARD_ROUTE, DashboardLoader, DashboardState, LOGIN_ROUTE, LoginCredentials, LoginFlow,
};
use schoolboard::outbound::http::HttpApiClient;
use schoolboard::outbound::storage::FileKeyValueStorage;

/// Exit status when the command needs a signed-in session.
const EXIT_UNAUTHENTICATED: u8 = 2;

/// Environment variable consulted for the login password.
const PASSWORD_ENV: &str = "SCHOOLBOARD_PASSWORD";

#[derive(Debug, Parser)]
#[command(name = "schoolboard", version, about = "School records admin console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session.
    ///
    /// The password is read from `SCHOOLBOARD_PASSWORD`, or else from the
    /// first line of standard input.
    Login {
        /// Account email address.
        #[arg(long)]
        email: String,
    },
    /// Load statistics, grade distribution and recent absences.
    Dashboard,
    /// Show the signed-in user.
    Whoami,
    /// Sign out and clear the stored session.
    Logout,
}

type Flow = LoginFlow<FileKeyValueStorage, HttpApiClient>;
type Loader = DashboardLoader<FileKeyValueStorage, HttpApiClient>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = ClientSettings::load_from_iter([OsString::from("schoolboard")])
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;

    let storage = Arc::new(
        FileKeyValueStorage::open(&settings.state_dir())
            .wrap_err("failed to open session storage")?,
    );
    let client = Arc::new(
        HttpApiClient::new(settings.base_url()?, settings.request_timeout())
            .wrap_err("failed to build HTTP client")?,
    );

    let mut out = io::stdout().lock();
    match cli.command {
        Command::Login { email } => {
            let stdin = io::stdin();
            let password = read_password(
                env::var(PASSWORD_ENV).ok(),
                &mut stdin.lock(),
                &mut io::stderr(),
                stdin.is_terminal(),
            )?;
            login(&LoginFlow::new(storage, client), &email, &password, &mut out).await
        }
        Command::Dashboard => dashboard(&DashboardLoader::new(storage, client), &mut out).await,
        Command::Whoami => whoami(&LoginFlow::new(storage, client), &mut out),
        Command::Logout => logout(&LoginFlow::new(storage, client), &mut out).await,
    }
}

/// Password from the environment, else one line of `input`.
///
/// Only the line terminator is stripped; other whitespace is part of the
/// password.
fn read_password(
    from_env: Option<String>,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
    interactive: bool,
) -> Result<Zeroizing<String>> {
    if let Some(password) = from_env {
        return Ok(Zeroizing::new(password));
    }
    if interactive {
        write!(prompt, "password (input is echoed; set {PASSWORD_ENV} to avoid): ")?;
        prompt.flush()?;
    }
    let mut line = Zeroizing::new(String::new());
    input
        .read_line(&mut line)
        .wrap_err("failed to read password")?;
    let trimmed = line
        .strip_suffix('\n')
        .map(|rest| rest.strip_suffix('\r').unwrap_or(rest))
        .unwrap_or(line.as_str());
    Ok(Zeroizing::new(trimmed.to_owned()))
}

async fn login(flow: &Flow, email: &str, password: &str, out: &mut impl Write) -> Result<ExitCode> {
    let credentials = LoginCredentials::try_from_parts(email, password)?;
    let user = flow.submit(&credentials).await?;
    writeln!(out, "{}", user.greeting())?;
    writeln!(out, "next: {DASHBOARD_ROUTE}")?;
    Ok(ExitCode::SUCCESS)
}

async fn dashboard(loader: &Loader, out: &mut impl Write) -> Result<ExitCode> {
    let state = loader
        .load()
        .await
        .ok_or_else(|| eyre!("dashboard load was superseded"))?;
    match state {
        DashboardState::Ready(snapshot) => {
            let rendered = serde_json::to_string_pretty(&snapshot)
                .wrap_err("failed to render dashboard")?;
            writeln!(out, "{rendered}")?;
            Ok(ExitCode::SUCCESS)
        }
        DashboardState::Failed { message } => Err(eyre!(message)),
        DashboardState::Unauthenticated => {
            writeln!(io::stderr(), "not signed in; redirecting to {LOGIN_ROUTE}")?;
            writeln!(
                io::stderr(),
                "run `schoolboard login --email <EMAIL>` with {PASSWORD_ENV} set or the password on stdin"
            )?;
            Ok(ExitCode::from(EXIT_UNAUTHENTICATED))
        }
        DashboardState::Loading => Err(eyre!("dashboard load did not settle")),
    }
}

fn whoami(flow: &Flow, out: &mut impl Write) -> Result<ExitCode> {
    match flow.current_user()? {
        Some(user) => {
            writeln!(out, "{} <{}> ({})", user.name, user.email, user.role)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            writeln!(io::stderr(), "not signed in")?;
            Ok(ExitCode::from(EXIT_UNAUTHENTICATED))
        }
    }
}

async fn logout(flow: &Flow, out: &mut impl Write) -> Result<ExitCode> {
    let route = flow.sign_out().await?;
    writeln!(out, "signed out; next: {route}")?;
    Ok(ExitCode::SUCCESS)
}
