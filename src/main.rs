use std::path::PathBuf;

use admin_session::{AuthContext, AuthError, ClientConfig, GuardState};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("navigation to {path} redirected to {redirect}")]
    Redirected { path: String, redirect: String },
    #[error("not logged in; run `admin-session login` first")]
    NotLoggedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "admin-session", about = "Admin dashboard session and route-guard driver")]
struct Cli {
    #[arg(long, env = "ADMIN_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "ADMIN_STATE_FILE")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in with username and password.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear local tokens and end the server session.
    Logout,
    /// Print the cached user profile.
    Whoami,
    /// Resolve the server session and hydrate the local store from it.
    Session,
    /// Run the route guard for a navigation to `path`.
    Navigate { path: String },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = cli.api_url.as_deref() {
        config = config.with_api_url(api_url);
    }
    if let Some(state_file) = cli.state_file {
        config.state_file = state_file;
    }

    let ctx = AuthContext::from_config(&config)?;

    match cli.command {
        Command::Login { username, password } => run_login(&ctx, &username, &password).await,
        Command::Logout => run_logout(&ctx).await,
        Command::Whoami => run_whoami(&ctx),
        Command::Session => run_session(&ctx).await,
        Command::Navigate { path } => run_navigate(&ctx, path).await,
    }
}

async fn run_login(ctx: &AuthContext, username: &str, password: &str) -> Result<(), CliError> {
    ctx.store.login(username, password).await?;
    print_json(&json!({
        "loggedIn": ctx.store.is_login(),
        "user": ctx.store.user(),
    }))
}

async fn run_logout(ctx: &AuthContext) -> Result<(), CliError> {
    ctx.store.logout().await;
    print_json(&json!({ "loggedIn": false }))
}

fn run_whoami(ctx: &AuthContext) -> Result<(), CliError> {
    let Some(user) = ctx.store.user().filter(|_| ctx.store.is_login()) else {
        return Err(CliError::NotLoggedIn);
    };
    print_json(&json!({
        "admin": user.has_role(ADMIN_ROLE),
        "user": serde_json::to_value(&user)?,
    }))
}

async fn run_session(ctx: &AuthContext) -> Result<(), CliError> {
    let session = ctx.guard.hydrate_from_session().await;
    let authenticated = (!session.is_unknown()).then(|| session.is_authenticated());
    print_json(&json!({
        "session": session.kind(),
        "isAuthenticated": authenticated,
        "userId": session.user_id(),
        "loggedIn": ctx.store.is_login(),
    }))
}

async fn run_navigate(ctx: &AuthContext, path: String) -> Result<(), CliError> {
    match ctx.guard.before_each(&path).await {
        GuardState::RedirectLogin => {
            Err(CliError::Redirected { path, redirect: ctx.guard.login_route().to_owned() })
        }
        state => print_json(&json!({
            "path": path,
            "state": format!("{state:?}"),
            "userId": ctx.store.user().map(|u| u.id),
        })),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
