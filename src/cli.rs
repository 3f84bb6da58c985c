use crate::config::Config;
use crate::errors::AppError;
use crate::models::{LoginResponse, User};
use crate::session::SessionContext;
use crate::traits::MessageHandler;
use clap::{Args, Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

/// Chat Session - inspect and manage the stored chat login
#[derive(Parser)]
#[command(name = "chat-session")]
#[command(about = "Inspect and manage the persisted chat session token", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the config file)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Show the stored token
    Show(ShowArgs),

    /// Store a token (prompts when neither a token nor --response is given)
    Login(LoginArgs),

    /// Remove the stored token
    Logout,

    /// Show storage backend, location and login state
    Status,
}

#[derive(Args, Clone)]
pub struct ShowArgs {
    /// Print the full token instead of a masked one
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Args, Clone)]
pub struct LoginArgs {
    /// Bearer token returned by the chat server
    #[arg(value_name = "TOKEN", conflicts_with = "response")]
    pub token: Option<String>,

    /// JSON body of a /users/login reply to take the token from
    #[arg(long, value_name = "FILE")]
    pub response: Option<PathBuf>,

    /// Username of the signed-in user
    #[arg(short, long)]
    pub username: Option<String>,

    /// Email of the signed-in user
    #[arg(short, long)]
    pub email: Option<String>,

    /// Server-side id of the signed-in user
    #[arg(long)]
    pub id: Option<i64>,
}

impl LoginArgs {
    fn user(&self) -> Option<User> {
        self.username.as_ref().map(|username| User {
            id: self.id.unwrap_or_default(),
            username: username.clone(),
            email: self.email.clone().unwrap_or_default(),
        })
    }
}

pub fn handle_command(
    command: Commands,
    session: &SessionContext,
    config: &Config,
    out: &dyn MessageHandler,
) -> Result<(), AppError> {
    match command {
        Commands::Show(args) => handle_show_command(&args, session, out),
        Commands::Login(args) => handle_login_command(&args, session, out),
        Commands::Logout => handle_logout_command(session, out),
        Commands::Status => handle_status_command(session, config, out),
    }
}

fn handle_show_command(
    args: &ShowArgs,
    session: &SessionContext,
    out: &dyn MessageHandler,
) -> Result<(), AppError> {
    match session.token().get().filter(|t| !t.is_empty()) {
        Some(token) if args.reveal => out.print(&token),
        Some(token) => out.print(&mask_token(&token)),
        None => out.print("No token stored."),
    }
    Ok(())
}

fn handle_login_command(
    args: &LoginArgs,
    session: &SessionContext,
    out: &dyn MessageHandler,
) -> Result<(), AppError> {
    let user = args.user();

    match &args.response {
        Some(path) => {
            let response = read_login_response(path)?;
            if response.access_token.trim().is_empty() {
                return Err(empty_token_error());
            }
            session.login_with_response(&response, user.clone());
        }
        None => {
            let token = match &args.token {
                Some(token) => SecretString::new(token.clone()),
                None => prompt_token()?,
            };
            if token.expose_secret().trim().is_empty() {
                return Err(empty_token_error());
            }
            session.login(token.expose_secret().trim(), user.clone());
        }
    }
    warn_if_not_persisted(session, out);

    match user {
        Some(user) => out.print(&format!("Logged in as {}.", user.username)),
        None => out.print("Token stored."),
    }
    Ok(())
}

fn empty_token_error() -> AppError {
    AppError::Generic {
        message: "Token must not be empty.".to_string(),
    }
}

fn read_login_response(path: &Path) -> Result<LoginResponse, AppError> {
    let contents = std::fs::read_to_string(path).map_err(|e| AppError::Generic {
        message: format!("Failed to read login response {:?}: {}", path, e),
    })?;
    serde_json::from_str(&contents).map_err(|e| AppError::Generic {
        message: format!("Failed to parse login response {:?}: {}", path, e),
    })
}

fn handle_logout_command(
    session: &SessionContext,
    out: &dyn MessageHandler,
) -> Result<(), AppError> {
    let was_authenticated = session.is_authenticated();
    session.logout();
    warn_if_not_persisted(session, out);

    if was_authenticated {
        out.print("Logged out.");
    } else {
        out.print("No token stored.");
    }
    Ok(())
}

fn handle_status_command(
    session: &SessionContext,
    config: &Config,
    out: &dyn MessageHandler,
) -> Result<(), AppError> {
    out.print("Chat Session - Status");
    out.print("=====================");
    out.print(&format!("Backend: {}", config.storage.backend));
    out.print(&format!("Location: {}", session.token().storage_location()));
    out.print(&format!("Key: {}", session.token().key()));
    out.print(&format!(
        "Logged in: {}",
        if session.is_authenticated() { "Yes" } else { "No" }
    ));
    match session.token().updated_at() {
        Ok(Some(updated_at)) => out.print(&format!("Last updated: {}", updated_at)),
        Ok(None) => {}
        Err(e) => tracing::debug!("Could not read last update time: {}", e),
    }
    if let Some(error) = session.token().last_storage_error() {
        out.print(&format!("Last storage error: {}", error));
    }
    Ok(())
}

fn prompt_token() -> Result<SecretString, AppError> {
    let token = rpassword::prompt_password("Token: ").map_err(|e| AppError::Generic {
        message: format!("Failed to read token: {}", e),
    })?;
    Ok(SecretString::new(token))
}

fn warn_if_not_persisted(session: &SessionContext, out: &dyn MessageHandler) {
    if let Some(error) = session.token().last_storage_error() {
        out.eprint(&format!(
            "Warning: the change was not saved to {} ({}).",
            session.token().storage_location(),
            error
        ));
    }
}

/// Keeps the first and last four characters of long tokens.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(8);
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
