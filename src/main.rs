use chat_session::cli::{Cli, Commands, handle_command};
use chat_session::config::{config_file_path, load_config_from};
use chat_session::traits::{DefaultMessageHandler, MessageHandler};
use chat_session::{SessionContext, User};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    let out = DefaultMessageHandler;

    let config_path = cli.config.clone().unwrap_or_else(config_file_path);
    let mut config = load_config_from(&config_path).unwrap_or_else(|e| {
        out.eprint(&format!("Failed to load config {:?}: {}", config_path, e));
        std::process::exit(1);
    });
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Keep the guard alive to ensure log messages are flushed
    let _guard = match chat_session::logger::setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            out.eprint(&format!("{}", e));
            None
        }
    };

    let session = SessionContext::from_config(&config);

    let _token_watch = session.token().subscribe(|token: &Option<String>| {
        tracing::debug!(
            "Token {}",
            if token.is_some() { "present" } else { "absent" }
        );
    });
    let _user_watch = session.user().subscribe(|user: &Option<User>| match user {
        Some(user) => tracing::debug!("User set to {} <{}>", user.username, user.email),
        None => tracing::debug!("User cleared"),
    });

    let command = cli.command.unwrap_or(Commands::Status);
    if let Err(e) = handle_command(command, &session, &config, &out) {
        tracing::error!("{}", e);
        out.eprint(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
