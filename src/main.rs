use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use social_client::config::Config;
use social_client::net::format_service_error;
use social_client::{
    codec, Activity, Comment, CrudService, Identity, PagedListAccess, Record, SocialClient,
    StreamKind,
};
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Command-line client for the social REST API
#[derive(Parser, Debug)]
#[command(name = "social-client", version, about, long_about = None)]
struct Args {
    /// Server root, e.g. http://localhost:8080
    #[arg(short, long)]
    server: Option<String>,

    /// User to authenticate as (anonymous when omitted)
    #[arg(short, long)]
    user: Option<String>,

    /// Password of --user
    #[arg(short, long, env = "SOCIAL_CLIENT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Activities, comments and likes
    #[command(subcommand)]
    Activity(ActivityCommand),

    /// Load a window of an identity's activity stream
    Stream {
        identity_id: String,
        #[arg(short, long, value_enum, default_value = "user")]
        kind: KindArg,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Page through the whole stream, `limit` items at a time
        #[arg(long)]
        all: bool,
    },

    /// Count the activities of an identity's stream
    StreamSize {
        identity_id: String,
        #[arg(short, long, value_enum, default_value = "user")]
        kind: KindArg,
    },

    /// Identities
    #[command(subcommand)]
    Identity(IdentityCommand),

    /// Persisted settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ActivityCommand {
    Get {
        id: String,
        /// Also fetch stream metadata
        #[arg(long)]
        stream: bool,
        /// Also fetch the poster identity
        #[arg(long)]
        poster: bool,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(long = "type")]
        activity_type: Option<String>,
    },
    Delete {
        id: String,
    },
    Comments {
        id: String,
    },
    /// Comment on an activity
    Comment {
        id: String,
        text: String,
    },
    /// Delete a comment
    Uncomment {
        id: String,
        comment_id: String,
    },
    /// Identities liking an activity
    Likes {
        id: String,
    },
    Like {
        id: String,
    },
    Unlike {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum IdentityCommand {
    Get {
        id: String,
    },
    /// Resolve an identity from its provider and remote id
    Lookup {
        provider: String,
        remote_id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    SetServer { server_url: String },
    SetUser { username: String },
    Show,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    User,
    Spaces,
    Connections,
    Feed,
}

impl From<KindArg> for StreamKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::User => StreamKind::User,
            KindArg::Spaces => StreamKind::Spaces,
            KindArg::Connections => StreamKind::Connections,
            KindArg::Feed => StreamKind::Feed,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("social-client started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("social-client").join("social-client.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".social-client").join("social-client.log");
    }
    PathBuf::from("social-client.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    if let Command::Config(command) = &args.command {
        return run_config(command, &mut config);
    }

    let client = connect(&args, &config)?;
    if let Err(err) = run(&client, args.command).await {
        tracing::error!("Command failed: {:?}", err);
        let message = match err.downcast_ref::<social_client::Error>() {
            Some(err) => format_service_error(err),
            None => format!("{:#}", err),
        };
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }

    Ok(())
}

/// Build a client and start the session (flag > environment > config file)
fn connect(args: &Args, config: &Config) -> Result<SocialClient> {
    let client_config = config.client_config(args.server.as_deref());
    tracing::info!("Using server: {}", client_config.server_url);
    let client = SocialClient::new(client_config).context("Failed to create client")?;

    let username = args.user.clone().or_else(|| config.effective_username());
    match (username, args.password.as_deref()) {
        (Some(username), Some(password)) => client.start_session_as(&username, password),
        (Some(username), None) => anyhow::bail!(
            "No password for {}. Use --password or SOCIAL_CLIENT_PASSWORD",
            username
        ),
        (None, _) => client.start_session_as_anonymous(),
    }

    Ok(client)
}

async fn run(client: &SocialClient, command: Command) -> Result<()> {
    match command {
        Command::Activity(command) => run_activity(client, command).await,
        Command::Stream {
            identity_id,
            kind,
            offset,
            limit,
            all,
        } => {
            let access: PagedListAccess<Activity> =
                PagedListAccess::new(client.clone(), identity_id, kind.into());
            let activities = if all {
                access.load_all(limit).await?
            } else {
                access.load(offset, window_end(offset, limit)).await?
            };
            print_records(&activities)
        }
        Command::StreamSize { identity_id, kind } => {
            let access: PagedListAccess<Activity> =
                PagedListAccess::new(client.clone(), identity_id, kind.into());
            println!("{}", access.size().await?);
            Ok(())
        }
        Command::Identity(IdentityCommand::Get { id }) => {
            print_record(&client.identities().get(&id).await?)
        }
        Command::Identity(IdentityCommand::Lookup {
            provider,
            remote_id,
        }) => print_record(&client.identities().find(&provider, &remote_id).await?),
        Command::Config(_) => Ok(()),
    }
}

async fn run_activity(client: &SocialClient, command: ActivityCommand) -> Result<()> {
    let activities = client.activities();

    match command {
        ActivityCommand::Get { id, stream, poster } => {
            let mut activity = activities.get(&id).await?;
            if stream {
                activities.activity_stream(&mut activity).await?;
            }
            if poster {
                activities.poster_identity(&mut activity).await?;
            }
            print_record(&activity)
        }
        ActivityCommand::Create {
            title,
            body,
            activity_type,
        } => {
            let mut activity = Activity::new();
            activity.set_title(title);
            if let Some(body) = body {
                activity.set_body(body);
            }
            if let Some(activity_type) = activity_type {
                activity.set_activity_type(activity_type);
            }
            print_record(&activities.create(&activity).await?)
        }
        ActivityCommand::Delete { id } => {
            print_record(&activities.delete(&activity_ref(id)).await?)
        }
        ActivityCommand::Comments { id } => {
            print_records(&activities.comments(&activity_ref(id)).await?)
        }
        ActivityCommand::Comment { id, text } => {
            let comment = Comment::with_text(text);
            print_record(&activities.create_comment(&activity_ref(id), &comment).await?)
        }
        ActivityCommand::Uncomment { id, comment_id } => {
            let mut comment = Comment::new();
            comment.set_id(comment_id);
            comment.set_activity_id(id);
            print_record(&activities.delete_comment(&comment).await?)
        }
        ActivityCommand::Likes { id } => {
            let identities: Vec<Identity> = activities.likes(&activity_ref(id)).await?;
            print_records(&identities)
        }
        ActivityCommand::Like { id } => print_record(&activities.like(&activity_ref(id)).await?),
        ActivityCommand::Unlike { id } => {
            print_record(&activities.unlike(&activity_ref(id)).await?)
        }
    }
}

fn run_config(command: &ConfigCommand, config: &mut Config) -> Result<()> {
    match command {
        ConfigCommand::SetServer { server_url } => {
            config.set_server_url(server_url)?;
            println!("Server set to {}", server_url);
        }
        ConfigCommand::SetUser { username } => {
            config.set_username(username)?;
            println!("User set to {}", username);
        }
        ConfigCommand::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
            println!("effective server: {}", config.effective_server_url());
        }
    }
    Ok(())
}

/// Exclusive end of the `--offset`/`--limit` window, saturating at `usize::MAX`
fn window_end(offset: usize, limit: usize) -> usize {
    offset.saturating_add(limit)
}

/// An activity known only by id
fn activity_ref(id: String) -> Activity {
    let mut activity = Activity::new();
    activity.set_id(id);
    activity
}

fn print_record<R: Record>(record: &R) -> Result<()> {
    let value = codec::encode_value(record)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_records<R: Record>(records: &[R]) -> Result<()> {
    let values = records
        .iter()
        .map(codec::encode_value)
        .collect::<Result<Vec<Value>, _>>()?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_end_saturates() {
        assert_eq!(window_end(0, 20), 20);
        assert_eq!(window_end(usize::MAX, 20), usize::MAX);
        assert_eq!(window_end(usize::MAX - 5, 20), usize::MAX);
    }

    #[test]
    fn test_stream_args_accept_huge_offset() {
        let args = Args::try_parse_from([
            "social-client",
            "stream",
            "root",
            "--offset",
            usize::MAX.to_string().as_str(),
        ])
        .unwrap();
        let Command::Stream { offset, limit, .. } = args.command else {
            panic!("expected stream command");
        };
        assert_eq!(window_end(offset, limit), usize::MAX);
    }
}
