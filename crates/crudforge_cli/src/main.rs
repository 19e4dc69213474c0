//! `crudforge` command-line harness over the persistence core.
//!
//! Settings come from `--config` (TOML), `CRUDFORGE_*` environment variables
//! and `--database`, in increasing precedence. The default database is
//! in-memory, so pass `--database` to keep data between runs.

use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use crudforge_core::{
    attributes, default_registry, init_logging, CoreSettings, Session, Todo, TodoRepository,
    UserRepository, UserService, ValidatorRegistry,
};
use log::info;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Entity persistence core harness")]
struct Cli {
    /// Path to an optional TOML settings file.
    #[arg(short, long, default_value = "crudforge.toml")]
    config: PathBuf,

    /// Database URL, e.g. `sqlite://data/app.db`; overrides settings.
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core health and version.
    Ping,
    #[command(subcommand)]
    Todo(TodoCommand),
    #[command(subcommand)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum TodoCommand {
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    List {
        #[arg(long)]
        completed: Option<bool>,
        /// Substring filter on the title.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    /// Toggle completion.
    Done { id: String },
    Rm { id: String },
}

#[derive(Subcommand)]
enum UserCommand {
    Add {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings =
        CoreSettings::load(Some(&cli.config)).context("failed to load settings")?;
    if let Some(url) = cli.database {
        settings.database_url = url;
    }
    if let Some(log_config) = settings.log_config() {
        init_logging(&log_config).context("failed to initialize logging")?;
    }

    if let Command::Ping = cli.command {
        println!("crudforge_core ping={}", crudforge_core::ping());
        println!("crudforge_core version={}", crudforge_core::core_version());
        return Ok(());
    }

    let registry = default_registry().context("failed to register schemas")?;
    let session = settings
        .session_factory()
        .and_then(|factory| factory.open_session())
        .with_context(|| format!("failed to open `{}`", settings.database_url))?;
    info!("event=cli_start module=cli status=ok database={}", settings.database_url);

    match cli.command {
        Command::Ping => Ok(()),
        Command::Todo(command) => run_todo(&session, &registry, command),
        Command::User(command) => run_user(&session, &registry, command),
    }
}

fn run_todo(
    session: &Session,
    registry: &ValidatorRegistry,
    command: TodoCommand,
) -> anyhow::Result<()> {
    let repo = TodoRepository::try_new(session, registry)?;
    match command {
        TodoCommand::Add { title, description } => {
            let mut builder = registry.builder::<Todo>().with_attribute("title", title);
            if let Some(description) = description {
                builder = builder.with_attribute("description", description);
            }
            let todo = repo.save(builder.build()?)?;
            print_json(&todo)
        }
        TodoCommand::List {
            completed,
            search,
            skip,
            limit,
        } => {
            let todos = match (completed, search) {
                (Some(_), Some(_)) => bail!("--completed and --search are mutually exclusive"),
                (Some(completed), None) => repo.find_by_completed(completed, skip, limit)?,
                (None, Some(needle)) => repo.find_by_title_contains(&needle, skip, limit)?,
                (None, None) => repo.find_all(skip, limit)?,
            };
            print_json(&todos)
        }
        TodoCommand::Done { id } => match repo.toggle_completed(&id)? {
            Some(todo) => print_json(&todo),
            None => bail!("todo `{id}` not found"),
        },
        TodoCommand::Rm { id } => {
            if !repo.delete(&id)? {
                bail!("todo `{id}` not found");
            }
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn run_user(
    session: &Session,
    registry: &ValidatorRegistry,
    command: UserCommand,
) -> anyhow::Result<()> {
    let service = UserService::new(UserRepository::try_new(session, registry)?);
    match command {
        UserCommand::Add {
            username,
            email,
            password,
            full_name,
        } => {
            let user = service.create_user(&attributes([
                ("username", Value::from(username)),
                ("email", Value::from(email)),
                ("password", Value::from(password)),
                ("full_name", Value::from(full_name)),
            ]))?;
            print_json(&user)
        }
        UserCommand::Login { username, password } => {
            match service.authenticate_user(&username, &password)? {
                Some(user) => print_json(&user),
                None => bail!("invalid credentials for `{username}`"),
            }
        }
        UserCommand::List { skip, limit } => print_json(&service.list_users(skip, limit)?),
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
