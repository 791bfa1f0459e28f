use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use gqlace::{
    ai::Unconfigured,
    config::{load_config, WorkspaceBuilder},
    environment::{ApiKeyPlacement, Auth, AuthMethod, EnvironmentProfile, EnvironmentStore},
    executor::{format_payload, print_execution_result, Executor},
    interactive::run_interactive,
    introspection::{fetch_schema, print_schema_overview},
    operation::display_name,
    session::{Notice, NoticeLevel, Session},
    settings::{Settings, Theme},
    storage::KeyValueStore,
};

#[derive(Parser, Debug)]
#[command(
    name = "gqlace",
    version,
    about = "GraphQL client for named API environments",
    disable_help_subcommand = true
)]
struct Cli {
    /// Directory or file containing gqlace.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override base directory used for resolving paths
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Directory holding saved environments, history and settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this environment (by name) instead of the selected one
    #[arg(short, long, global = true)]
    env: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a query or mutation
    Run(RunArgs),
    /// Introspect and print the schema of the environment
    Schema {
        /// Show the fields of each root field's type
        #[arg(long)]
        expand: bool,
        /// Print a plain-text digest instead
        #[arg(long)]
        digest: bool,
    },
    /// Manage environments
    #[command(subcommand)]
    Env(EnvCommand),
    /// Inspect run history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// File containing the operation ("-" reads stdin)
    #[arg(value_name = "FILE", conflicts_with = "query")]
    file: Option<PathBuf>,

    /// Operation text
    #[arg(short, long)]
    query: Option<String>,

    /// Variables as JSON text
    #[arg(long, conflicts_with = "variables_file")]
    variables: Option<String>,

    /// File containing variables JSON
    #[arg(long)]
    variables_file: Option<PathBuf>,

    /// Pretty-print the response regardless of settings
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Print the response on one line regardless of settings
    #[arg(long)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum EnvCommand {
    /// List environments
    List,
    /// Add an environment and select it
    Add {
        name: String,
        url: String,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Replace the URL or auth of an environment
    Update {
        name: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        rename: Option<String>,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Select an environment
    Select { name: String },
    /// Delete an environment
    Remove { name: String },
}

#[derive(Args, Debug)]
struct AuthArgs {
    /// none, bearer, api-key or basic
    #[arg(long)]
    auth: Option<AuthMethod>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    key: Option<String>,
    #[arg(long)]
    value: Option<String>,
    /// header or query-param
    #[arg(long)]
    add_to: Option<ApiKeyPlacement>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    pass: Option<String>,
}

impl AuthArgs {
    fn into_auth(self) -> Auth {
        match self.auth.unwrap_or(AuthMethod::None) {
            AuthMethod::None => Auth::None,
            AuthMethod::BearerToken => Auth::BearerToken {
                token: self.token.unwrap_or_default(),
            },
            AuthMethod::ApiKey => Auth::ApiKey {
                key: self.key.unwrap_or_default(),
                value: self.value.unwrap_or_default(),
                add_to: self.add_to.unwrap_or_default(),
            },
            AuthMethod::BasicAuth => Auth::BasicAuth {
                user: self.user.unwrap_or_default(),
                pass: self.pass.unwrap_or_default(),
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List recent runs, newest first
    List {
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Print a run by its position in the list (1 is newest) or id
    Show { entry: String },
    /// Delete all history
    Clear,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        auto_format: Option<bool>,
        #[arg(long)]
        theme: Option<Theme>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let base_dir = cli
        .cwd
        .as_ref()
        .map(|p| resolve_path(Path::new(p)))
        .transpose()?
        .unwrap_or(std::env::current_dir()?);

    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&base_dir, p))
        .unwrap_or_else(|| base_dir.clone());

    let cfg = load_config(&config_target).context("loading configuration")?;
    let workspace = WorkspaceBuilder::new(base_dir, cfg, cli.data_dir.clone()).build();
    tracing::debug!(data_dir = %workspace.data_dir.display(), "using data directory");

    let storage = workspace.open_store()?;
    let mut environments = EnvironmentStore::load(storage.clone());
    workspace.apply_default_environment(&mut environments)?;

    let mut session = Session::open(storage, Executor::new());

    let env_override = match cli.env.as_deref() {
        Some(name) => Some(
            environments
                .find_by_name(name)
                .map(|env| env.id.clone())
                .ok_or_else(|| anyhow!("no environment named '{name}'"))?,
        ),
        None => None,
    };

    match cli.command {
        None => run_interactive(&mut session, &Unconfigured).await?,
        Some(Commands::Run(args)) => handle_run(&mut session, args, env_override).await?,
        Some(Commands::Schema { expand, digest }) => {
            handle_schema(&session, env_override, expand, digest).await?
        }
        // Edits go straight to the store so no schema fetch is started.
        Some(Commands::Env(command)) => handle_env(&mut environments, command)?,
        Some(Commands::History(command)) => handle_history(&mut session, command)?,
        Some(Commands::Settings(command)) => handle_settings(&mut session, command)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    if verbose {
        filter = filter.add_directive("gqlace=debug".parse()?);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    Ok(())
}

async fn handle_run<S: KeyValueStore>(
    session: &mut Session<S>,
    args: RunArgs,
    env_override: Option<String>,
) -> Result<()> {
    let query = match (&args.query, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) if path.as_os_str() == "-" => read_stdin()?,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading operation {}", path.display()))?,
        (None, None) => bail!("provide an operation file or --query"),
    };
    let variables = match (&args.variables, &args.variables_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading variables {}", path.display()))?,
        (None, None) => String::new(),
    };

    session.set_query(query);
    session.set_variables(variables);

    let pretty = if args.pretty {
        true
    } else if args.compact {
        false
    } else {
        session.settings().auto_format
    };

    let outcome = match env_override.as_deref() {
        Some(id) => session.run_query_in(id).await,
        None => session.run_query().await,
    };

    match outcome {
        Ok(result) => {
            let environment = env_override
                .as_deref()
                .and_then(|id| session.environments().get(id))
                .or_else(|| session.current_environment());
            if let Some(environment) = environment {
                print_execution_result(&result, environment, pretty);
            }
            Ok(())
        }
        Err(err) => {
            session.take_notices();
            Err(err).context("request failed")
        }
    }
}

async fn handle_schema<S: KeyValueStore>(
    session: &Session<S>,
    env_override: Option<String>,
    expand: bool,
    digest: bool,
) -> Result<()> {
    let environment = match env_override.as_deref() {
        Some(id) => session.environments().get(id),
        None => session.current_environment(),
    }
    .ok_or_else(|| anyhow!("no environment selected; add one with `gqlace env add`"))?;

    let schema = fetch_schema(&Executor::new(), environment)
        .await
        .with_context(|| format!("introspecting {}", environment.name))?;

    if digest {
        print!("{}", schema.digest());
    } else {
        print_schema_overview(&schema, expand);
    }
    Ok(())
}

fn handle_env<S: KeyValueStore>(
    environments: &mut EnvironmentStore<S>,
    command: EnvCommand,
) -> Result<()> {
    match command {
        EnvCommand::List => {
            let current = environments.current_id().map(str::to_string);
            if environments.list().is_empty() {
                println!("No environments configured.");
            }
            for env in environments.list() {
                let marker = if current.as_deref() == Some(env.id.as_str()) {
                    "*".green().bold().to_string()
                } else {
                    " ".to_string()
                };
                println!(
                    "{marker} {} {} {}",
                    env.name.bold(),
                    env.url.cyan(),
                    format!("({})", env.auth.describe()).dimmed()
                );
            }
        }
        EnvCommand::Add { name, url, auth } => {
            let profile = EnvironmentProfile::new(name, url).with_auth(auth.into_auth());
            let id = environments.create(profile)?.id.clone();
            println!("Added environment {id}");
        }
        EnvCommand::Update {
            name,
            url,
            rename,
            auth,
        } => {
            let existing = environments
                .find_by_name(&name)
                .cloned()
                .ok_or_else(|| anyhow!("no environment named '{name}'"))?;
            let mut profile = existing.profile();
            if let Some(url) = url {
                profile.url = url;
            }
            if let Some(rename) = rename {
                profile.name = rename;
            }
            if auth.auth.is_some() {
                profile.auth = auth.into_auth();
            }
            environments.update(&existing.id, profile)?;
            println!("Updated {}", existing.name);
        }
        EnvCommand::Select { name } => {
            let id = environments
                .find_by_name(&name)
                .map(|env| env.id.clone())
                .ok_or_else(|| anyhow!("no environment named '{name}'"))?;
            environments.select(Some(id.as_str()))?;
            println!("Selected {name}");
        }
        EnvCommand::Remove { name } => {
            let id = environments
                .find_by_name(&name)
                .map(|env| env.id.clone())
                .ok_or_else(|| anyhow!("no environment named '{name}'"))?;
            environments.delete(&id)?;
            println!("Removed {name}");
        }
    }
    Ok(())
}

fn handle_history<S: KeyValueStore>(
    session: &mut Session<S>,
    command: HistoryCommand,
) -> Result<()> {
    match command {
        HistoryCommand::List { limit } => {
            if session.history().is_empty() {
                println!("No history yet.");
            }
            for (position, item) in session.history().items().iter().take(limit).enumerate() {
                let env_name = session
                    .environments()
                    .get(&item.environment_id)
                    .map(|env| env.name.as_str())
                    .unwrap_or("Unknown");
                let when = item
                    .recorded_at()
                    .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!(
                    "{:>3} {} {} {}",
                    position + 1,
                    display_name(item.operation_name.as_deref()).bold(),
                    env_name.cyan(),
                    when.dimmed()
                );
            }
        }
        HistoryCommand::Show { entry } => {
            let id = match entry.parse::<usize>() {
                Ok(position) if position >= 1 => session
                    .history()
                    .items()
                    .get(position - 1)
                    .map(|item| item.id.clone()),
                _ => Some(entry.clone()),
            };
            let item = id
                .and_then(|id| session.history().get(&id).cloned())
                .ok_or_else(|| anyhow!("no history entry '{entry}'"))?;
            let pretty = session.settings().auto_format;
            println!("{}\n{}", "Query".bold(), item.query);
            if let Some(variables) = &item.variables {
                println!("{}\n{}", "Variables".bold(), variables);
            }
            println!("{}\n{}", "Response".bold(), format_payload(&item.response, pretty));
        }
        HistoryCommand::Clear => {
            session.clear_history()?;
            print_notices(session.take_notices());
        }
    }
    Ok(())
}

fn handle_settings<S: KeyValueStore>(
    session: &mut Session<S>,
    command: SettingsCommand,
) -> Result<()> {
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Set { auto_format, theme } => {
            let current = session.settings();
            session.update_settings(Settings {
                auto_format: auto_format.unwrap_or(current.auto_format),
                theme: theme.unwrap_or(current.theme),
            })?;
        }
    }
    let settings = session.settings();
    println!("autoFormat: {}", settings.auto_format);
    println!("theme: {}", settings.theme);
    Ok(())
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        let title = match notice.level {
            NoticeLevel::Error => notice.title.red().bold(),
            NoticeLevel::Info => notice.title.green().bold(),
        };
        eprintln!("{title}: {}", notice.description);
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("reading operation from stdin")?;
    Ok(buffer)
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
