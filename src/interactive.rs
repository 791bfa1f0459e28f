use std::{
    fmt,
    io::{self, Write},
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use colored::Colorize;
use inquire::{Confirm, InquireError, Select, Text};

use crate::{
    ai::{GeneratedOperationType, TextGenerator},
    environment::{ApiKeyPlacement, Auth, AuthMethod, EnvironmentProfile},
    executor::{print_execution_error, print_execution_result},
    introspection::print_schema_overview,
    operation::operation_kind,
    session::{Notice, NoticeLevel, Session},
    settings::{Settings, Theme},
    storage::KeyValueStore,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

pub async fn run_interactive<S, G>(session: &mut Session<S>, generator: &G) -> Result<()>
where
    S: KeyValueStore,
    G: TextGenerator,
{
    session.refresh_schema();
    let mut ui = InquireUi;
    run_interactive_with_ui(session, generator, &mut ui).await
}

pub(crate) async fn run_interactive_with_ui<S, G>(
    session: &mut Session<S>,
    generator: &G,
    ui: &mut dyn InteractiveUi,
) -> Result<()>
where
    S: KeyValueStore,
    G: TextGenerator,
{
    ui.print(&format!("gqlace v{} (built {})", VERSION, BUILD_TIMESTAMP));

    loop {
        ui.print(&status_line(session));

        let mut menu_items = vec![MenuItem::RunQuery];
        if response_has_errors(session) {
            menu_items.push(MenuItem::ExplainError);
        }
        if session.schema().is_some() {
            menu_items.push(MenuItem::Generate);
            menu_items.push(MenuItem::Summarize);
        }
        if !session.environments().list().is_empty() {
            menu_items.push(MenuItem::SwitchEnvironment);
        }
        menu_items.push(MenuItem::AddEnvironment);
        if session.current_environment().is_some() {
            menu_items.push(MenuItem::EditEnvironment);
            menu_items.push(MenuItem::DeleteEnvironment);
            menu_items.push(MenuItem::Schema);
        }
        if !session.history().is_empty() {
            menu_items.push(MenuItem::History);
        }
        menu_items.push(MenuItem::Settings);
        menu_items.push(MenuItem::Quit);

        let labels: Vec<String> = menu_items.iter().map(|item| item.to_string()).collect();
        let index = ui.select("gqlace", &labels, 0)?;
        let choice = menu_items
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("invalid menu selection"))?;

        match choice {
            MenuItem::RunQuery => handle_run(session, ui).await?,
            MenuItem::ExplainError => {
                if let Some(output) = session.explain_error(generator).await {
                    ui.print(&format!("{}\n{}", "Explanation".bold(), output.explanation));
                    ui.print(&format!("{}\n{}", "Suggested fix".bold(), output.suggested_fix));
                }
            }
            MenuItem::Generate => handle_generate(session, generator, ui).await?,
            MenuItem::Summarize => {
                if let Some(summary) = session.summarize_schema(generator).await {
                    ui.print(&format!("{}\n{}", "Schema summary".bold(), summary));
                }
            }
            MenuItem::SwitchEnvironment => handle_switch(session, ui)?,
            MenuItem::AddEnvironment => handle_add(session, ui)?,
            MenuItem::EditEnvironment => handle_edit(session, ui)?,
            MenuItem::DeleteEnvironment => handle_delete(session, ui)?,
            MenuItem::Schema => {
                session.settle().await;
                if let Some(schema) = session.schema() {
                    print_schema_overview(schema, false);
                }
            }
            MenuItem::History => handle_history(session, ui)?,
            MenuItem::Settings => handle_settings(session, ui)?,
            MenuItem::Quit => break,
        }

        print_notices(ui, session.take_notices());
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    RunQuery,
    ExplainError,
    Generate,
    Summarize,
    SwitchEnvironment,
    AddEnvironment,
    EditEnvironment,
    DeleteEnvironment,
    Schema,
    History,
    Settings,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::RunQuery => write!(f, "▶ Run query"),
            MenuItem::ExplainError => write!(f, "? Explain error"),
            MenuItem::Generate => write!(f, "✦ Generate operation"),
            MenuItem::Summarize => write!(f, "✦ Summarize schema"),
            MenuItem::SwitchEnvironment => write!(f, "⇄ Switch environment"),
            MenuItem::AddEnvironment => write!(f, "+ Add environment"),
            MenuItem::EditEnvironment => write!(f, "✎ Edit environment"),
            MenuItem::DeleteEnvironment => write!(f, "✗ Delete environment"),
            MenuItem::Schema => write!(f, "⌘ Schema"),
            MenuItem::History => write!(f, "↺ History"),
            MenuItem::Settings => write!(f, "⚙ Settings"),
            MenuItem::Quit => write!(f, "Quit"),
        }
    }
}

pub(crate) trait InteractiveUi {
    fn print(&mut self, message: &str);
    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<usize>;
    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>>;
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
    fn read_multiline(&mut self, prompt: &str) -> Result<Option<String>>;
}

struct InquireUi;

impl InteractiveUi for InquireUi {
    fn print(&mut self, message: &str) {
        println!("{}", message);
    }

    fn select(&mut self, prompt: &str, items: &[String], start: usize) -> Result<usize> {
        let choice = Select::new(prompt, items.to_vec())
            .with_page_size(12)
            .with_starting_cursor(start)
            .prompt()?;
        items
            .iter()
            .position(|item| item == &choice)
            .ok_or_else(|| anyhow!("selection not found"))
    }

    fn input(&mut self, prompt: &str, default: Option<&str>) -> Result<Option<String>> {
        let mut builder = Text::new(prompt);
        if let Some(value) = default {
            builder = builder.with_default(value);
        }
        match builder.prompt() {
            Ok(value) => Ok(Some(value)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        match Confirm::new(prompt).with_default(default).prompt() {
            Ok(value) => Ok(value),
            Err(other) => Err(other.into()),
        }
    }

    fn read_multiline(&mut self, prompt: &str) -> Result<Option<String>> {
        read_multiline_from_stdin(prompt)
    }
}

fn status_line<S: KeyValueStore>(session: &Session<S>) -> String {
    match session.current_environment() {
        Some(env) => format!(
            "{} {} {}",
            "Environment:".bold(),
            env.name.cyan(),
            format!("({}, {})", env.url, env.auth.describe()).dimmed()
        ),
        None => format!("{} {}", "Environment:".bold(), "none selected".yellow()),
    }
}

fn response_has_errors<S: KeyValueStore>(session: &Session<S>) -> bool {
    session
        .response()
        .and_then(|response| response.get("errors"))
        .is_some_and(|errors| !errors.is_null())
}

fn print_notices(ui: &mut dyn InteractiveUi, notices: Vec<Notice>) {
    for notice in notices {
        let title = match notice.level {
            NoticeLevel::Error => notice.title.red().bold(),
            NoticeLevel::Info => notice.title.green().bold(),
        };
        ui.print(&format!("{title}: {}", notice.description));
    }
}

async fn handle_run<S: KeyValueStore>(
    session: &mut Session<S>,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    ui.print("Enter the operation. Finish with an empty line (or press Ctrl+C to cancel).");
    let query = match ui.read_multiline("graphql>")? {
        Some(value) if !value.trim().is_empty() => value,
        _ => {
            if session.query().trim().is_empty() {
                ui.print("Run cancelled.");
                return Ok(());
            }
            session.query().to_string()
        }
    };
    let variables = ui
        .input("Variables (JSON)", Some(session.variables()))?
        .unwrap_or_default();

    session.set_query(query);
    session.set_variables(variables);

    let pretty = session.settings().auto_format;
    match session.run_query().await {
        Ok(result) => {
            if let Some(environment) = session.current_environment() {
                print_execution_result(&result, environment, pretty);
            }
        }
        Err(err) => print_execution_error(&err),
    }
    Ok(())
}

async fn handle_generate<S, G>(
    session: &mut Session<S>,
    generator: &G,
    ui: &mut dyn InteractiveUi,
) -> Result<()>
where
    S: KeyValueStore,
    G: TextGenerator,
{
    let kinds = [GeneratedOperationType::Query, GeneratedOperationType::Mutation];
    let labels = vec!["query".to_string(), "mutation".to_string()];
    let start = GeneratedOperationType::try_from(operation_kind(session.query()))
        .ok()
        .and_then(|kind| kinds.iter().position(|k| *k == kind))
        .unwrap_or(0);
    let operation_type = kinds
        .get(ui.select("Operation type", &labels, start)?)
        .copied()
        .unwrap_or(GeneratedOperationType::Query);
    let description = ui
        .input("Describe the data you need", None)?
        .unwrap_or_default();

    if session
        .generate_operation(generator, &description, operation_type)
        .await
    {
        ui.print(&format!("{}\n{}", "Generated operation".bold(), session.query()));
        ui.print("Run query and leave the editor empty to send it.");
    }
    Ok(())
}

fn environment_labels<S: KeyValueStore>(session: &Session<S>) -> Vec<String> {
    session
        .environments()
        .list()
        .iter()
        .map(|env| format!("{} ({})", env.name, env.url))
        .collect()
}

fn handle_switch<S: KeyValueStore>(
    session: &mut Session<S>,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    let mut labels = environment_labels(session);
    labels.push("(none)".to_string());
    let start = session
        .environments()
        .current_id()
        .and_then(|id| session.environments().list().iter().position(|env| env.id == id))
        .unwrap_or(0);
    let index = ui.select("Select environment", &labels, start)?;
    let id = session
        .environments()
        .list()
        .get(index)
        .map(|env| env.id.clone());
    session.select_environment(id.as_deref())?;
    Ok(())
}

fn handle_add<S: KeyValueStore>(session: &mut Session<S>, ui: &mut dyn InteractiveUi) -> Result<()> {
    let Some(profile) = prompt_profile(ui, None)? else {
        ui.print("Cancelled.");
        return Ok(());
    };
    match session.create_environment(profile) {
        Ok(_) => ui.print("Environment saved."),
        Err(err) => ui.print(&format!("Could not save environment: {err}")),
    }
    Ok(())
}

fn handle_edit<S: KeyValueStore>(session: &mut Session<S>, ui: &mut dyn InteractiveUi) -> Result<()> {
    let Some(current) = session.current_environment().cloned() else {
        return Ok(());
    };
    let Some(profile) = prompt_profile(ui, Some(&current.profile()))? else {
        ui.print("Cancelled.");
        return Ok(());
    };
    match session.update_environment(&current.id, profile) {
        Ok(_) => ui.print("Environment updated."),
        Err(err) => ui.print(&format!("Could not save environment: {err}")),
    }
    Ok(())
}

fn handle_delete<S: KeyValueStore>(
    session: &mut Session<S>,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    let Some(current) = session.current_environment().cloned() else {
        return Ok(());
    };
    if ui.confirm(&format!("Delete environment '{}'?", current.name), false)? {
        session.delete_environment(&current.id)?;
        ui.print(&format!("Deleted {}.", current.name));
    }
    Ok(())
}

fn prompt_profile(
    ui: &mut dyn InteractiveUi,
    existing: Option<&EnvironmentProfile>,
) -> Result<Option<EnvironmentProfile>> {
    let name = match ui.input("Name", existing.map(|p| p.name.as_str()))? {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => return Ok(None),
    };
    let url = match ui.input("URL", existing.map(|p| p.url.as_str()))? {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => return Ok(None),
    };
    let current_auth = existing.map(|p| p.auth.clone()).unwrap_or_default();
    let Some(auth) = prompt_auth(ui, &current_auth)? else {
        return Ok(None);
    };
    Ok(Some(EnvironmentProfile { name, url, auth }))
}

fn prompt_auth(ui: &mut dyn InteractiveUi, current: &Auth) -> Result<Option<Auth>> {
    let labels: Vec<String> = AuthMethod::ALL.iter().map(|m| m.to_string()).collect();
    let start = AuthMethod::ALL
        .iter()
        .position(|m| *m == current.method())
        .unwrap_or(0);
    let index = ui.select("Auth method", &labels, start)?;
    let method = AuthMethod::ALL
        .get(index)
        .copied()
        .ok_or_else(|| anyhow!("invalid auth method"))?;

    // details of a different method are not carried over
    let seed = if method == current.method() {
        current.clone()
    } else {
        Auth::empty(method)
    };

    let auth = match seed {
        Auth::None => Auth::None,
        Auth::BearerToken { token } => {
            let Some(token) = ui.input("Token", Some(&token))? else {
                return Ok(None);
            };
            Auth::BearerToken { token }
        }
        Auth::ApiKey { key, value, add_to } => {
            let Some(key) = ui.input("Key", Some(&key))? else {
                return Ok(None);
            };
            let Some(value) = ui.input("Value", Some(&value))? else {
                return Ok(None);
            };
            let placements = [ApiKeyPlacement::Header, ApiKeyPlacement::QueryParam];
            let labels: Vec<String> = placements.iter().map(|p| p.to_string()).collect();
            let start = placements.iter().position(|p| *p == add_to).unwrap_or(0);
            let add_to = placements
                .get(ui.select("Add to", &labels, start)?)
                .copied()
                .unwrap_or_default();
            Auth::ApiKey { key, value, add_to }
        }
        Auth::BasicAuth { user, pass } => {
            let Some(user) = ui.input("Username", Some(&user))? else {
                return Ok(None);
            };
            let Some(pass) = ui.input("Password", Some(&pass))? else {
                return Ok(None);
            };
            Auth::BasicAuth { user, pass }
        }
    };
    Ok(Some(auth))
}

fn handle_history<S: KeyValueStore>(
    session: &mut Session<S>,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    let mut labels: Vec<String> = session
        .history()
        .items()
        .iter()
        .map(|item| {
            let env_name = session
                .environments()
                .get(&item.environment_id)
                .map(|env| env.name.as_str())
                .unwrap_or("Unknown");
            format!(
                "{} · {} · {}",
                item.label(),
                env_name,
                format_relative(item.timestamp)
            )
        })
        .collect();
    labels.push("Clear history".to_string());
    labels.push("Back".to_string());

    let index = ui.select("History", &labels, 0)?;
    let count = session.history().len();
    if index == count {
        if ui.confirm("Clear all history?", false)? {
            session.clear_history()?;
        }
        return Ok(());
    }
    let Some(id) = session.history().items().get(index).map(|item| item.id.clone()) else {
        return Ok(());
    };

    if let Some(item) = session.load_history(&id)? {
        ui.print(&format!("{}\n{}", "Query".bold(), item.query));
        if let Some(variables) = &item.variables {
            ui.print(&format!("{}\n{}", "Variables".bold(), variables));
        }
        let rendered = crate::executor::format_payload(&item.response, session.settings().auto_format);
        ui.print(&format!("{}\n{}", "Response".bold(), rendered));
    }
    Ok(())
}

fn handle_settings<S: KeyValueStore>(
    session: &mut Session<S>,
    ui: &mut dyn InteractiveUi,
) -> Result<()> {
    let current = session.settings();
    let auto_format = ui.confirm("Pretty-print responses?", current.auto_format)?;
    let labels: Vec<String> = Theme::ALL.iter().map(|t| t.to_string()).collect();
    let start = Theme::ALL.iter().position(|t| *t == current.theme).unwrap_or(0);
    let theme = Theme::ALL
        .get(ui.select("Theme", &labels, start)?)
        .copied()
        .unwrap_or_default();

    session.update_settings(Settings { auto_format, theme })?;
    ui.print("Settings saved.");
    Ok(())
}

fn format_relative(timestamp_ms: i64) -> String {
    let now = Utc::now().timestamp_millis();
    let delta = now.saturating_sub(timestamp_ms).max(0) / 1000;
    if delta < 60 {
        return format!("{}s ago", delta);
    }
    if delta < 3600 {
        return format!("{}m ago", delta / 60);
    }
    if delta < 86400 {
        return format!("{}h ago", delta / 3600);
    }
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(time) => {
            let local: DateTime<Local> = time.with_timezone(&Local);
            local.format("%Y-%m-%d %H:%M").to_string()
        }
        None => "unknown".to_string(),
    }
}

fn read_multiline_from_stdin(prompt: &str) -> Result<Option<String>> {
    let stdin = io::stdin();
    let mut lines = Vec::new();

    loop {
        print!("{} ", prompt);
        io::stdout().flush()?;

        let mut buffer = String::new();
        let bytes = stdin.read_line(&mut buffer)?;
        if bytes == 0 {
            // EOF
            return Ok(if lines.is_empty() {
                None
            } else {
                Some(lines.join("\n"))
            });
        }

        let trimmed = buffer.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            if lines.is_empty() {
                return Ok(None);
            }
            break;
        }
        lines.push(trimmed.to_string());
    }

    Ok(Some(lines.join("\n")))
}
