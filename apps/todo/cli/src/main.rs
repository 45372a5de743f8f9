//! Todo CLI
//!
//! Manage todos against the persisted local store or the remote todo API.
//! The backend comes from `TODO_BACKEND` and can be overridden per call.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{BackendConfig, BackendKind, Environment, FromEnv};
use domain_todos::conversions::wire_datetime;
use domain_todos::{
    cancellable, parse_tags, CancelToken, Filter, NewTodo, Priority, SortBy, TodoError, TodoId,
    TodoPatch, TodoRepository, TodoResult, TodoService,
};
use eyre::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

mod backend;
mod render;

use backend::Overrides;
use render::Output;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Manage todos in a local store or on the remote todo API")]
struct Cli {
    /// Backend to use (local, remote). Overrides TODO_BACKEND.
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Remote API base URL. Overrides TODO_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Local data directory. Overrides TODO_DATA_DIR.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a todo
    Add(AddArgs),

    /// Show todos; without query flags the saved filter, search and sort apply
    List(ListArgs),

    /// Show one todo in full
    Show { id: String },

    /// Flip a todo between active and completed
    Toggle { id: String },

    /// Change fields of a todo
    Edit(EditArgs),

    /// Delete a todo
    Delete { id: String },

    /// Set the list filter (all, active, completed)
    Filter { filter: Filter },

    /// Set the sort key (date, priority, alphabetical)
    Sort { sort_by: SortBy },

    /// Set the search query; no words clears it
    Search { query: Vec<String> },

    /// Switch between light and dark theme
    Theme,

    /// Dashboard counts and recent todos
    Stats {
        /// How many recent todos to show
        #[arg(short, long, default_value_t = 5)]
        recent: usize,
    },

    /// Check that the backend is reachable
    Health,
}

#[derive(Args)]
struct AddArgs {
    title: String,

    #[arg(short, long, default_value = "")]
    description: String,

    #[arg(short, long, default_value_t = Priority::Medium)]
    priority: Priority,

    /// Due date, `YYYY-MM-DD` (end of day) or `YYYY-MM-DDTHH:MM`, UTC
    #[arg(long, value_parser = parse_due)]
    due: Option<DateTime<Utc>>,

    /// Comma separated tags
    #[arg(short, long, default_value = "")]
    tags: String,

    #[arg(short, long)]
    category: Option<String>,

    #[arg(long)]
    reminder: bool,

    #[arg(long)]
    notes: Option<String>,
}

impl AddArgs {
    fn into_new_todo(self) -> NewTodo {
        NewTodo {
            title: self.title,
            description: self.description,
            completed: false,
            due_date: self.due,
            priority: self.priority,
            tags: parse_tags(&self.tags),
            category: self.category,
            reminder: self.reminder,
            notes: self.notes,
        }
    }
}

#[derive(Args)]
struct ListArgs {
    /// Only todos in this category
    #[arg(short, long, conflicts_with_all = ["priority", "due_before"])]
    category: Option<String>,

    /// Only todos with this priority
    #[arg(short, long, conflicts_with = "due_before")]
    priority: Option<Priority>,

    /// Only todos due before this date
    #[arg(long, value_parser = parse_due)]
    due_before: Option<DateTime<Utc>>,

    /// Every todo in backend order, ignoring filter and search
    #[arg(short, long)]
    all: bool,
}

impl ListArgs {
    /// What a direct query selects; `None` when the saved view applies
    fn scope(&self) -> Option<String> {
        if let Some(category) = &self.category {
            Some(format!("category: {}", category.trim()))
        } else if let Some(priority) = self.priority {
            Some(format!("priority: {}", priority))
        } else if let Some(before) = self.due_before {
            Some(format!("due before: {}", before.format(render::DATE_FORMAT)))
        } else if self.all {
            Some("all todos".to_string())
        } else {
            None
        }
    }
}

#[derive(Args)]
struct EditArgs {
    id: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    #[arg(short, long)]
    priority: Option<Priority>,

    #[arg(long, value_parser = parse_due, conflicts_with = "clear_due")]
    due: Option<DateTime<Utc>>,

    /// Remove the due date
    #[arg(long)]
    clear_due: bool,

    /// Comma separated tags, replacing the current ones
    #[arg(short, long)]
    tags: Option<String>,

    /// New category; an empty value clears it
    #[arg(short, long)]
    category: Option<String>,

    /// New notes; an empty value clears them
    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    reminder: Option<bool>,

    #[arg(long)]
    completed: Option<bool>,
}

impl EditArgs {
    fn into_patch(self) -> (TodoId, TodoPatch) {
        let due_date = match (self.due, self.clear_due) {
            (Some(due), _) => Some(Some(due)),
            (None, true) => Some(None),
            (None, false) => None,
        };

        let patch = TodoPatch {
            title: self.title,
            description: self.description,
            completed: self.completed,
            due_date,
            priority: self.priority,
            tags: self.tags.as_deref().map(parse_tags),
            category: self.category.map(Some),
            reminder: self.reminder,
            notes: self.notes.map(Some),
        };
        (TodoId::new(self.id), patch)
    }
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Some(due) = wire_datetime::parse(raw) {
        return Ok(due);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM", raw))
}

type Service = TodoService<Box<dyn TodoRepository>>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let config = backend::apply_overrides(
        BackendConfig::from_env()?,
        Overrides {
            backend: cli.backend,
            api_url: cli.api_url,
            data_dir: cli.data_dir,
        },
    );
    info!(backend = %config.kind, "Starting todo CLI");

    // Ctrl-C discards whatever is in flight instead of acting on a late result
    let token = CancelToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let output = Output::new(cli.json);
    let outcome = cancellable(&token, execute(&config, cli.command, &output)).await;

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(exit_code(&e))
        }
    }
}

fn exit_code(err: &TodoError) -> ExitCode {
    match err {
        TodoError::Validation(_) => ExitCode::from(2),
        TodoError::Cancelled => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    }
}

async fn execute(config: &BackendConfig, command: Commands, output: &Output) -> TodoResult<()> {
    let service: Service = TodoService::new(backend::open_repository(config)?);
    run(&service, config, command, output).await
}

async fn run(
    service: &Service,
    config: &BackendConfig,
    command: Commands,
    output: &Output,
) -> TodoResult<()> {
    match command {
        Commands::Add(args) => {
            let todo = service.create_todo(args.into_new_todo()).await?;
            let theme = service.view_state().await?.theme;
            output.changed("Added", &todo, theme)
        }

        Commands::List(args) => {
            let view = service.view_state().await?;
            let scope = args.scope();
            let todos = if let Some(category) = args.category {
                service.todos_by_category(&category).await?
            } else if let Some(priority) = args.priority {
                service.todos_by_priority(priority).await?
            } else if let Some(before) = args.due_before {
                service.todos_due_before(before).await?
            } else if args.all {
                service.list_todos().await?
            } else {
                service.visible_todos().await?
            };
            debug!(count = todos.len(), "Listing todos");
            output.todo_list(&todos, &view, scope.as_deref())
        }

        Commands::Show { id } => {
            let theme = service.view_state().await?.theme;
            match service.get_todo(&TodoId::new(id.clone())).await? {
                Some(todo) => output.todo_detail(&todo, theme),
                None => output.not_found(&id),
            }
        }

        Commands::Toggle { id } => {
            let theme = service.view_state().await?.theme;
            match service.toggle_todo(&TodoId::new(id.clone())).await? {
                Some(todo) => {
                    let verb = if todo.completed { "Completed" } else { "Reopened" };
                    output.changed(verb, &todo, theme)
                }
                None => output.not_found(&id),
            }
        }

        Commands::Edit(args) => {
            let theme = service.view_state().await?.theme;
            let (id, patch) = args.into_patch();
            match service.update_todo(&id, patch).await? {
                Some(todo) => output.changed("Updated", &todo, theme),
                None => output.not_found(id.as_str()),
            }
        }

        Commands::Delete { id } => {
            if service.delete_todo(&TodoId::new(id.clone())).await? {
                output.deleted(&id)
            } else {
                output.not_found(&id)
            }
        }

        Commands::Filter { filter } => output.view(&service.set_filter(filter).await?),

        Commands::Sort { sort_by } => output.view(&service.set_sort_by(sort_by).await?),

        Commands::Search { query } => {
            output.view(&service.set_search_query(&query.join(" ")).await?)
        }

        Commands::Theme => output.theme(service.toggle_theme().await?),

        Commands::Stats { recent } => {
            let theme = service.view_state().await?.theme;
            output.dashboard(&service.dashboard(recent).await?, theme)
        }

        Commands::Health => output.status(&backend::health(config, service).await?),
    }
}
