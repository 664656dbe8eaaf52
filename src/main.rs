use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use eyre::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tasklist::config::{Backend, Config};
use tasklist::{Filter, JsonFileStorage, Outcome, Rejection, SqliteStorage, Storage, TaskId, TaskStore, view};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "Local to-do list manager")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Config file (default: <config dir>/tasklist/config.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task data
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Persistence backend
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Action(Action),

    /// Read commands from stdin until `quit`
    Shell,
}

#[derive(Subcommand)]
enum Action {
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List tasks
    List {
        #[arg(short, long, value_enum)]
        filter: Option<Filter>,
    },

    /// Mark a task completed or pending
    Toggle { id: TaskId },

    /// Replace a task's text
    Edit {
        id: TaskId,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a task
    Delete {
        id: TaskId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every completed task
    ClearCompleted {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show task counts
    Stats,
}

#[derive(Parser)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Action(Action),

    /// Change the filter used by `list`
    Filter {
        #[arg(value_enum)]
        filter: Filter,
    },

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let mut store = TaskStore::open(open_storage(&config)?);
    store.set_filter(config.default_filter);

    let ok = match cli.command {
        Commands::Action(action) => run_action(&mut store, action)?,
        Commands::Shell => run_shell(&mut store)?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn open_storage(config: &Config) -> Result<Box<dyn Storage>> {
    let dir = config.resolve_data_dir()?;
    info!(backend = ?config.backend, dir = ?dir, "Opening storage");

    Ok(match config.backend {
        Backend::Json => Box::new(JsonFileStorage::new(&dir)),
        Backend::Sqlite => Box::new(SqliteStorage::open(&dir)?),
    })
}

/// Run one action; returns false when the store rejected it
fn run_action<S: Storage>(store: &mut TaskStore<S>, action: Action) -> Result<bool> {
    let ok = match action {
        Action::Add { text } => report(store.add(&text.join(" "))),
        Action::List { filter } => {
            if let Some(filter) = filter {
                store.set_filter(filter);
            }
            print_list(store);
            true
        }
        Action::Toggle { id } => report(store.toggle(id)),
        Action::Edit { id, text } => report(store.edit(id, &text.join(" "))),
        Action::Delete { id, yes } => match store.request_delete(id) {
            Ok(confirmation) => {
                if yes || ask(confirmation.prompt())? {
                    report(store.confirm(confirmation))
                } else {
                    println!("Cancelled.");
                    true
                }
            }
            Err(rejection) => reject(rejection),
        },
        Action::ClearCompleted { yes } => match store.request_clear_completed() {
            Ok(confirmation) => {
                if yes || ask(confirmation.prompt())? {
                    report(store.confirm(confirmation))
                } else {
                    println!("Cancelled.");
                    true
                }
            }
            Err(rejection) => reject(rejection),
        },
        Action::Stats => {
            println!("{}", view::summary_line(store.counts()));
            true
        }
    };
    Ok(ok)
}

fn run_shell<S: Storage>(store: &mut TaskStore<S>) -> Result<bool> {
    println!("tasklist shell. Type `help` for commands, `quit` to leave.");
    let stdin = io::stdin();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let command = match parse_shell_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                // Covers `help` as well as real parse errors
                let _ = e.print();
                continue;
            }
        };

        match command {
            ShellCommand::Action(action) => {
                run_action(store, action)?;
            }
            ShellCommand::Filter { filter } => {
                store.set_filter(filter);
                println!("Filter: {}", filter);
                print_list(store);
            }
            ShellCommand::Quit => break,
        }
    }

    Ok(true)
}

/// Split a shell line the way a POSIX shell would, then parse it
fn parse_shell_line(line: &str) -> std::result::Result<Option<ShellCommand>, clap::Error> {
    let words = shlex::split(line)
        .ok_or_else(|| clap::Error::raw(ErrorKind::InvalidValue, "Unbalanced quotes in command\n"))?;
    if words.is_empty() {
        return Ok(None);
    }

    let parsed = ShellLine::try_parse_from(words)?;
    Ok(Some(parsed.command))
}

fn print_list<S: Storage>(store: &TaskStore<S>) {
    let visible = store.list_visible();
    if visible.is_empty() {
        println!("{}", view::empty_message(store.filter()));
    }
    for task in visible {
        println!("{}", view::render_task(task));
    }
    println!("{}", view::summary_line(store.counts()));
}

fn report<T>(result: std::result::Result<Outcome<T>, Rejection>) -> bool {
    match result {
        Ok(outcome) => {
            println!("{}", view::success(&outcome.message));
            if let Some(err) = &outcome.persist_error {
                eprintln!("{}", view::warning(&format!("Changes kept in memory but not saved: {}", err)));
            }
            true
        }
        Err(rejection) => reject(rejection),
    }
}

fn reject(rejection: Rejection) -> bool {
    eprintln!("{}", view::error(&rejection.to_string()));
    false
}

fn ask(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklist::MemoryStorage;

    fn parse(line: &str) -> ShellCommand {
        parse_shell_line(line).unwrap().unwrap()
    }

    #[test]
    fn test_shell_add_keeps_quoted_text_intact() {
        let ShellCommand::Action(Action::Add { text }) = parse(r#"add "Buy  milk""#) else {
            panic!("expected add");
        };
        assert_eq!(text, vec!["Buy  milk".to_string()]);

        let mut store = TaskStore::open(MemoryStorage::new());
        assert!(run_action(&mut store, Action::Add { text }).unwrap());
        assert_eq!(store.tasks()[0].text, "Buy  milk");
    }

    #[test]
    fn test_shell_add_quoted_blank_is_rejected() {
        let ShellCommand::Action(action) = parse(r#"add "   ""#) else {
            panic!("expected add");
        };

        let mut store = TaskStore::open(MemoryStorage::new());
        assert!(!run_action(&mut store, action).unwrap());
        assert!(store.tasks().is_empty());
        assert_eq!(store.storage().save_count(), 0);
    }

    #[test]
    fn test_shell_edit_with_quoted_text() {
        let ShellCommand::Action(Action::Edit { id, text }) = parse(r#"edit 7 'Buy oat milk'"#) else {
            panic!("expected edit");
        };
        assert_eq!(id, 7);
        assert_eq!(text, vec!["Buy oat milk".to_string()]);
    }

    #[test]
    fn test_shell_unquoted_words_are_joined() {
        let ShellCommand::Action(Action::Add { text }) = parse("add Buy milk") else {
            panic!("expected add");
        };
        assert_eq!(text.join(" "), "Buy milk");
    }

    #[test]
    fn test_shell_unbalanced_quotes_error() {
        assert!(parse_shell_line(r#"add "Buy milk"#).is_err());
    }

    #[test]
    fn test_shell_blank_line_is_skipped() {
        assert!(parse_shell_line("   \n").unwrap().is_none());
    }

    #[test]
    fn test_shell_filter_and_quit() {
        assert!(matches!(
            parse("filter done"),
            ShellCommand::Filter {
                filter: Filter::Completed
            }
        ));
        assert!(matches!(parse("exit"), ShellCommand::Quit));
    }
}
