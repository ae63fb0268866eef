//! CLI entry point for devtool-vault

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use devtool_vault::app::commands;
use devtool_vault::app::tasks::request_generation;
use devtool_vault::app::view_model::generate_tree_view;
use devtool_vault::app::{GenerationKind, Session, SessionState, UserEvent};
use devtool_vault::app::helpers::lock_state;
use devtool_vault::config::{ProfileStore, ResolvedConfig};
use devtool_vault::core::{DirectoryExporter, Exporter, TextExporter, TextFormat};

#[derive(Parser, Debug)]
#[command(name = "devtool-vault")]
#[command(about = "Filter a project through named profiles, select files and render its structure")]
#[command(version)]
struct Cli {
    /// Directory holding saved filter profiles
    #[arg(long, global = true, value_name = "DIR")]
    profiles_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filtered directory structure with statistics
    Tree {
        #[command(flatten)]
        source: Source,

        /// Append file sizes
        #[arg(long)]
        size: bool,

        /// Show hidden and system files
        #[arg(short, long)]
        all: bool,

        /// Show empty folders instead of omitting them
        #[arg(long)]
        keep_empty: bool,
    },
    /// Build the checkable tree, apply toggles and print the selected files
    Select {
        #[command(flatten)]
        source: Source,

        #[command(flatten)]
        toggles: Toggles,

        /// Print the whole tree with selection states as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the selected files
    Export {
        #[command(flatten)]
        source: Source,

        #[command(flatten)]
        toggles: Toggles,

        /// Destination directory, or output file for text formats
        #[arg(long, value_name = "DEST")]
        to: PathBuf,

        #[arg(long, value_enum, default_value = "dir")]
        format: ExportFormat,
    },
    /// Manage filter profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Args, Debug)]
struct Source {
    /// Directory to process
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Filter profile to use instead of the default
    #[arg(short, long)]
    profile: Option<String>,
}

/// Selection changes, applied in the order given.
#[derive(Args, Debug)]
struct Toggles {
    /// Uncheck a path relative to the root (repeatable)
    #[arg(long, value_name = "REL")]
    uncheck: Vec<String>,

    /// Check a path relative to the root (repeatable)
    #[arg(long, value_name = "REL")]
    check: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    /// List all profiles
    List,
    /// Print a profile as JSON
    Show { name: String },
    /// Create a profile from the default profile's settings
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a saved profile
    Delete { name: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// Copy files into a directory
    Dir,
    /// One plain-text document
    Text,
    /// One Markdown document
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;
    let mut store = match &cli.profiles_dir {
        Some(dir) => ProfileStore::open(dir),
        None => ProfileStore::open_default(),
    }
    .context("Failed to open the profile store")?;

    let sub_matches = matches.subcommand().map(|(_, m)| m);

    match cli.command {
        Command::Tree {
            source,
            size,
            all,
            keep_empty,
        } => {
            let (name, mut config) = resolve_profile(&mut store, &source)?;
            config.show_file_size |= size;
            config.show_system_files |= all;
            config.ignore_empty_folders &= !keep_empty;

            let session = SessionState::shared(name, config);
            match generate(GenerationKind::Render, &source.path, &session).await? {
                UserEvent::RenderReady { text, stats, .. } => {
                    print!("{text}");
                    println!();
                    println!("{}", stats.summary());
                }
                other => bail!("Unexpected result {other:?}"),
            }
        }
        Command::Select { source, json, .. } => {
            let session = load_tree(&mut store, &source).await?;
            apply_toggles(sub_matches, &session)?;

            if json {
                let state_guard = lock_state(&session);
                let view = generate_tree_view(&state_guard).context("No tree was loaded")?;
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                let root = tree_root(&session)?;
                let selected = commands::selected_files(&session);
                for path in &selected {
                    println!("{}", path.strip_prefix(&root).unwrap_or(path).display());
                }
                eprintln!("{} files selected", selected.len());
            }
        }
        Command::Export {
            source, to, format, ..
        } => {
            let session = load_tree(&mut store, &source).await?;
            apply_toggles(sub_matches, &session)?;

            let exporter: Box<dyn Exporter> = match format {
                ExportFormat::Dir => Box::new(DirectoryExporter::new(to)),
                ExportFormat::Text => Box::new(TextExporter::new(to, TextFormat::Plain)),
                ExportFormat::Markdown => Box::new(TextExporter::new(to, TextFormat::Markdown)),
            };
            let report = commands::export_selection(exporter.as_ref(), &session)?;
            println!(
                "Exported {} files to {}",
                report.exported,
                report.destination.display()
            );
            for failure in &report.failures {
                eprintln!("  failed: {} ({})", failure.relative_path.display(), failure.reason);
            }
            if !report.is_success() {
                bail!("{} files could not be exported", report.failures.len());
            }
        }
        Command::Profiles { action } => run_profile_action(&mut store, action)?,
    }

    Ok(())
}

fn resolve_profile(store: &mut ProfileStore, source: &Source) -> Result<(String, ResolvedConfig)> {
    if let Some(name) = &source.profile {
        store.set_active(name)?;
    }
    let profile = store.active();
    Ok((profile.name.clone(), profile.resolve()))
}

/// Runs one generation through the session and waits for its outcome.
async fn generate(kind: GenerationKind, root: &Path, session: &Session) -> Result<UserEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel::<UserEvent>();
    let id = request_generation(kind, root.to_path_buf(), tx, session.clone());

    while let Some(event) = rx.recv().await {
        if event.generation() != Some(id) {
            continue;
        }
        if let UserEvent::ShowError { message, .. } = event {
            bail!(message);
        }
        return Ok(event);
    }
    bail!("Generation {id} ended without a result")
}

async fn load_tree(store: &mut ProfileStore, source: &Source) -> Result<Session> {
    let (name, config) = resolve_profile(store, source)?;
    let session = SessionState::shared(name, config);
    generate(GenerationKind::Build, &source.path, &session).await?;
    Ok(session)
}

fn tree_root(session: &Session) -> Result<PathBuf> {
    let state_guard = lock_state(session);
    let tree = state_guard.tree.as_ref().context("No tree was loaded")?;
    Ok(tree.root_node().full_path().to_path_buf())
}

/// Applies `--uncheck` and `--check` in command-line order.
fn apply_toggles(matches: Option<&ArgMatches>, session: &Session) -> Result<()> {
    let Some(matches) = matches else {
        return Ok(());
    };

    let mut toggles = Vec::new();
    for (id, checked) in [("uncheck", false), ("check", true)] {
        if let (Some(values), Some(indices)) = (matches.get_many::<String>(id), matches.indices_of(id)) {
            toggles.extend(indices.zip(values).map(|(index, value)| (index, value.clone(), checked)));
        }
    }
    toggles.sort_by_key(|(index, ..)| *index);

    // Nobody listens for selection events here.
    let (tx, _rx) = mpsc::unbounded_channel::<UserEvent>();
    for (_, relative, checked) in toggles {
        commands::set_node_state(Path::new(&relative), checked, &tx, session)?;
    }
    Ok(())
}

fn run_profile_action(store: &mut ProfileStore, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::List => {
            let active = store.active().name.clone();
            for profile in store.profiles() {
                let marker = if profile.name == active { "*" } else { " " };
                let built_in = if profile.is_built_in { " (built-in)" } else { "" };
                println!("{marker} {}{built_in}", profile.name);
                if !profile.description.is_empty() {
                    println!("    {}", profile.description);
                }
            }
        }
        ProfileAction::Show { name } => {
            let profile = store
                .get(&name)
                .with_context(|| format!("Profile '{name}' not found"))?;
            println!("{}", serde_json::to_string_pretty(profile)?);
        }
        ProfileAction::Create { name, description } => {
            let profile = store.create_profile(&name, &description)?;
            store.save(profile)?;
            println!("Created profile '{name}' in {}", store.directory().display());
        }
        ProfileAction::Delete { name } => {
            store.delete(&name)?;
            println!("Deleted profile '{name}'");
        }
    }
    Ok(())
}
