use std::io::IsTerminal as _;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hark::{
    Config,
    cli::{AppsCommands, Cli, Commands, ConfigCommands, Format, RoutineCommands, prompt},
    core::{
        AppOpener, AppRecord, Deleted, Disambiguator, LearnedAppStore, Persistence, RoutineEngine,
        RoutineStep, ShortcutIndex, Storage, SystemHost, assistant::Assistant, resolver::NoPrompt,
    },
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let storage = match &cli.data_dir {
        Some(dir) => Storage::with_root(dir.clone()),
        None => Storage::new()?,
    };

    // No subcommand = command loop
    let Some(command) = cli.command else {
        return listen(&config, storage, cli.no_input);
    };

    match command {
        Commands::Open { app, admin } => {
            let name = app.join(" ");
            let mut opener = opener(&config, storage, cli.no_input);
            match opener.open(&name, admin) {
                Ok(opened) => {
                    let suffix = if opened.elevated { " as administrator" } else { "" };
                    println!("Opened {}{suffix}", opened.name);
                    if let Some(warning) = opened.persist_warning {
                        eprintln!("warning: could not save learned apps: {warning}");
                    }
                }
                Err(e) => anyhow::bail!("could not open {name}: {e}"),
            }
        }

        Commands::Resolve { app } => {
            let name = app.join(" ");
            let resolution = opener(&config, storage, cli.no_input).resolve(&name);
            println!("name:    {}", resolution.name);
            println!("source:  {:?}", resolution.source);
            match &resolution.path {
                Some(path) => println!("path:    {}", path.display()),
                None => println!("path:    (none)"),
            }
            println!("admin:   {}", resolution.requires_admin);
            if !resolution.candidates.is_empty() {
                println!("matches:");
                for (i, candidate) in resolution.candidates.iter().enumerate() {
                    println!("  {}. {}", i + 1, candidate.display());
                }
            }
        }

        Commands::Routine { command } => {
            let opener = opener(&config, storage.clone(), cli.no_input);
            let engine = RoutineEngine::new(storage, opener);
            handle_routine_command(command, engine, &config, cli.no_input)?;
        }

        Commands::Apps { command } => {
            handle_apps_command(command, &config, storage)?;
        }

        Commands::Listen => {
            listen(&config, storage, cli.no_input)?;
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommands::Path => {
                let path = match cli.config {
                    Some(path) => path,
                    None => Config::config_path()?,
                };
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}

fn opener(config: &Config, storage: Storage, no_input: bool) -> AppOpener {
    let chooser: Box<dyn Disambiguator> = if no_input || !std::io::stdin().is_terminal() {
        Box::new(NoPrompt)
    } else {
        Box::new(prompt::SelectPrompt)
    };
    AppOpener::from_config(config, storage, chooser, Box::new(SystemHost))
}

fn listen(config: &Config, storage: Storage, no_input: bool) -> anyhow::Result<()> {
    let chooser: Box<dyn Disambiguator> = if no_input {
        Box::new(NoPrompt)
    } else {
        Box::new(prompt::ReplyPrompt)
    };
    let opener = AppOpener::from_config(config, storage.clone(), chooser, Box::new(SystemHost));
    let engine = RoutineEngine::new(storage, opener);

    let mut assistant = Assistant::new(engine, config.security.blocked.clone());
    assistant.run(prompt::stdin_lines(), &mut std::io::stdout())?;
    Ok(())
}

fn handle_routine_command(
    command: RoutineCommands,
    mut engine: RoutineEngine,
    config: &Config,
    no_input: bool,
) -> anyhow::Result<()> {
    match command {
        RoutineCommands::List => {
            let mut empty = true;
            for routine in engine.list() {
                empty = false;
                println!("{:<30} {} app(s)", routine.name, routine.steps.len());
            }
            if empty {
                println!("No routines found.");
            }
        }

        RoutineCommands::Show { name } => {
            let Some(routine) = engine.get(&name) else {
                anyhow::bail!("routine '{name}' not found");
            };
            println!("{}", routine.name);
            for (i, step) in routine.steps.iter().enumerate() {
                let admin = if step.admin { " (admin)" } else { "" };
                println!("  {}. {}{admin}", i + 1, step.app_name);
            }
        }

        RoutineCommands::Create { name, steps } => {
            let steps = if steps.is_empty() {
                if no_input {
                    anyhow::bail!("no steps given; pass apps with --step");
                }
                prompt::author_steps(&ShortcutIndex::from_config(&config.index))?
            } else {
                steps.iter().map(|s| RoutineStep::parse(s)).collect()
            };

            let persistence = engine.create(&name, steps)?;
            println!("Created routine {}", name.trim());
            warn_unsaved(&persistence);
        }

        RoutineCommands::Delete { name } => match engine.delete(&name) {
            Deleted::Removed(persistence) => {
                println!("Deleted routine {}", name.trim());
                warn_unsaved(&persistence);
            }
            Deleted::Absent => println!("No routine named {} found.", name.trim()),
        },

        RoutineCommands::Run { name } => {
            let outcomes = engine.run(&name)?;
            let launched = outcomes.iter().filter(|o| o.launched).count();
            for outcome in &outcomes {
                match &outcome.reason {
                    None => println!("  {}: opened", outcome.app_name),
                    Some(reason) => println!("  {}: {reason}", outcome.app_name),
                }
                if let Some(warning) = &outcome.warning {
                    eprintln!("warning: could not save learned apps: {warning}");
                }
            }
            println!("{launched} of {} app(s) opened", outcomes.len());
        }
    }

    Ok(())
}

fn handle_apps_command(command: AppsCommands, config: &Config, storage: Storage) -> anyhow::Result<()> {
    match command {
        AppsCommands::List { format } => {
            let store = LearnedAppStore::load(storage);
            let records: Vec<&AppRecord> = store.records().collect();

            if format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No learned apps.");
            } else {
                println!("{:<24} {:<6} {:<17} Path", "Name", "Admin", "Last used");
                println!("{}", "-".repeat(80));
                for record in records {
                    let stale = if record.path.exists() { "" } else { " (missing)" };
                    println!(
                        "{:<24} {:<6} {:<17} {}{stale}",
                        record.name,
                        if record.requires_admin { "yes" } else { "no" },
                        record.last_used.format("%Y-%m-%d %H:%M"),
                        record.path.display()
                    );
                }
            }
        }

        AppsCommands::Add { name, path, admin } => {
            if !path.exists() {
                anyhow::bail!("{} does not exist", path.display());
            }
            let mut store = LearnedAppStore::load(storage);
            let record = AppRecord::new(&name, path, admin);
            let key = record.name.clone();
            store.put(record);
            store.persist()?;
            println!("Remembered {key}");
        }

        AppsCommands::Forget { name } => {
            let mut store = LearnedAppStore::load(storage);
            match store.remove(&name) {
                Some(record) => {
                    store.persist()?;
                    println!("Forgot {}", record.name);
                }
                None => println!("No learned app named {}.", name.trim()),
            }
        }

        AppsCommands::Available => {
            let index = ShortcutIndex::from_config(&config.index);
            if index.is_empty() {
                println!("No shortcuts found.");
            }
            for (name, target) in index.iter() {
                println!("{name:<32} {}", target.display());
            }
        }
    }

    Ok(())
}

fn warn_unsaved(persistence: &Persistence) {
    if let Some(reason) = persistence.warning() {
        eprintln!("warning: changes kept for this session only: {reason}");
    }
}
