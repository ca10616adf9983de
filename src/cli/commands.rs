//! Command implementations.

use std::io::Read;
use std::sync::Arc;

use clap::CommandFactory;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::args::{
    CacheSubcommand, Cli, Commands, KindArg, RulesSubcommand, TokenSubcommand,
};
use crate::engine::{Engine, RouteOutcome};
use crate::error::{PagemirrorError, Result};
use crate::http::ReqwestFetcher;
use crate::persist::FileStore;

fn build_engine(cli: &Cli) -> Engine {
    let path = cli
        .state_file
        .clone()
        .unwrap_or_else(FileStore::default_path);
    let store = Arc::new(FileStore::open(path));

    let engine = Engine::new(store, Arc::new(ReqwestFetcher::new()));
    match &cli.api_base {
        Some(base) => engine.with_api_base(base),
        None => engine,
    }
}

fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Run the parsed command. Returns the process exit code.
pub fn dispatch(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Token(args) => token_command(cli, &args.command),
        Commands::Rules(args) => rules_command(cli, &args.command),
        Commands::Cache(args) => cache_command(cli, &args.command),
        Commands::Site => site_command(cli),
        Commands::Route(args) => route_command(cli, &args.path),
        Commands::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "pagemirror",
                &mut std::io::stdout(),
            );
            Ok(0)
        }
    }
}

fn token_command(cli: &Cli, command: &TokenSubcommand) -> Result<i32> {
    let mut engine = build_engine(cli);

    match command {
        TokenSubcommand::Set { token } => {
            let credential = engine.save_token(token)?;
            success(&format!("Token saved ({})", credential.version));
            Ok(0)
        }
        TokenSubcommand::Check { token } => {
            let version = engine.check_token(token)?;
            println!("{}", version);
            Ok(0)
        }
        TokenSubcommand::Remove { drop_data } => {
            engine.remove_token(*drop_data)?;
            if *drop_data {
                success("Token, cache and rules removed");
            } else {
                success("Token and cache removed");
            }
            Ok(0)
        }
        TokenSubcommand::Status => {
            if engine.has_token() {
                let version = engine
                    .saved_token_version()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "unresolved".to_string());
                println!("Token saved ({})", version);
            } else {
                println!("No token saved");
            }
            Ok(0)
        }
    }
}

fn read_rules_payload(path: &std::path::Path) -> Result<Vec<Vec<String>>> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };

    serde_json::from_str(&content).map_err(|_| PagemirrorError::Validation {
        message: "Rules payload must be a JSON array of [local, remote] string pairs".to_string(),
    })
}

fn print_rules(rules: &[(String, String)], json: bool) -> Result<()> {
    if json {
        let payload: Vec<[&str; 2]> = rules
            .iter()
            .map(|(l, r)| [l.as_str(), r.as_str()])
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload).map_err(anyhow::Error::from)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules configured");
        return Ok(());
    }

    for (index, (local, remote)) in rules.iter().enumerate() {
        println!(
            "  {} {} {} {}",
            style(index).dim(),
            local,
            style("->").dim(),
            remote
        );
    }
    Ok(())
}

fn rules_command(cli: &Cli, command: &RulesSubcommand) -> Result<i32> {
    let mut engine = build_engine(cli);

    let list = |engine: &Engine, kind: KindArg| match kind {
        KindArg::Static => engine.list_static_rules(),
        KindArg::Dynamic => engine.list_dynamic_rules(),
    };

    let save = |engine: &mut Engine, kind: KindArg, rows: &[Vec<String>]| match kind {
        KindArg::Static => engine.save_static_rules(rows),
        KindArg::Dynamic => engine.save_dynamic_rules(rows),
    };

    match command {
        RulesSubcommand::List { kind, json } => {
            print_rules(&list(&engine, *kind), *json)?;
            Ok(0)
        }
        RulesSubcommand::Save { kind, file } => {
            let payload = read_rules_payload(file)?;
            let saved = save(&mut engine, *kind, &payload)?;
            success(&format!("Saved {} rules", saved.len()));
            Ok(0)
        }
        RulesSubcommand::Add {
            kind,
            local,
            remote,
        } => {
            let mut working = crate::rules::RuleSet::from_rows(list(&engine, *kind));
            working.add(local, remote);
            let saved = save(&mut engine, *kind, &working.into_payload())?;
            success(&format!("Saved {} rules", saved.len()));
            Ok(0)
        }
        RulesSubcommand::Remove { kind, index } => {
            let mut working = crate::rules::RuleSet::from_rows(list(&engine, *kind));
            match working.remove(*index) {
                Some((local, _)) => {
                    let saved = save(&mut engine, *kind, &working.into_payload())?;
                    success(&format!("Removed {} ({} rules left)", local, saved.len()));
                    Ok(0)
                }
                None => {
                    eprintln!("{} no rule at index {}", style("✗").red().bold(), index);
                    Ok(1)
                }
            }
        }
    }
}

fn cache_command(cli: &Cli, command: &CacheSubcommand) -> Result<i32> {
    let mut engine = build_engine(cli);

    match command {
        CacheSubcommand::Invalidate => {
            engine.invalidate_cache()?;
            success("Cache invalidated");
            Ok(0)
        }
        CacheSubcommand::Preload => {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .expect("static template is valid"),
            );
            spinner.set_message("Preloading static pages...");
            spinner.enable_steady_tick(std::time::Duration::from_millis(100));

            let result = engine.preload_cache();
            spinner.finish_and_clear();

            let count = result?;
            success(&format!(
                "Preloaded {} {}",
                count,
                if count == 1 { "page" } else { "pages" }
            ));
            Ok(0)
        }
        CacheSubcommand::Duration { seconds } => match seconds {
            Some(seconds) => {
                engine.set_cache_duration(*seconds)?;
                if *seconds == 0 {
                    success("Cache duration set: entries never expire");
                } else {
                    success(&format!("Cache duration set to {}s", seconds));
                }
                Ok(0)
            }
            None => {
                println!("{}", engine.cache_duration());
                Ok(0)
            }
        },
    }
}

fn site_command(cli: &Cli) -> Result<i32> {
    let mut engine = build_engine(cli);
    let record = engine.aggregated_site_data();

    println!(
        "{}",
        serde_json::to_string_pretty(&record).map_err(anyhow::Error::from)?
    );

    Ok(if record.error.is_some() { 1 } else { 0 })
}

fn route_command(cli: &Cli, path: &str) -> Result<i32> {
    let mut engine = build_engine(cli);

    match engine.route_request(path)? {
        RouteOutcome::Hit { body, content_type } => {
            tracing::debug!("Serving mirrored content as {}", content_type);
            print!("{}", body);
            Ok(0)
        }
        RouteOutcome::Miss => {
            eprintln!("No rule matches {}", path);
            Ok(1)
        }
    }
}
