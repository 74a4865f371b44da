use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use action_router::dispatch::{resolve, Dispatch};
use action_router::lifecycle::load_application;
use action_router::routing::MatchedAction;

#[derive(Parser)]
#[command(name = "routes-cli")]
#[command(about = "Inspect a routing table without starting the server", long_about = None)]
struct Cli {
    /// Application config file.
    #[arg(short, long, default_value = "app.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List routes in match order
    List,
    /// Show which action a request would reach
    Match {
        method: String,
        path: String,
    },
    /// Build the URL for an action from key=value arguments
    Reverse {
        action: String,
        #[arg(value_parser = parse_arg)]
        args: Vec<(String, String)>,
    },
}

fn parse_arg(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got \"{raw}\""))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let app = match load_application(&cli.config) {
        Ok(app) => app,
        Err(action_router::lifecycle::StartupError::Routes(e)) => {
            eprint!("{}", e.render());
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let output = match cli.command {
        Commands::List => {
            let routes: Vec<_> = app
                .router
                .routes()
                .iter()
                .map(|r| {
                    json!({
                        "method": r.method(),
                        "path": r.path(),
                        "action": r.action(),
                        "params": r.fixed_params(),
                        "source": r.provenance().to_string(),
                    })
                })
                .collect();
            json!(routes)
        }
        Commands::Match { method, path } => {
            let matched = app.router.route(&method, &path);
            let action = matched.as_ref().map(|m| match &m.action {
                MatchedAction::Invoke { controller, method } => format!("{controller}.{method}"),
                MatchedAction::NotFound => "404".to_string(),
                MatchedAction::Opaque(action) => action.clone(),
            });
            let params = matched.as_ref().map(|m| m.params.clone());
            let dispatch = match resolve(matched, app.actions.as_ref()) {
                Dispatch::Invoke(call) => json!({ "invoke": call }),
                Dispatch::NotFound(reason) => json!({ "not_found": reason.to_string() }),
            };
            json!({ "action": action, "params": params, "dispatch": dispatch })
        }
        Commands::Reverse { action, args } => {
            let args: BTreeMap<String, String> = args.into_iter().collect();
            json!(app.router.reverse(&action, args)?)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
