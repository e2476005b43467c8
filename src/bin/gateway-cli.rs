use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use api_gateway::config::loader::parse_file;
use api_gateway::routing::RouteLoader;
use api_gateway::security::{RoleHierarchy, TokenService};
use api_gateway::{GatewayConfig, HandlerRegistry};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator tooling for the API gateway", long_about = None)]
struct Cli {
    /// Gateway configuration file (for the role hierarchy and route prefix).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a route directory and print what would be mounted
    Routes {
        #[arg(short, long, default_value = "api")]
        dir: PathBuf,
    },
    /// Issue a signed token
    Token {
        /// Signing secret
        #[arg(long, env = "ACCESS_CODE", hide_env_values = true)]
        secret: String,

        /// Lifetime in days
        #[arg(long, default_value_t = 1)]
        days: u32,

        /// Claim as key=value; repeatable
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, String)>,
    },
}

fn parse_claim(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => parse_file(path)?,
        None => GatewayConfig::default(),
    };

    match cli.command {
        Commands::Routes { dir } => {
            let registry = HandlerRegistry::builtin();
            let roles = RoleHierarchy::from_config(&config.roles);
            let report = RouteLoader::new(&registry, &roles)
                .with_prefix(config.routes.prefix.clone())
                .load(&dir);

            for entry in report.table.iter() {
                let methods = if entry.methods.is_empty() {
                    "ANY".to_string()
                } else {
                    entry.methods.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(",")
                };
                let guard = match (&entry.required_role, entry.requires_auth) {
                    (Some(role), _) => format!("role>={role}"),
                    (None, true) => "auth".to_string(),
                    (None, false) => "public".to_string(),
                };
                println!("{:<32} {:<12} {:<14} {}", entry.path, methods, guard, entry.handler_name);
            }
            for failure in &report.failures {
                eprintln!("error: {}", failure);
            }
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Token { secret, days, claims } => {
            let subject: Map<String, Value> = claims
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            let token = TokenService::new(Some(secret)).issue(days, subject)?;
            println!("{}", token);
        }
    }

    Ok(())
}
