use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use colored::Colorize;
use omnera::{
    commands::{self, parse_var},
    ctx::AppContext,
};
use omnera_config::VarValue;

#[derive(Parser)]
#[command(name = "omnera", version, about = "Omnera application config tooling")]
struct Cli {
    /// Workspace root; defaults to the current directory.
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Subcommand)]
enum SubCommands {
    /// Validate an application config
    Validate { config: PathBuf },
    /// Resolve one block with variables and print the component tree
    Resolve {
        config: PathBuf,
        block: String,
        /// Variable binding, repeatable
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, VarValue)>,
    },
    /// Resolve every page's sections
    Pages { config: PathBuf },
    /// Write JSON Schema and TypeScript declarations
    Export {
        /// Output directory, overriding `export.dir`
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Version subdirectory name
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        schema_version: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = match cli.workspace {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let ctx = AppContext::new(workspace).await?;

    match cli.command {
        SubCommands::Validate { config } => {
            let app = commands::validate(&ctx, &config).await?;
            println!("{} {}", "valid:".green().bold(), commands::summary(&app));
        }
        SubCommands::Resolve {
            config,
            block,
            vars,
        } => {
            let component = commands::resolve(&ctx, &config, &block, vars).await?;
            println!("{}", serde_json::to_string_pretty(&component)?);
        }
        SubCommands::Pages { config } => {
            for (path, sections) in commands::pages(&ctx, &config).await? {
                print!("{}", commands::render_sections(&path, &sections)?);
            }
        }
        SubCommands::Export {
            out,
            schema_version,
        } => {
            let written = commands::export(&ctx, out.as_deref(), &schema_version).await?;
            for path in written {
                println!("{} {}", "wrote".green().bold(), path.display());
            }
        }
    }
    Ok(())
}
