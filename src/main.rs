use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wikiloom::{RenderMode, WikiError};
use wikiloom::cli::commands::{self, init::InitialWeb, web::WebOptions};
use wikiloom::cli::{CommandContext, OutputFormat};

/// Parse render mode from string
fn parse_render_mode(s: &str) -> Result<RenderMode, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "wikiloom")]
#[command(
    version,
    about = "Wiki page rendering, reference tracking and revision diffs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Config file replacing .wikiloom/config.toml")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize wikiloom in the current directory
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
        #[arg(long, requires = "address", help = "Name of the first web")]
        web: Option<String>,
        #[arg(long, requires = "web", help = "Address of the first web")]
        address: Option<String>,
    },

    /// Administer webs
    Web {
        #[command(subcommand)]
        action: WebAction,
    },

    /// Save, render and inspect pages
    Page {
        #[command(subcommand)]
        action: PageAction,
    },

    /// Show project status
    Status {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum WebAction {
    /// Create a web
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        #[command(flatten)]
        options: WebOptions,
    },
    /// Change the name or settings of a web
    Update {
        address: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        options: WebOptions,
    },
    /// List webs
    List {
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Names linked to but not yet written
    Wanted {
        address: Option<String>,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Pages no other page links to
    Orphans {
        address: Option<String>,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Categories and their pages
    Categories {
        address: Option<String>,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum PageAction {
    /// Store a new revision and update the page's references
    Save {
        web: String,
        page: String,
        #[arg(long, help = "Read content from file instead of stdin")]
        file: Option<PathBuf>,
        #[arg(long, help = "Revision author (default: wiki.default_author)")]
        author: Option<String>,
    },
    /// Render a revision to HTML
    Show {
        web: String,
        page: String,
        #[arg(long, value_parser = parse_render_mode, default_value = "display", help = "display, export or publish")]
        mode: RenderMode,
        #[arg(long, help = "Revision number (default: latest)")]
        revision: Option<u32>,
    },
    /// Word diff against the previous revision
    Diff {
        web: String,
        page: String,
        #[arg(long, help = "Revision number (default: latest)")]
        revision: Option<u32>,
    },
    /// Links, stored references and backlinks of a page
    Refs {
        web: String,
        page: String,
        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(long, help = "Print as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mwikiloom encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            if e
                .downcast_ref::<WikiError>()
                .is_some_and(WikiError::is_retryable)
            {
                eprintln!("\x1b[90mThe operation can be retried.\x1b[0m");
            }
            ExitCode::from(exit_status(&e))
        }
    }
}

/// Configuration mistakes exit with 2, every other failure with 1
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<WikiError>() {
        Some(e) if e.is_configuration() => 2,
        _ => 1,
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init {
            force,
            web,
            address,
        } => {
            let web = web
                .zip(address)
                .map(|(name, address)| InitialWeb { name, address });
            commands::init::run(force, web)?;
        }
        Commands::Web { action } => {
            let ctx = CommandContext::load(config_path)?;
            match action {
                WebAction::Create {
                    name,
                    address,
                    options,
                } => {
                    commands::web::create(&ctx, &name, &address, &options)?;
                }
                WebAction::Update {
                    address,
                    name,
                    options,
                } => {
                    commands::web::update(&ctx, &address, name.as_deref(), &options)?;
                }
                WebAction::List { format } => commands::web::list(&ctx, format)?,
                WebAction::Wanted { address, format } => {
                    commands::web::wanted(&ctx, address.as_deref(), format)?
                }
                WebAction::Orphans { address, format } => {
                    commands::web::orphans(&ctx, address.as_deref(), format)?
                }
                WebAction::Categories { address, format } => {
                    commands::web::categories(&ctx, address.as_deref(), format)?
                }
            }
        }
        Commands::Page { action } => {
            let ctx = CommandContext::load(config_path)?;
            match action {
                PageAction::Save {
                    web,
                    page,
                    file,
                    author,
                } => {
                    commands::page::save(&ctx, &web, &page, file.as_deref(), author.as_deref())?;
                }
                PageAction::Show {
                    web,
                    page,
                    mode,
                    revision,
                } => {
                    println!("{}", commands::page::show(&ctx, &web, &page, mode, revision)?);
                }
                PageAction::Diff {
                    web,
                    page,
                    revision,
                } => {
                    println!("{}", commands::page::diff(&ctx, &web, &page, revision)?);
                }
                PageAction::Refs { web, page, format } => {
                    commands::page::refs(&ctx, &web, &page, format)?;
                }
            }
        }
        Commands::Status { format } => {
            commands::status::run(config_path, format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, json } => {
                commands::config::show(config_path, global, json)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    commands::config::init_global(force)?;
                } else {
                    commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
