//! PE percentile MCP server — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use pe_percentile::PercentileLookup;
use pe_percentile_mcp::config::{load_dotenv, Settings};
use pe_percentile_mcp::tools::{get_pe_percentile, ToolRegistry};
use pe_percentile_mcp::transport::SseTransport;

#[derive(Parser)]
#[command(
    name = "pe-percentile-mcp",
    about = "MCP server for stock PE percentile lookups over SSE",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server over HTTP/SSE (default).
    Serve {
        /// Listen address (host:port). Defaults to HOST:PORT from the environment.
        #[arg(long)]
        addr: Option<String>,
    },

    /// Look up one stock code and print the result.
    Lookup {
        /// Stock code, e.g. 600739.SH or sz301011.
        stock_code: String,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   pe-percentile-mcp completions bash > ~/.local/share/bash-completion/completions/pe-percentile-mcp
    ///   pe-percentile-mcp completions zsh > ~/.zfunc/_pe-percentile-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dotenv_note = load_dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(note) = dotenv_note {
        tracing::info!("{note}");
    }

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            let (settings, lookup) = startup();
            let addr = addr.unwrap_or_else(|| settings.addr());
            tracing::info!("PE percentile MCP server");
            let transport = SseTransport::new(lookup);
            transport.run(&addr).await?;
        }

        Commands::Lookup { stock_code } => {
            let (_, lookup) = startup();
            let args = serde_json::json!({ "stock_code": stock_code });
            let result = ToolRegistry::call(get_pe_percentile::NAME, Some(args), &lookup).await?;
            println!("{}", result.first_text().unwrap_or_default());
        }

        Commands::Info => {
            let capabilities = pe_percentile_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pe-percentile-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load settings and build the shared store client. Any failure here is
/// fatal: no session may start without a working store configuration.
fn startup() -> (Settings, PercentileLookup) {
    let settings = Settings::from_env().unwrap_or_else(|e| {
        tracing::error!("Startup failed: {e}");
        std::process::exit(1);
    });

    let lookup = settings.connect().unwrap_or_else(|e| {
        tracing::error!("Startup failed: {e}");
        std::process::exit(1);
    });

    (settings, lookup)
}
