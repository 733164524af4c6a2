use clap::{Parser, Subcommand};
use fl_client::{ApiConfig, EnrichmentBackend, Services, DEFAULT_API_URL};
use fl_core::{Category, TokenStore};
use tracing::{info, warn, Level};

mod commands;
mod input;
mod session_file;

use commands::App;
use session_file::SessionFile;

#[derive(Parser, Debug)]
#[command(name = "fl", author, version, about = "Write, enrich and manage articles", long_about = None)]
pub struct Cli {
    /// Base URL of the articles API
    #[arg(long, env = "FLUENT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Work against an in-memory store with the offline AI stand-in
    #[arg(long)]
    offline: bool,
    /// AI backend: remote (default) or dummy
    #[arg(long, default_value = "remote")]
    enrichment: EnrichmentBackend,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "FLUENT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "FLUENT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List articles
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        /// Author id
        #[arg(long)]
        author: Option<String>,
        /// Only articles written by the signed-in user
        #[arg(long, conflicts_with = "author")]
        mine: bool,
    },
    /// Search as you type: every stdin line replaces the query
    Search {
        #[arg(long)]
        category: Option<Category>,
    },
    /// Print one article
    Show {
        id: String,
        /// Also list related articles
        #[arg(long)]
        similar: bool,
    },
    /// Write a new article
    New,
    /// Edit an existing article
    Edit { id: String },
    /// Let the AI improve an article's content
    Improve {
        id: String,
        /// Save the result
        #[arg(long)]
        save: bool,
    },
    /// Rewrite an article's content following an instruction
    Prompt {
        id: String,
        instruction: String,
        #[arg(long)]
        save: bool,
    },
    /// Delete an article
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let tokens = TokenStore::global().clone();
    let session_file = SessionFile::default_location();
    let session = if cli.offline { None } else { session_file.load()? };
    if let Some(session) = &session {
        tokens.set(session.token.clone());
    }

    let services = if cli.offline {
        info!("📴 Offline mode: articles live in memory for this run");
        Services::offline()
    } else {
        let config = ApiConfig::new(&cli.api_url)?.with_timeout(std::time::Duration::from_secs(cli.timeout));
        info!("🌐 Using API at {}", config.base_url);
        Services::remote(&config, tokens.clone(), cli.enrichment)?
    };

    let mut app = App::new(services, session_file, session);
    let result = app.run(cli.command).await;

    // A 401 during the command clears the token; drop the stale session too.
    if app.has_session() && !tokens.is_authenticated() {
        warn!("🔒 Session expired, please log in again");
        app.forget_session()?;
    }
    result
}
