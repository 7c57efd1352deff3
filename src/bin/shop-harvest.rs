//! shop-harvest CLI
//!
//! Harvests ranked products for one search term and saves them as JSON.

use anyhow::Context;
use clap::Parser;
use shop_harvest::browser::{BrowserSession, ConnectionOptions, LaunchOptions};
use shop_harvest::harvest::{HarvestConfig, Harvester, MAX_TILES, SCROLL_STEPS};
use shop_harvest::persist::save_results;
use shop_harvest::schema::{LlmConfig, LlmSchemaGenerator, SAMPLE_SIDEBAR_HTML, obtain_schema};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shop-harvest")]
#[command(version)]
#[command(about = "Harvest product comparisons from a shopping results page", long_about = None)]
struct Cli {
    /// Search term (prompted for when omitted)
    query: Option<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// WebSocket endpoint of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Cached extraction schema
    #[arg(long, value_name = "FILE", default_value = "gshop_sidebar_schema.json")]
    schema_path: PathBuf,

    /// Regenerate the schema even when a cached one exists
    #[arg(long)]
    regenerate_schema: bool,

    /// Maximum number of tiles to visit
    #[arg(long, default_value_t = MAX_TILES)]
    max_tiles: usize,

    /// Viewport scrolls before visiting tiles
    #[arg(long, default_value_t = SCROLL_STEPS)]
    scroll_steps: usize,

    /// Stop after this many unusable tiles in a row
    #[arg(long, value_name = "N")]
    max_consecutive_failures: Option<usize>,

    /// Directory for result files
    #[arg(long, value_name = "DIR", default_value = "scrapes")]
    out_dir: PathBuf,

    /// Model used for schema generation
    #[arg(long, default_value = "openai/gpt-4.1-nano")]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, value_name = "URL", default_value = "https://api.openai.com/v1")]
    llm_base_url: String,

    /// API key for schema generation
    #[arg(long, env = "LLM_KEY", hide_env_values = true)]
    llm_key: Option<String>,
}

fn read_query() -> io::Result<String> {
    print!("Google Shopping search term: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let Some(llm_key) = cli.llm_key.clone() else {
        eprintln!("Set LLM_KEY");
        std::process::exit(1);
    };

    let query = match cli.query.clone() {
        Some(query) => query.trim().to_string(),
        None => read_query().context("Failed to read search term")?,
    };
    if query.is_empty() {
        eprintln!("No query given - exiting.");
        std::process::exit(1);
    }

    let generator = LlmSchemaGenerator::new(LlmConfig::new(llm_key).model(&cli.model).base_url(&cli.llm_base_url))?;
    let schema = obtain_schema(SAMPLE_SIDEBAR_HTML, &cli.schema_path, cli.regenerate_schema, &generator)
        .context("Could not obtain a usable extraction schema")?;

    let mut session = match cli.ws_endpoint.as_deref() {
        Some(endpoint) => BrowserSession::connect(ConnectionOptions::new(endpoint))?,
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            if let Some(path) = cli.chrome_path.clone() {
                options = options.chrome_path(path);
            }
            BrowserSession::launch(options)?
        }
    };

    let config = HarvestConfig::new()
        .max_tiles(cli.max_tiles)
        .scroll_steps(cli.scroll_steps)
        .max_consecutive_failures(cli.max_consecutive_failures);

    let results = Harvester::new(&mut session, &schema, &config).run(&query);
    session.close()?;

    let path = save_results(&results, &cli.out_dir)?;
    println!("Saved {} products to {}", results.total_products(), path.display());

    Ok(())
}
