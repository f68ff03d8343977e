//! Truth Signals
//!
//! Turns the latest Truth Social posts into BUY/SELL/HOLD signals.

use clap::{Parser, Subcommand};
use truth_signals::{config::Config, ingester::PostFetcher, pipeline::SignalPipeline, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "truth-signals")]
#[command(about = "Sentiment trading signals from Truth Social posts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,
    /// Print signals for the latest posts
    Signals {
        /// Number of signals to show (defaults to server.default_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print normalized posts
    Posts {
        /// Pages to fetch (defaults to posts.max_pages)
        #[arg(short, long)]
        pages: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve => server::serve(&config).await,
        Commands::Signals { limit, json } => show_signals(config, limit, json).await,
        Commands::Posts { pages } => show_posts(config, pages).await,
    }
}

async fn show_signals(config: Config, limit: Option<usize>, json: bool) -> anyhow::Result<()> {
    let pipeline = SignalPipeline::from_config(&config)?;
    let limit = limit.unwrap_or(config.server.default_limit);
    let signals = pipeline.latest_signals(Some(limit)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&signals)?);
        return Ok(());
    }

    println!("\n📈 Latest {} signals:\n", signals.len());
    println!("{:<6} {:<9} {:<22} {}", "Signal", "Sentiment", "Posted", "Text");
    println!("{}", "-".repeat(90));
    for signal in &signals {
        println!(
            "{:<6} {:<9} {:<22} {}",
            signal.signal.as_str(),
            signal.sentiment.as_str(),
            signal.post.created_at().format("%Y-%m-%d %H:%M UTC"),
            preview(signal.post.text(), 50)
        );
    }
    Ok(())
}

async fn show_posts(config: Config, pages: Option<u32>) -> anyhow::Result<()> {
    let fetcher = PostFetcher::from_config(&config.posts)?;
    let pages = pages.unwrap_or(config.posts.max_pages);
    let posts = fetcher
        .fetch_posts_with_deadline(pages, config.posts.deadline())
        .await?;

    println!("\n📰 {} posts from {} page(s):\n", posts.len(), pages);
    for post in &posts {
        println!(
            "[{}] {} {}",
            post.created_at().format("%Y-%m-%d %H:%M"),
            post.id(),
            preview(post.text(), 70)
        );
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > max_chars {
        format!("{}...", flat.chars().take(max_chars - 3).collect::<String>())
    } else {
        flat
    }
}
