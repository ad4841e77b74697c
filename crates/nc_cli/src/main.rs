use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use nc_core::milestones::extract_milestones;
use nc_core::normalize::normalize_articles;
use nc_core::timeline::assemble_timeline;
use nc_core::{Config, HeuristicAnnotator};
use nc_inference::{create_model, Services};
use nc_sources::sources::{build_client, FeedSource, Source};
use nc_sources::{gather, ReportBuilder, SourceManager};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "newscard", author, version, about = "News timeline, summary and credibility cards", long_about = None)]
struct Cli {
    /// Generative backend: gemini, deepseek or dummy
    #[arg(long, global = true)]
    model: Option<String>,

    /// Backend model identifier (e.g. models/gemini-2.5-flash)
    #[arg(long, global = true)]
    model_name: Option<String>,

    /// Queries naming a year at or before this one use the historical source
    #[arg(long, global = true)]
    cutoff: Option<i32>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true, global = true)]
    newsapi_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    gemini_api_key: Option<String>,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true, global = true)]
    deepseek_api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Full pipeline: articles, timelines, summary, credibility, consistency
    Report {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Fetch and normalize articles, through the fallback chain or from one source
    Fetch {
        query: String,
        /// google, gdelt, newsapi or wikipedia
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        max: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Heuristic timeline only; no generative backend needed
    Timeline {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Read any RSS/Atom feed
    Feed {
        url: String,
        #[arg(long, default_value_t = FeedSource::DEFAULT_MAX)]
        max: usize,
        #[arg(long)]
        json: bool,
    },
    /// List sources in fallback order
    Sources,
}

impl Cli {
    /// Environment configuration with command-line overrides on top.
    fn config(&self) -> Result<Config> {
        let mut config = Config::from_env()?;
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(name) = &self.model_name {
            config.model_name = name.clone();
        }
        if let Some(cutoff) = self.cutoff {
            config.historical_cutoff_year = cutoff;
        }
        if let Some(secs) = self.timeout {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        for (flag, slot) in [
            (&self.newsapi_key, &mut config.newsapi_key),
            (&self.gemini_api_key, &mut config.gemini_api_key),
            (&self.deepseek_api_key, &mut config.deepseek_api_key),
        ] {
            if let Some(key) = flag.as_ref().filter(|k| !k.trim().is_empty()) {
                *slot = Some(key.clone());
            }
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config()?;
    info!("⚙️ Configuration loaded: {:?}", config);

    match cli.command {
        Commands::Report { query, json } => {
            let model = create_model(&config)?;
            info!("🧠 Inference model initialized (using {})", model.name());
            let builder = ReportBuilder::new(SourceManager::new(&config)?, Services::new(model, &config));
            let report = builder.build(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::report(&report));
            }
        }
        Commands::Fetch {
            query,
            source,
            max,
            json,
        } => {
            let manager = SourceManager::new(&config)?;
            let articles = match source {
                Some(name) => {
                    let source = manager
                        .source_by_name(&name)
                        .ok_or_else(|| anyhow!("Unknown source '{}'. Run `newscard sources` for the list", name))?;
                    source.fetch(&query, max.unwrap_or_else(|| source.max_results())).await?
                }
                None => {
                    let mut articles = manager.fetch(&query).await?.articles;
                    if let Some(max) = max {
                        articles.truncate(max);
                    }
                    articles
                }
            };
            let articles = normalize_articles(articles);
            if json {
                println!("{}", serde_json::to_string_pretty(&articles)?);
            } else {
                print!("{}", render::articles(&articles));
            }
        }
        Commands::Timeline { query, json } => {
            let manager = SourceManager::new(&config)?;
            let fetched = gather(&manager, &HeuristicAnnotator::new(), &query).await?;
            let timeline = assemble_timeline(extract_milestones(&fetched.articles));
            if json {
                println!("{}", serde_json::to_string_pretty(&timeline)?);
            } else {
                println!("{} articles from {} ({} path)\n", fetched.articles.len(), fetched.source, fetched.path);
                print!("{}", render::milestones(&timeline));
            }
        }
        Commands::Feed { url, max, json } => {
            let feed = FeedSource::new(build_client(config.fetch_timeout)?, url);
            let articles = normalize_articles(feed.fetch("", max).await?);
            if json {
                println!("{}", serde_json::to_string_pretty(&articles)?);
            } else {
                print!("{}", render::articles(&articles));
            }
        }
        Commands::Sources => {
            let manager = SourceManager::new(&config)?;
            print!("{}", render::sources(&manager.list()));
        }
    }

    Ok(())
}
