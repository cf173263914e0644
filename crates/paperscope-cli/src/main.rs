use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use paperscope_core::error::ExitCode;
use paperscope_core::storage::database::SCHEMA_VERSION;
use paperscope_core::{
    AppConfig, EntityKind, IngestSession, LookupConfig, PageCrawlerConfig, PaperscopeError,
    StorageSession, open_database,
};
use paperscope_crawler::{
    CrawlError, Crawler, FeedCrawler, IngestReport, IngestRunner, RestCrawler, load_vocabulary,
};
use paperscope_science::sources::CrossRefSource;
use paperscope_science::{QuerySyntax, RecordNormalizer, ScienceError, SearchStringGenerator};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "paperscope",
    about = "Crawl academic search sources and ingest papers into a relational store",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting PAPERSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured crawlers and ingest what they find.
    Run {
        /// Run a single crawler instead of every configured one.
        #[arg(long, value_enum)]
        only: Option<CrawlerKind>,
    },

    /// Create the database and apply migrations.
    InitDb,

    /// Show row counts per table.
    Stats,

    /// Draw search strings from the keyword vocabulary without crawling.
    Queries {
        #[arg(long, default_value = "5")]
        count: usize,
        #[arg(long, default_value = "plain")]
        syntax: QuerySyntax,
        /// Keyword CSV file (`group,bucket,keyword`).
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long, default_value = "3")]
        nb_keywords: usize,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CrawlerKind {
    Page,
    Feed,
    Rest,
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write the default configuration to the config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e) as i32);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let json_output = cli.json || std::env::var("PAPERSCOPE_JSON").as_deref() == Ok("1");
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Run { only } => {
            let pool = open_database(&config.database_path())?;
            let mut session = IngestSession::new(pool.get_connection());
            if config.storage.reset_on_start {
                warn!("reset_on_start is set, clearing all tables");
                session.clear()?;
            }

            let mut crawlers = build_crawlers(&config, only).await?;
            if crawlers.is_empty() {
                warn!("no crawler configured for this run");
            }

            let report = IngestRunner::new(config.storage.batch_size)
                .run(&mut session, &mut crawlers)
                .await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": report_json(&report),
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                print_report(&report);
            }
        }

        // ── Database ───────────────────────────────────────────────────────

        Commands::InitDb => {
            let path = config.database_path();
            open_database(&path)?;
            let dur = start.elapsed().as_millis();
            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "path": path.display().to_string(), "schema_version": SCHEMA_VERSION },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Database ready: {} (schema v{SCHEMA_VERSION})", path.display());
            }
        }

        Commands::Stats => {
            let pool = open_database(&config.database_path())?;
            let mut session = IngestSession::new(pool.get_connection());
            let mut counts = BTreeMap::new();
            for kind in EntityKind::ALL {
                counts.insert(kind.to_string(), session.count(kind)?);
            }
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({"status":"ok","data":counts,"meta":{"duration_ms":dur}}))?;
            } else {
                for (table, count) in &counts {
                    println!("{table:<14} {count}");
                }
            }
        }

        // ── Queries ────────────────────────────────────────────────────────

        Commands::Queries { count, syntax, keywords, nb_keywords } => {
            let vocabulary = load_vocabulary(keywords.as_deref())?;
            let queries = SearchStringGenerator::new(vocabulary, syntax)
                .with_max_terms(nb_keywords)
                .generate_distinct(count, &HashSet::new());
            let dur = start.elapsed().as_millis();

            if json_output {
                let items: Vec<_> = queries.iter().map(|q| q.payload()).collect();
                print_json(&serde_json::json!({"status":"ok","data":{"items":items,"total":items.len()},"meta":{"duration_ms":dur}}))?;
            } else {
                for query in &queries {
                    println!("{}", query.name);
                }
            }
        }

        // ── Config ─────────────────────────────────────────────────────────

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status":"ok","data":config}))?;
                } else {
                    print!("{}", toml::to_string_pretty(&config)?);
                }
            }
            ConfigAction::Path => {
                println!("{}", AppConfig::config_path().display());
            }
            ConfigAction::Init { force } => {
                let path = AppConfig::config_path();
                if path.exists() && !force {
                    eprintln!("Config already exists at {}. Add --force to overwrite.", path.display());
                    std::process::exit(ExitCode::InvalidArgs as i32);
                }
                AppConfig::default().save_to(&path)?;
                println!("Wrote {}", path.display());
            }
        },
    }

    Ok(())
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

fn normalizer(lookup: &LookupConfig) -> Result<Arc<RecordNormalizer>> {
    let api = CrossRefSource::with_params(
        &lookup.base_url,
        Duration::from_millis(lookup.min_interval_ms),
        lookup.polite_email.clone(),
    )?;
    Ok(Arc::new(RecordNormalizer::new(
        Arc::new(api),
        Duration::from_millis(lookup.timeout_ms),
    )))
}

async fn build_crawlers(config: &AppConfig, only: Option<CrawlerKind>) -> Result<Vec<Box<dyn Crawler>>> {
    let wanted = |kind: CrawlerKind| only.is_none_or(|o| o == kind);
    let normalizer = normalizer(&config.lookup)?;
    let mut crawlers: Vec<Box<dyn Crawler>> = Vec::new();

    if wanted(CrawlerKind::Page)
        && let Some(page) = &config.page
        && let Some(crawler) = page_crawler(page, normalizer.clone()).await?
    {
        crawlers.push(crawler);
    }

    if wanted(CrawlerKind::Feed)
        && let Some(feed) = &config.feed
    {
        let vocabulary = load_vocabulary(feed.keyword_file.as_deref())?;
        crawlers.push(Box::new(FeedCrawler::new(feed.clone(), vocabulary, normalizer.clone())?));
    }

    if wanted(CrawlerKind::Rest)
        && let Some(rest) = &config.rest
    {
        match std::env::var(&rest.api_key_env) {
            Ok(api_key) => {
                let vocabulary = load_vocabulary(rest.keyword_file.as_deref())?;
                crawlers.push(Box::new(RestCrawler::new(
                    rest.clone(),
                    &api_key,
                    vocabulary,
                    normalizer.clone(),
                )?));
            }
            Err(_) => warn!(env = %rest.api_key_env, "API key not set, skipping rest crawler"),
        }
    }

    info!(crawlers = crawlers.len(), "crawlers ready");
    Ok(crawlers)
}

#[cfg(feature = "chromium")]
async fn page_crawler(
    config: &PageCrawlerConfig,
    normalizer: Arc<RecordNormalizer>,
) -> Result<Option<Box<dyn Crawler>>> {
    use paperscope_crawler::{ChromiumDriver, PageCrawler};

    let timeout = Duration::from_secs(config.timeout_secs);
    let list = ChromiumDriver::launch(config.headless[0], timeout).await?;
    let detail = ChromiumDriver::launch(config.headless[1], timeout).await?;
    let vocabulary = load_vocabulary(config.keyword_file.as_deref())?;
    Ok(Some(Box::new(PageCrawler::new(config, list, detail, vocabulary, normalizer))))
}

#[cfg(not(feature = "chromium"))]
async fn page_crawler(
    _config: &PageCrawlerConfig,
    _normalizer: Arc<RecordNormalizer>,
) -> Result<Option<Box<dyn Crawler>>> {
    warn!("page crawler needs a build with the `chromium` feature, skipping");
    Ok(None)
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn report_json(report: &IngestReport) -> serde_json::Value {
    let crawlers: Vec<_> = report
        .per_crawler
        .iter()
        .map(|run| {
            serde_json::json!({
                "name": run.name,
                "retrieved": run.retrieved,
                "inserted": run.inserted,
                "elapsed_ms": run.elapsed.as_millis() as u64,
            })
        })
        .collect();
    serde_json::json!({
        "inserted": report.inserted,
        "duplicates": report.duplicates,
        "crawlers": crawlers,
    })
}

fn print_report(report: &IngestReport) {
    for run in &report.per_crawler {
        println!(
            "{name:<6} retrieved {retrieved:>5}  inserted {inserted:>5}  in {secs:.1}s",
            name = run.name,
            retrieved = run.retrieved,
            inserted = run.inserted,
            secs = run.elapsed.as_secs_f64(),
        );
    }
    println!("{} rows were actually inserted", report.inserted);
    if !report.duplicates.is_empty() {
        println!("Duplicates ({}):", report.duplicates.len());
        for title in &report.duplicates {
            println!("  {title}");
        }
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let core = err.downcast_ref::<PaperscopeError>().or_else(|| match err.downcast_ref::<CrawlError>() {
        Some(CrawlError::Core(e)) => Some(e),
        _ => None,
    });
    if let Some(e) = core {
        return match e {
            PaperscopeError::Database(_) => ExitCode::StorageError,
            PaperscopeError::ConfigError(_) | PaperscopeError::TomlParse(_) => ExitCode::InvalidArgs,
            _ => ExitCode::GeneralError,
        };
    }

    let science = err.downcast_ref::<ScienceError>().or_else(|| match err.downcast_ref::<CrawlError>() {
        Some(CrawlError::Science(e)) => Some(e),
        _ => None,
    });
    match science {
        Some(ScienceError::Http(_) | ScienceError::ApiError(..) | ScienceError::RateLimit(..)) => {
            ExitCode::NetworkError
        }
        Some(ScienceError::Vocabulary(_)) => ExitCode::InvalidArgs,
        _ => ExitCode::GeneralError,
    }
}
