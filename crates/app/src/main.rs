use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use policy_index_core::{
    backfill_snippets, classify_documents, ingest_federal, ingest_legislative, purge_collection,
    purge_zero_keyword, recount_keywords, AnalysisCache, ChatCompletionsOracle, DocumentFilter,
    DocumentStore, FederalArchive, FetchOptions, GovInfoClient, LegislativeArchive,
    OpenSearchStore, OracleConfig, PipelineOptions, ReconcileReport, SourceArchive,
    SourceCollection, Vocabulary,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "policy-index", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// OpenSearch base URL
    #[arg(long, env = "OPENSEARCH_URL", default_value = "http://localhost:9200")]
    opensearch_url: String,

    /// OpenSearch index name
    #[arg(long, env = "OPENSEARCH_INDEX", default_value = "policy_documents")]
    opensearch_index: String,

    /// Root of the legislative bulk cache (`bill/` and `text/` below it).
    #[arg(long, env = "LEGISCAN_ROOT", default_value = "legiscan")]
    legiscan_root: PathBuf,

    /// Root of the federal download area (`content_list.json`, `txt_files/`, `pdf_files/`).
    #[arg(long, env = "GOVINFO_ROOT", default_value = "govinfo")]
    govinfo_root: PathBuf,

    /// Directory holding one cached analysis per document.
    #[arg(long, env = "ANALYSIS_DIR", default_value = "analyses")]
    analysis_dir: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Legislative,
    Federal,
    All,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize upstream records and reconcile them against the index.
    Ingest {
        #[arg(long, value_enum, default_value = "all")]
        source: Source,
    },
    /// Recompute keyword counts and snippets for every stored document.
    Recount,
    /// Fill snippets for stored documents that have none.
    BackfillSnippets,
    /// Delete every document without keyword matches.
    PurgeIrrelevant {
        /// Skip the confirmation prompt.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Delete every document of one source collection.
    PurgeCollection {
        /// Collection code (e.g. CHRG) or full name.
        collection: String,
        /// Skip the confirmation prompt.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Score unclassified documents, reusing cached analyses.
    Classify {
        /// Only documents whose status date is on or after this day.
        #[arg(long, default_value = "2023-01-01")]
        since: NaiveDate,
    },
    /// Refresh the federal content list and download missing files.
    FetchFederal {
        #[arg(long, env = "GOVINFO_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let vocabulary = Vocabulary::standard()?;
    let store = OpenSearchStore::new(&cli.opensearch_url, &cli.opensearch_index);
    let archive = SourceArchive {
        legislative: LegislativeArchive::from_root(&cli.legiscan_root),
        federal: FederalArchive::from_root(&cli.govinfo_root),
    };

    info!(
        version = app_version,
        vocabulary_version = vocabulary.version(),
        started_at = %Utc::now().to_rfc3339(),
        "policy-index boot"
    );

    match cli.command {
        Command::Ingest { source } => {
            store.ensure_index().await?;
            let options = PipelineOptions::default();

            if matches!(source, Source::Legislative | Source::All) {
                let report = ingest_legislative(&archive, &store, &vocabulary, options).await?;
                print_ingest_report("legislative", &report);
            }
            if matches!(source, Source::Federal | Source::All) {
                let report = ingest_federal(&archive, &store, &vocabulary, options).await?;
                print_ingest_report("federal", &report);
            }
        }
        Command::Recount => {
            let snippets = PipelineOptions::default().snippets;
            let report = recount_keywords(&store, &vocabulary, snippets).await?;
            println!(
                "recount: examined={} updated={} vocabulary_version={}",
                report.examined,
                report.updated,
                vocabulary.version()
            );
        }
        Command::BackfillSnippets => {
            let snippets = PipelineOptions::default().snippets;
            let report = backfill_snippets(&store, &vocabulary, snippets).await?;
            println!(
                "backfill-snippets: examined={} updated={}",
                report.examined, report.updated
            );
        }
        Command::PurgeIrrelevant { yes } => {
            let pending = store.count(&DocumentFilter::zero_keywords()).await?;
            if !yes && !confirm(&format!("Delete {pending} documents without keyword matches?"))? {
                println!("purge-irrelevant: cancelled");
                return Ok(());
            }
            let removed = purge_zero_keyword(&store).await?;
            println!("purge-irrelevant: removed={removed}");
        }
        Command::PurgeCollection { collection, yes } => {
            let collection = SourceCollection::from_code(&collection)
                .or_else(|_| SourceCollection::from_name(&collection))?;
            let pending = store.count(&DocumentFilter::collection(collection)).await?;
            if !yes && !confirm(&format!("Delete {pending} documents from {collection}?"))? {
                println!("purge-collection: cancelled");
                return Ok(());
            }
            let removed = purge_collection(&store, collection).await?;
            println!("purge-collection: collection={collection} removed={removed}");
        }
        Command::Classify { since } => {
            let oracle = ChatCompletionsOracle::new(OracleConfig::from_env());
            let cache = AnalysisCache::new(&cli.analysis_dir);
            let report = classify_documents(&store, &oracle, &cache, since).await?;

            for (url, reason) in &report.failed {
                warn!(url = %url, reason = %reason, "not classified");
            }
            println!(
                "classify: examined={} classified={} from_cache={} failed={}",
                report.examined,
                report.classified,
                report.from_cache,
                report.failed.len()
            );
        }
        Command::FetchFederal { api_key } => {
            let client = GovInfoClient::new(api_key, FetchOptions::default());
            let report = client
                .refresh(&archive.federal, &vocabulary, Utc::now().date_naive())
                .await?;

            for failure in &report.failures {
                warn!(failure = %failure, "fetch problem");
            }
            println!(
                "fetch-federal: collections={} items_added={} rejected={} downloaded={} failures={}",
                report.collections_queried,
                report.items_added,
                report.rejected.join(","),
                report.downloaded,
                report.failures.len()
            );
        }
    }

    Ok(())
}

fn print_ingest_report(source: &str, report: &ReconcileReport) {
    for skipped in &report.skipped {
        warn!(record = %skipped.label, reason = %skipped.reason, "skipped record");
    }
    for key in &report.ambiguous {
        warn!(key = %key, "ambiguous match needs manual review");
    }

    println!(
        "{source}: added={} updated={} replaced={} unchanged={} not_added={} skipped={} conflicts={} ambiguous={}",
        report.added,
        report.updated,
        report.replaced,
        report.unchanged,
        report.not_added,
        report.skipped.len(),
        report.conflicts,
        report.ambiguous.len()
    );
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} (y/n) ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
