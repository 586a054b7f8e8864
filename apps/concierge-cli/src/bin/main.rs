use anyhow::{bail, Context};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use concierge_core::config::{resolve_with_base, Config, Settings};
use concierge_core::data_processor::{ChunkingConfig, DataProcessor};
use concierge_core::traits::{ChatLogStore, HotelStore};
use concierge_core::types::{HotelId, ReportRange};
use concierge_embed::get_default_embedder;
use concierge_llm::OpenAiChatClient;
use concierge_rag::orchestrator::HISTORY_LIMIT;
use concierge_rag::{ChatOrchestrator, ChatRequest, GenerationConfig, RetrievalConfig};
use concierge_store::seed::SeedFile;
use concierge_store::{DocumentIndexer, IndexOutcome, SqliteStore};

const USAGE: &str = "Usage: concierge <command> [args...]

Commands:
  init                                      create the database schema
  seed <file.json>                          load hotels and FAQs
  ingest <hotel_id> <dir>                   embed and store every .txt file under <dir>
  ask <hotel_id> \"<question>\" [lang] [session]  answer a guest question
  history <hotel_id> <session>              show a session's chat log
  stats <hotel_id> [start end]              chat statistics, optionally between two dates";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn hotel_id_arg(args: &[String]) -> anyhow::Result<HotelId> {
    let raw = args.first().context("missing <hotel_id>")?;
    raw.parse().with_context(|| format!("hotel id must be a number, got {raw:?}"))
}

fn path_arg(args: &[String], index: usize, name: &str) -> anyhow::Result<PathBuf> {
    let raw = args.get(index).with_context(|| format!("missing <{name}>"))?;
    Ok(resolve_with_base(&env::current_dir()?, raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (cmd, args) = parse_args();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = Settings::from_config(&config)?;
    let store = Arc::new(SqliteStore::open(&settings.database_path())?);

    match cmd.as_str() {
        "init" => {
            println!("Database ready at {}", settings.database_path().display());
        }
        "seed" => {
            let path = path_arg(&args, 0, "file.json")?;
            let report = SeedFile::from_path(&path)?.apply(&store).await?;
            println!(
                "Seeded {} hotel(s) with {} FAQ(s); {} already present",
                report.hotels_created, report.faqs_created, report.hotels_skipped
            );
        }
        "ingest" => {
            let hotel_id = hotel_id_arg(&args)?;
            let dir = path_arg(&args, 1, "dir")?;
            if store.active_hotel(hotel_id).await?.is_none() {
                bail!("hotel {hotel_id} does not exist or is inactive");
            }
            let processor = DataProcessor::with_config(ChunkingConfig { max_tokens: settings.ingest.max_tokens });
            let documents = processor.process_directory(&dir)?;
            let embedder = get_default_embedder(&settings)?;
            let indexer = DocumentIndexer::new(store.clone(), embedder, processor);
            let outcomes = indexer.index_documents(hotel_id, &documents).await?;
            let (mut indexed, mut chunks, mut unchanged) = (0usize, 0usize, 0usize);
            for outcome in outcomes {
                match outcome {
                    IndexOutcome::Indexed { chunks: n, .. } => { indexed += 1; chunks += n; }
                    IndexOutcome::Unchanged { .. } => unchanged += 1,
                }
            }
            println!("Indexed {indexed} document(s) into {chunks} chunk(s); {unchanged} unchanged");
        }
        "ask" => {
            let hotel_id = hotel_id_arg(&args)?;
            let question = args.get(1).context("missing \"<question>\"")?;
            let mut request = ChatRequest::new(hotel_id, question.as_str());
            if let Some(language) = args.get(2) { request = request.with_language(language.as_str()); }
            if let Some(session) = args.get(3) { request = request.with_session(session.as_str()); }

            let mut builder = ChatOrchestrator::builder()
                .store(store.clone())
                .generator(Arc::new(OpenAiChatClient::new(&settings.openai)?))
                .retrieval_config(RetrievalConfig::from(&settings.retrieval))
                .generation_config(GenerationConfig::from(&settings.generation));
            if settings.retrieval.enabled {
                match get_default_embedder(&settings) {
                    Ok(embedder) => builder = builder.retrieval(embedder, store.clone()),
                    Err(e) => tracing::warn!(error = %e, "embedding provider unavailable, answering without documents"),
                }
            }
            let chat = builder.build()?;
            match chat.handle(request).await {
                Ok(response) => println!("{}", serde_json::to_string_pretty(&response)?),
                Err(e) => bail!("{e} (status {})", e.status_code()),
            }
        }
        "history" => {
            let hotel_id = hotel_id_arg(&args)?;
            let session = args.get(1).context("missing <session>")?;
            let rows = store.history(hotel_id, session, HISTORY_LIMIT).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "stats" => {
            let hotel_id = hotel_id_arg(&args)?;
            let range = match (args.get(1), args.get(2)) {
                (Some(start), Some(end)) => Some(ReportRange::parse(start, end)?),
                (Some(_), None) => bail!("stats needs both a start and an end date"),
                _ => None,
            };
            let summary = store.chat_summary(hotel_id, range).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => { eprintln!("Unknown command: {}\n\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}

