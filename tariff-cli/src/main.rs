//! `tariffctl`: the admin CLI for the tariff stacking engine and
//! evidence pipeline (spec.md §6). Exit 0 on success, 2 on a validation
//! error, 1 on an infrastructure error.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tariff_core::config::{AppConfig, BlobBackendKind};
use tariff_core::errors::error_code::TariffErrorCode;
use tariff_core::traits::blob::BlobBackend;
use tariff_core::traits::evidence_store::{IAssertionCache, IDocumentStore, IReviewQueue};
use tariff_core::traits::tariff_store::ITariffStore;
use tariff_core::types::assertion::AssertionType;
use tariff_core::types::hts::HtsCode;
use tariff_core::types::measure::RateStatus;
use tariff_core::types::program::{Metal, ProgramId};
use tariff_core::types::review::ReviewStatus;
use tariff_evidence::blob::{LocalBlobBackend, S3BlobBackend};
use tariff_evidence::chunker::{chunk_text, ChunkerConfig};
use tariff_evidence::connectors::{CsmsConnector, FederalRegisterConnector, TrustedConnector, UsitcConnector};
use tariff_evidence::orchestrator::ingest_document;
use tariff_storage::TariffStorageEngine;

#[derive(Parser, Debug)]
#[command(name = "tariffctl", version, about = "Admin CLI for the tariff stacking engine")]
struct Cli {
    /// Path to a TOML config file (spec.md §6 configuration). Falls back
    /// to defaults overlaid with environment variables when absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a document through a trusted connector and chunk it.
    Ingest {
        #[arg(long, value_enum)]
        connector: ConnectorKind,
        #[arg(long)]
        url: String,
    },
    /// Re-chunk every stored document's extracted text with the
    /// connector's current chunker settings.
    ReindexChunks,
    /// Answer a scope verification query from the tariff store and
    /// verified-assertion cache, without ingesting anything new.
    Verify {
        #[arg(long)]
        hts: String,
        #[arg(long)]
        program: String,
        #[arg(long)]
        material: Option<String>,
    },
    /// Inspect or update the needs-review queue.
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Print document, review-queue, and chunk counts.
    Stats,
}

#[derive(Subcommand, Debug)]
enum ReviewAction {
    List,
    Resolve { id: String },
    Dismiss { id: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConnectorKind {
    Csms,
    /// Alias for the Federal Register connector; `govinfo` is the
    /// public-facing name CBP bulletins usually cite it by (spec.md §6).
    Govinfo,
    FederalRegister,
    Usitc,
}

impl ConnectorKind {
    fn build(self) -> Box<dyn TrustedConnector> {
        match self {
            Self::Csms => Box::new(CsmsConnector),
            Self::Govinfo | Self::FederalRegister => Box::new(FederalRegisterConnector),
            Self::Usitc => Box::new(UsitcConnector),
        }
    }
}

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_env("TARIFF_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => match AppConfig::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("error: failed to load config {}: {e}", path.display());
                return 2;
            }
        },
        None => {
            let mut cfg = AppConfig::default();
            cfg.overlay_env();
            cfg
        }
    };

    let engine = match TariffStorageEngine::open(std::path::Path::new(&config.effective_database_url())) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: failed to open database: {e}");
            return exit_code_for(e.error_code());
        }
    };

    match cli.command {
        Command::Ingest { connector, url } => run_ingest(&engine, &config, connector, &url),
        Command::ReindexChunks => run_reindex_chunks(&engine, &config),
        Command::Verify { hts, program, material } => run_verify(&engine, &hts, &program, material.as_deref()),
        Command::Review { action } => run_review(&engine, action),
        Command::Stats => run_stats(&engine),
    }
}

fn build_blob_backend(config: &AppConfig) -> Box<dyn BlobBackend> {
    match config.effective_storage_backend() {
        BlobBackendKind::Local => Box::new(LocalBlobBackend::new(config.effective_storage_path())),
        BlobBackendKind::S3 => {
            let bucket = config.s3_bucket.clone().unwrap_or_default();
            let endpoint = config.s3_endpoint.clone().unwrap_or_default();
            Box::new(S3BlobBackend::new(endpoint, bucket))
        }
    }
}

fn run_ingest(engine: &TariffStorageEngine, config: &AppConfig, connector_kind: ConnectorKind, url: &str) -> i32 {
    let connector = connector_kind.build();
    let blob_backend = build_blob_backend(config);
    let chunker_config = ChunkerConfig {
        min_size: config.effective_chunk_min_size(),
        max_size: config.effective_chunk_max_size(),
        overlap: config.effective_chunk_overlap(),
        ..ChunkerConfig::default()
    };

    match ingest_document(
        connector.as_ref(),
        url,
        &chunker_config,
        engine,
        blob_backend.as_ref(),
        config.effective_connector_retry_max_attempts(),
        config.effective_connector_retry_backoff_ms(),
    ) {
        Ok((document_id, chunks)) => {
            print_json(&serde_json::json!({
                "document_id": document_id,
                "chunks": chunks.len(),
            }));
            0
        }
        Err(e) => {
            eprintln!("error: ingestion failed: {e}");
            exit_code_for(e.error_code())
        }
    }
}

fn run_reindex_chunks(engine: &TariffStorageEngine, config: &AppConfig) -> i32 {
    let chunker_config = ChunkerConfig {
        min_size: config.effective_chunk_min_size(),
        max_size: config.effective_chunk_max_size(),
        overlap: config.effective_chunk_overlap(),
        ..ChunkerConfig::default()
    };

    let ids = match engine.list_document_ids() {
        Ok(ids) => ids,
        Err(e) => {
            eprintln!("error: failed to list documents: {e}");
            return exit_code_for(e.error_code());
        }
    };

    let mut reindexed = 0usize;
    for document_id in &ids {
        let document = match engine.get_document(document_id) {
            Ok(Some(d)) => d,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("error: failed to load document {document_id}: {e}");
                return exit_code_for(e.error_code());
            }
        };
        let chunks = chunk_text(&document.extracted_text, document_id, &chunker_config);
        if let Err(e) = engine.replace_chunks(document_id, chunks) {
            eprintln!("error: failed to replace chunks for {document_id}: {e}");
            return exit_code_for(e.error_code());
        }
        reindexed += 1;
    }

    print_json(&serde_json::json!({ "documents_reindexed": reindexed }));
    0
}

#[derive(Serialize)]
struct RagResult {
    source: &'static str,
    is_verified: bool,
    in_scope: Option<bool>,
    claim_codes: Vec<String>,
    disclaim_codes: Vec<String>,
    evidence_quote: Option<String>,
    document_id: Option<String>,
    chunk_id: Option<String>,
}

fn run_verify(engine: &TariffStorageEngine, hts_raw: &str, program_raw: &str, material_raw: Option<&str>) -> i32 {
    let hts = match HtsCode::parse(hts_raw) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: invalid HTS code: {e}");
            return 2;
        }
    };
    let program_id = match ProgramId::from_str(program_raw) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: invalid program id: {e}");
            return 2;
        }
    };
    let material = match material_raw.map(Metal::from_str).transpose() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("error: invalid material: {e}");
            return 2;
        }
    };

    let today = chrono::Utc::now().date_naive();
    let result = match engine.lookup_measures(program_id, hts.hts8().as_deref(), hts.hts10().as_deref(), today) {
        Ok(measures) if !measures.is_empty() => {
            let measure = &measures[0];
            RagResult {
                source: match measure.rate_status {
                    RateStatus::Confirmed => "rag_verified",
                    RateStatus::Pending => "rag_pending",
                },
                is_verified: measure.rate_status == RateStatus::Confirmed,
                in_scope: Some(true),
                claim_codes: vec![measure.ch99_heading.clone()],
                disclaim_codes: Vec::new(),
                evidence_quote: None,
                document_id: None,
                chunk_id: None,
            }
        }
        Ok(_) => match engine.lookup(program_id, hts.digits(), material, AssertionType::InScope, today) {
            Ok(Some(assertion)) => RagResult {
                source: "verified_cache",
                is_verified: true,
                in_scope: Some(assertion.assertion_type == AssertionType::InScope),
                claim_codes: assertion.claim_code.clone().into_iter().collect(),
                disclaim_codes: assertion.disclaim_code.clone().into_iter().collect(),
                evidence_quote: Some(assertion.evidence_quote.clone()),
                document_id: Some(assertion.document_id.clone()),
                chunk_id: Some(assertion.chunk_id.clone()),
            },
            Ok(None) => RagResult {
                source: "discovery_needed",
                is_verified: false,
                in_scope: None,
                claim_codes: Vec::new(),
                disclaim_codes: Vec::new(),
                evidence_quote: None,
                document_id: None,
                chunk_id: None,
            },
            Err(e) => {
                eprintln!("error: assertion cache lookup failed: {e}");
                return exit_code_for(e.error_code());
            }
        },
        Err(e) => {
            eprintln!("error: measure lookup failed: {e}");
            return exit_code_for(e.error_code());
        }
    };

    print_json(&result);
    0
}

fn run_review(engine: &TariffStorageEngine, action: ReviewAction) -> i32 {
    match action {
        ReviewAction::List => match engine.list(Some(ReviewStatus::Pending)) {
            Ok(entries) => {
                print_json(&entries.iter().map(review_entry_json).collect::<Vec<_>>());
                0
            }
            Err(e) => {
                eprintln!("error: failed to list review queue: {e}");
                exit_code_for(e.error_code())
            }
        },
        ReviewAction::Resolve { id } => set_review_status(engine, &id, ReviewStatus::Resolved),
        ReviewAction::Dismiss { id } => set_review_status(engine, &id, ReviewStatus::Dismissed),
    }
}

fn set_review_status(engine: &TariffStorageEngine, id: &str, status: ReviewStatus) -> i32 {
    match engine.set_status(id, status) {
        Ok(()) => {
            print_json(&serde_json::json!({ "id": id, "status": format!("{status:?}") }));
            0
        }
        Err(e) => {
            eprintln!("error: failed to update review entry {id}: {e}");
            exit_code_for(e.error_code())
        }
    }
}

fn review_entry_json(entry: &tariff_core::types::review::NeedsReviewEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "hts_code": entry.hts_code,
        "query_type": entry.query_type,
        "block_reason": entry.block_reason,
        "priority": entry.priority,
        "status": format!("{:?}", entry.status),
    })
}

fn run_stats(engine: &TariffStorageEngine) -> i32 {
    let documents = match engine.count_documents() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: failed to count documents: {e}");
            return exit_code_for(e.error_code());
        }
    };
    let pending = match engine.list(Some(ReviewStatus::Pending)) {
        Ok(entries) => entries.len(),
        Err(e) => {
            eprintln!("error: failed to count pending review entries: {e}");
            return exit_code_for(e.error_code());
        }
    };
    let resolved = match engine.list(Some(ReviewStatus::Resolved)) {
        Ok(entries) => entries.len(),
        Err(e) => {
            eprintln!("error: failed to count resolved review entries: {e}");
            return exit_code_for(e.error_code());
        }
    };

    print_json(&serde_json::json!({
        "documents": documents,
        "review_queue_pending": pending,
        "review_queue_resolved": resolved,
    }));
    0
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("error: failed to serialize output: {e}"),
    }
}

/// Maps a stable error code (spec.md §7) onto the process exit codes the
/// CLI surface promises: validation failures are the caller's fault (2),
/// everything else is infrastructure (1).
fn exit_code_for(code: &str) -> i32 {
    const VALIDATION_CODES: &[&str] = &[
        tariff_core::errors::error_code::VALIDATION_ERROR,
        tariff_core::errors::error_code::INVALID_HTS_CODE,
        tariff_core::errors::error_code::INVALID_COUNTRY_CODE,
        tariff_core::errors::error_code::INVALID_MONEY_AMOUNT,
        tariff_core::errors::error_code::INVALID_MATERIAL_ALLOCATION,
        tariff_core::errors::error_code::UNTRUSTED_SOURCE,
    ];
    if VALIDATION_CODES.contains(&code) {
        2
    } else {
        1
    }
}
