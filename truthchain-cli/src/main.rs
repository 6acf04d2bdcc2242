//! TruthChain CLI
//!
//! Verify text, URLs and images with a remote model, falling back to local
//! heuristics, and record verdicts on chain.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use truthchain_ai::{
    create_anthropic_backend, create_backend, create_gemini_backend, AnthropicConfig,
    ContentAnalyzer, GeminiConfig, HuggingFaceClassifier, HuggingFaceConfig, OpenAIBackendConfig,
    PromptRegistry, SharedBackend, SWIN_MODEL, VIT_MODEL,
};
use truthchain_core::{
    format_address, format_content_hash, ConfidenceBand, Content, ImageData, VerificationResult,
};
use truthchain_ledger::{Ledger, RpcLedger, RpcLedgerConfig, SharedLedger, VerificationRecord};
use truthchain_runtime::{HistoryStore, VerificationReport, Verifier, VerifierConfig};

#[derive(Parser)]
#[command(name = "truthchain")]
#[command(author, version, about = "TruthChain: AI content verification with on-chain records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,

    /// History file (default: ~/.truthchain_history.json)
    #[arg(long, env = "TRUTHCHAIN_HISTORY_FILE", global = true)]
    history_file: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    ledger: LedgerArgs,
}

#[derive(Args)]
struct LedgerArgs {
    /// Skip on-chain lookups and writes
    #[arg(long, global = true)]
    no_ledger: bool,

    /// JSON-RPC endpoint (or set TRUTHCHAIN_RPC_URL)
    #[arg(long, env = "TRUTHCHAIN_RPC_URL", global = true)]
    rpc_url: Option<String>,

    /// Verification contract address (or set TRUTHCHAIN_CONTRACT_ADDRESS)
    #[arg(long, env = "TRUTHCHAIN_CONTRACT_ADDRESS", global = true)]
    contract: Option<String>,

    /// Unlocked account used for writes (or set TRUTHCHAIN_SENDER)
    #[arg(long, env = "TRUTHCHAIN_SENDER", global = true)]
    sender: Option<String>,
}

#[derive(Args)]
#[group(multiple = false)]
struct InputArgs {
    /// Text statement to verify
    #[arg(long)]
    text: Option<String>,

    /// URL to verify
    #[arg(long)]
    url: Option<String>,

    /// Image file to verify
    #[arg(long)]
    image: Option<PathBuf>,

    /// Image as a data:image/...;base64 URI
    #[arg(long)]
    image_uri: Option<String>,
}

impl InputArgs {
    fn into_content(self) -> Result<Option<Content>> {
        if let Some(text) = self.text {
            return Ok(Some(Content::Text(text)));
        }
        if let Some(url) = self.url {
            return Ok(Some(Content::Url(url)));
        }
        if let Some(path) = self.image {
            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            return Ok(Some(Content::Image(ImageData::from_bytes(bytes)?)));
        }
        if let Some(uri) = self.image_uri {
            return Ok(Some(Content::Image(ImageData::from_data_uri(&uri)?)));
        }
        Ok(None)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    Gemini,
    Openai,
    Openrouter,
    Anthropic,
    /// Local heuristics only
    None,
}

#[derive(Args)]
struct ProviderArgs {
    /// Remote model provider
    #[arg(short, long, value_enum, default_value = "gemini")]
    provider: Provider,

    /// Model name (provider default if omitted)
    #[arg(short, long)]
    model: Option<String>,

    /// Gemini API key (or set GEMINI_API_KEY env var)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_key: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_key: Option<String>,

    /// Hugging Face token for the image classifiers (or set HF_API_TOKEN)
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    hf_token: Option<String>,

    /// Disable the image classifier fallback
    #[arg(long)]
    no_classifiers: bool,

    /// Directory of TOML prompt overrides
    #[arg(long)]
    prompts_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a piece of content
    Verify {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Look up the on-chain record for content or a content hash
    Lookup {
        /// Content hash (0x-prefixed Keccak-256)
        #[arg(long)]
        hash: Option<String>,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Show recent verifications
    History {
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete the local history
    ClearHistory,

    /// Show statistics over the local history
    Stats,

    /// Show configured providers, classifiers and ledger
    Status {
        #[command(flatten)]
        provider: ProviderArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let history = HistoryStore::new(
        cli.history_file
            .clone()
            .unwrap_or_else(HistoryStore::default_path),
    );

    match cli.command {
        Commands::Verify { input, provider } => {
            let content = input.into_content()?.ok_or_else(|| {
                anyhow::anyhow!("Provide one of --text, --url, --image or --image-uri")
            })?;
            let analyzer = build_analyzer(&provider)?;
            let ledger = build_ledger(&cli.ledger)?;
            run_verify(content, analyzer, ledger, history, cli.json).await?;
        }
        Commands::Lookup { hash, input } => {
            let hash = match (hash, input.into_content()?) {
                (Some(hash), _) => hash,
                (None, Some(content)) => content.hash(),
                (None, None) => anyhow::bail!("Provide --hash or the content to look up"),
            };
            let ledger = build_ledger(&cli.ledger)?.ok_or_else(|| {
                anyhow::anyhow!(
                    "No ledger configured. Set TRUTHCHAIN_CONTRACT_ADDRESS or use --contract"
                )
            })?;
            run_lookup(&hash, ledger, cli.json).await?;
        }
        Commands::History { limit } => show_history(&history, limit, cli.json)?,
        Commands::ClearHistory => {
            history.clear()?;
            println!("🗑️  History cleared: {}", history.path().display());
        }
        Commands::Stats => show_stats(&history, cli.json)?,
        Commands::Status { provider } => check_status(&provider, &cli.ledger, &history)?,
    }

    Ok(())
}

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => "gemini-2.0-flash",
        Provider::Openai => "gpt-4o-mini",
        Provider::Openrouter => "openai/gpt-4o-mini",
        Provider::Anthropic => "claude-sonnet-4-20250514",
        Provider::None => "",
    }
}

fn provider_key(args: &ProviderArgs) -> Option<&str> {
    let key = match args.provider {
        Provider::Gemini => args.gemini_key.as_deref(),
        Provider::Openai => args.api_key.as_deref(),
        Provider::Openrouter => args.openrouter_key.as_deref(),
        Provider::Anthropic => args.anthropic_key.as_deref(),
        Provider::None => None,
    };
    key.filter(|k| !k.is_empty())
}

fn provider_name(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => "Google Gemini",
        Provider::Openai => "OpenAI",
        Provider::Openrouter => "OpenRouter",
        Provider::Anthropic => "Anthropic",
        Provider::None => "none",
    }
}

/// Remote backend for the selected provider, `None` when unavailable
fn build_backend(args: &ProviderArgs) -> Result<Option<SharedBackend>> {
    if args.provider == Provider::None {
        return Ok(None);
    }

    let Some(key) = provider_key(args) else {
        warn!(
            "No API key for {}, using local analysis only",
            provider_name(args.provider)
        );
        return Ok(None);
    };

    let model = args
        .model
        .as_deref()
        .unwrap_or_else(|| default_model(args.provider));

    let backend = match args.provider {
        Provider::Gemini => create_gemini_backend(GeminiConfig::new(key, model))?,
        Provider::Openai => create_backend(OpenAIBackendConfig::openai(key, model))?,
        Provider::Openrouter => create_backend(OpenAIBackendConfig::openrouter(key, model))?,
        Provider::Anthropic => create_anthropic_backend(AnthropicConfig::new(key, model))?,
        Provider::None => return Ok(None),
    };

    Ok(Some(backend))
}

fn build_analyzer(args: &ProviderArgs) -> Result<ContentAnalyzer> {
    let mut analyzer = ContentAnalyzer::new();

    if let Some(dir) = &args.prompts_dir {
        let prompts = PromptRegistry::load_embedded()
            .load_from_dir(dir)
            .with_context(|| format!("Failed to load prompts from {}", dir.display()))?;
        analyzer = analyzer.with_prompts(prompts);
    }

    if let Some(backend) = build_backend(args)? {
        info!("Using {}", backend.display_name());
        analyzer = analyzer.with_backend(backend);
    }

    if !args.no_classifiers {
        let classifier = |model: &str| {
            HuggingFaceClassifier::new(HuggingFaceConfig {
                api_token: args.hf_token.clone(),
                ..HuggingFaceConfig::for_model(model)
            })
        };
        analyzer = analyzer.with_classifiers(
            Arc::new(classifier(VIT_MODEL)?),
            Arc::new(classifier(SWIN_MODEL)?),
        );
    }

    Ok(analyzer)
}

fn ledger_config(args: &LedgerArgs) -> RpcLedgerConfig {
    let mut config = RpcLedgerConfig::default();
    if let Some(rpc_url) = &args.rpc_url {
        config.rpc_url = rpc_url.clone();
    }
    if let Some(contract) = &args.contract {
        config.contract_address = contract.clone();
    }
    if let Some(sender) = args.sender.as_ref().filter(|s| !s.is_empty()) {
        config.sender = Some(sender.clone());
    }
    config
}

fn build_ledger(args: &LedgerArgs) -> Result<Option<SharedLedger>> {
    if args.no_ledger {
        return Ok(None);
    }

    let config = ledger_config(args);
    if !config.has_contract() {
        info!("No contract address configured, skipping ledger");
        return Ok(None);
    }

    let ledger: SharedLedger = Arc::new(RpcLedger::new(config)?);
    Ok(Some(ledger))
}

async fn run_verify(
    content: Content,
    analyzer: ContentAnalyzer,
    ledger: Option<SharedLedger>,
    history: HistoryStore,
    json: bool,
) -> Result<()> {
    let verifier = Verifier::new(VerifierConfig {
        analyzer,
        ledger,
        history: Some(history),
    });

    if !json {
        println!("🔎 TruthChain - Content Verification\n");
        println!("📄 Type: {}", content.content_type().label());
        if let Some(name) = verifier.analyzer().backend_name() {
            println!("🤖 Provider: {}", name);
        }
        println!();
    }

    let report = verifier.verify(&content).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_result(result: &VerificationResult) {
    let band = ConfidenceBand::classify(result.confidence_score, result.is_verified);
    if result.is_verified {
        println!("✅ VERIFIED ({})", band);
    } else {
        println!("❌ NOT VERIFIED ({})", band);
    }
    println!("📊 Confidence: {}%", result.confidence_score);
    println!("🧠 Model: {}", result.ai_model_used);
    if let Some(url) = &result.source_url {
        println!("🔗 Source: {}", url);
    }
    println!("\n{}\n", result.explanation);
}

fn print_record(record: &VerificationRecord) {
    let when = DateTime::<Utc>::from_timestamp(record.timestamp as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());
    println!("   Verifier: {}", format_address(&record.verifier));
    println!("   Recorded: {}", when);
    println!(
        "   Verdict: {} ({}%) by {}",
        if record.is_verified { "verified" } else { "not verified" },
        record.confidence_score,
        record.ai_model_used
    );
}

fn print_report(report: &VerificationReport) {
    print_result(&report.result);

    println!("🧾 Content hash: {}", format_content_hash(&report.content_hash));
    print!("⛓️  Ledger: {}", report.metadata.ledger_status);
    match &report.metadata.transaction_hash {
        Some(tx) => println!(" (tx {})", format_content_hash(tx)),
        None => println!(),
    }
    if let Some(record) = &report.record {
        print_record(record);
    }
    println!("⏱️  {} ms", report.metadata.duration_ms);
}

async fn run_lookup(hash: &str, ledger: SharedLedger, json: bool) -> Result<()> {
    let record = ledger.lookup(hash).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("🔍 Looking up {}\n", format_content_hash(hash));
    match record {
        Some(record) => {
            println!("✅ Found on-chain record");
            print_record(&record);
        }
        None => println!("❌ No record for this content"),
    }

    Ok(())
}

fn show_history(history: &HistoryStore, limit: Option<usize>, json: bool) -> Result<()> {
    let mut entries = history.list();
    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("📭 No verifications yet");
        return Ok(());
    }

    println!("📜 Recent verifications ({})\n", history.path().display());
    for entry in &entries {
        let when = DateTime::<Utc>::from_timestamp_millis(entry.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{} {} {:>3}% [{}] {}",
            when,
            if entry.is_verified { "✅" } else { "❌" },
            entry.confidence_score,
            entry.content_type.label(),
            entry.content
        );
    }

    Ok(())
}

fn show_stats(history: &HistoryStore, json: bool) -> Result<()> {
    let stats = history.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("📊 Verification statistics\n");
    println!("   Total: {}", stats.total_verifications);
    println!("   Verified: {}", stats.verified_content);
    println!("   Rejected: {}", stats.rejected_content);
    println!("   Average confidence: {:.1}%", stats.avg_confidence_score);

    Ok(())
}

fn check_status(
    provider: &ProviderArgs,
    ledger_args: &LedgerArgs,
    history: &HistoryStore,
) -> Result<()> {
    println!("🩺 TruthChain status\n");

    match (provider.provider, provider_key(provider)) {
        (Provider::None, _) => println!("🤖 Remote AI: disabled (local heuristics only)"),
        (p, Some(_)) => println!(
            "✅ Remote AI: {} ({})",
            provider_name(p),
            provider.model.as_deref().unwrap_or_else(|| default_model(p))
        ),
        (p, None) => println!("⚠️  Remote AI: {} selected but no API key set", provider_name(p)),
    }

    if provider.no_classifiers {
        println!("🖼️  Image classifiers: disabled");
    } else {
        let token = if provider.hf_token.is_some() { "token set" } else { "no token" };
        println!("🖼️  Image classifiers: {} + {} ({})", VIT_MODEL, SWIN_MODEL, token);
    }

    if ledger_args.no_ledger {
        println!("⛓️  Ledger: disabled");
    } else {
        let config = ledger_config(ledger_args);
        if config.has_contract() {
            let ledger = RpcLedger::new(config)?;
            let mode = if ledger.is_writable() { "read/write" } else { "read-only" };
            println!("⛓️  Ledger: {} ({})", ledger.describe(), mode);
        } else {
            println!("⚠️  Ledger: no contract address configured");
        }
    }

    println!(
        "📜 History: {} ({} entries)",
        history.path().display(),
        history.list().len()
    );

    Ok(())
}
