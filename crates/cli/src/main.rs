use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ragprobe_chunker::{ChunkStrategy, Chunker, ChunkerConfig, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN};
use ragprobe_eval::{evaluate, load_queries_jsonl, Qrels, RunResults};
use ragprobe_retrieval::{
    HashEmbedder, RetrievalPipeline, RetrievalStore, StoreConfig, DEFAULT_DIMENSION,
};
use ragprobe_vector_index::{IndexKind, IvfParams, Metric, PqParams, TrainParams};
use std::io::{BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ragprobe")]
#[command(about = "Retrieval-quality experiments: chunk, index, search, score", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk a directory of documents and build a persisted index
    Index(IndexArgs),

    /// Query a built index, once or interactively
    Search(SearchArgs),

    /// Answer a query file and write run results for evaluation
    Run(RunArgs),

    /// Score run results against relevance judgments
    Evaluate(EvaluateArgs),
}

#[derive(Copy, Clone, ValueEnum)]
enum StrategyFlag {
    Max,
    Min,
    Single,
}

impl StrategyFlag {
    const fn as_domain(self) -> ChunkStrategy {
        match self {
            StrategyFlag::Max => ChunkStrategy::MaxFill,
            StrategyFlag::Min => ChunkStrategy::MinFill,
            StrategyFlag::Single => ChunkStrategy::Passthrough,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum KindFlag {
    Flat,
    IvfFlat,
    Pq,
    IvfPq,
}

impl KindFlag {
    const fn as_domain(self) -> IndexKind {
        match self {
            KindFlag::Flat => IndexKind::Flat,
            KindFlag::IvfFlat => IndexKind::IvfFlat,
            KindFlag::Pq => IndexKind::Pq,
            KindFlag::IvfPq => IndexKind::IvfPq,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
enum MetricFlag {
    L2,
    Ip,
}

impl MetricFlag {
    const fn as_domain(self) -> Metric {
        match self {
            MetricFlag::L2 => Metric::L2,
            MetricFlag::Ip => Metric::InnerProduct,
        }
    }
}

#[derive(Args)]
struct IndexArgs {
    /// Directory of .txt documents to index
    #[arg(long)]
    docs: PathBuf,

    /// Output directory for the chunk table and index artifacts
    #[arg(long, default_value = "ragprobe-data")]
    out: PathBuf,

    /// Chunk accumulation strategy
    #[arg(long, value_enum, default_value_t = StrategyFlag::Max)]
    strategy: StrategyFlag,

    /// Index topology
    #[arg(long, value_enum, default_value_t = KindFlag::Flat)]
    kind: KindFlag,

    /// Distance metric (vectors must be pre-normalized for cosine via ip)
    #[arg(long, value_enum, default_value_t = MetricFlag::L2)]
    metric: MetricFlag,

    /// Minimum chunk length in characters
    #[arg(long, default_value_t = DEFAULT_MIN_LEN)]
    min_len: usize,

    /// Maximum chunk length in characters
    #[arg(long, default_value_t = DEFAULT_MAX_LEN)]
    max_len: usize,

    /// Embedding dimension of the stub embedder
    #[arg(long, default_value_t = DEFAULT_DIMENSION)]
    dimension: usize,

    /// Coarse partitions for ivf topologies
    #[arg(long, default_value_t = 100)]
    nlist: usize,

    /// Partitions probed per search for ivf topologies
    #[arg(long, default_value_t = 1)]
    nprobe: usize,

    /// Subspaces for pq topologies
    #[arg(long, default_value_t = 8)]
    pq_m: usize,

    /// Bits per pq code
    #[arg(long, default_value_t = 8)]
    pq_nbits: usize,

    /// Training seed for clustered topologies
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args)]
struct SearchArgs {
    /// Directory holding the index artifacts
    #[arg(long, default_value = "ragprobe-data")]
    out: PathBuf,

    /// Chunk strategy the index was built with
    #[arg(long, value_enum, default_value_t = StrategyFlag::Max)]
    strategy: StrategyFlag,

    /// Index topology to load
    #[arg(long, value_enum, default_value_t = KindFlag::Flat)]
    kind: KindFlag,

    /// Number of chunks to retrieve
    #[arg(short, long, default_value_t = 5)]
    k: usize,

    /// One-shot query; omit to read queries interactively from stdin
    #[arg(long)]
    query: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the index artifacts
    #[arg(long, default_value = "ragprobe-data")]
    out: PathBuf,

    /// Chunk strategy the index was built with
    #[arg(long, value_enum, default_value_t = StrategyFlag::Max)]
    strategy: StrategyFlag,

    /// Index topology to load
    #[arg(long, value_enum, default_value_t = KindFlag::Flat)]
    kind: KindFlag,

    /// Queries file, JSON Lines of {"_id": …, "text": …}
    #[arg(long)]
    queries: PathBuf,

    /// Where to write the run results, JSON Lines
    #[arg(long)]
    results: PathBuf,

    /// Number of chunks to retrieve per query
    #[arg(short, long, default_value_t = 10)]
    k: usize,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Relevance judgments, TSV of query-id / doc-id / grade
    #[arg(long)]
    qrels: PathBuf,

    /// Run results, JSON Lines of {"query_id": …, "doc_id": …, "score": …}
    #[arg(long)]
    results: PathBuf,

    /// Cutoffs to report at
    #[arg(short, long, value_delimiter = ',', default_value = "1,3,5,10")]
    k: Vec<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Index(args) => cmd_index(args).await,
        Commands::Search(args) => cmd_search(args).await,
        Commands::Run(args) => cmd_run(args).await,
        Commands::Evaluate(args) => cmd_evaluate(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

async fn cmd_index(args: IndexArgs) -> Result<()> {
    let chunker = Chunker::new(ChunkerConfig {
        min_len: args.min_len,
        max_len: args.max_len,
        strategy: args.strategy.as_domain(),
        ..Default::default()
    })?;

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&args.docs)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "txt"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    if files.is_empty() {
        bail!("no .txt documents under {:?}", args.docs);
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")?.progress_chars("=> "),
    );
    progress.set_message("chunking");

    let mut chunks = Vec::new();
    for file in &files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("reading document {}", file.display()))?;
        chunks.extend(chunker.split(&text));
        progress.inc(1);
    }
    progress.finish_with_message(format!("chunked {} documents", files.len()));

    let embedder = HashEmbedder::new(args.dimension);
    let config = StoreConfig {
        kind: args.kind.as_domain(),
        metric: args.metric.as_domain(),
        ivf: IvfParams {
            nlist: args.nlist,
            nprobe: args.nprobe,
        },
        pq: PqParams {
            m: args.pq_m,
            nbits: args.pq_nbits,
        },
        train: TrainParams {
            seed: args.seed,
            ..Default::default()
        },
    };

    println!("embedding and indexing {} chunks...", chunks.len());
    let store = RetrievalStore::build(chunks, &embedder, config).await?;
    store.save(&args.out, chunker.config().strategy).await?;

    println!(
        "indexed {} chunks into {:?} ({} / {})",
        store.len(),
        args.out,
        chunker.config().strategy,
        store.index().kind()
    );
    Ok(())
}

async fn cmd_search(args: SearchArgs) -> Result<()> {
    let store = RetrievalStore::load(
        &args.out,
        args.strategy.as_domain(),
        args.kind.as_domain(),
    )
    .await?;
    let embedder = HashEmbedder::new(store.index().dimension());
    let pipeline = RetrievalPipeline::new(&embedder, &store);

    if let Some(query) = args.query {
        return answer(&pipeline, &query, args.k).await;
    }

    // Interactive loop: one query per line, empty line or EOF quits.
    let stdin = std::io::stdin();
    loop {
        print!("query> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            break;
        }
        answer(&pipeline, query, args.k).await?;
    }
    Ok(())
}

async fn answer(pipeline: &RetrievalPipeline<'_>, query: &str, k: usize) -> Result<()> {
    let hits = pipeline.retrieve(query, k).await?;
    if hits.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{:>2}. chunk {} (score {:.4})",
            rank + 1,
            hit.id,
            hit.score
        );
        println!("    {}", hit.text.trim_end());
    }
    Ok(())
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    let store = RetrievalStore::load(
        &args.out,
        args.strategy.as_domain(),
        args.kind.as_domain(),
    )
    .await?;
    let embedder = HashEmbedder::new(store.index().dimension());
    let pipeline = RetrievalPipeline::new(&embedder, &store);

    let queries = load_queries_jsonl(&args.queries)?;
    if queries.is_empty() {
        bail!("no queries in {:?}", args.queries);
    }
    log::info!("running {} queries against the {} index", queries.len(), store.index().kind());

    let results = pipeline.run(&queries, args.k).await?;
    results.save_jsonl(&args.results)?;
    println!(
        "answered {} queries at k={} into {:?}",
        results.query_count(),
        args.k,
        args.results
    );
    Ok(())
}

fn cmd_evaluate(args: EvaluateArgs) -> Result<()> {
    let qrels = Qrels::from_tsv_path(&args.qrels)?;
    let results = RunResults::from_jsonl_path(&args.results)?;

    let report = evaluate(&qrels, &results, &args.k)?;
    print!("{report}");
    Ok(())
}
