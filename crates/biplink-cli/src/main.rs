//! biplink CLI - bipartite link-prediction data preparation from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show statistics about a dataset directory (graph.json + attr-meta.json)
//! biplink stats data/imdb/small
//!
//! # Stream every other x user pair with its observed flag (candidates.csv)
//! biplink candidates data/imdb/small -o out/ --user-type user
//!
//! # Write the type-masked feature matrix
//! biplink features data/imdb/small -o out/ --normalize
//!
//! # Split observed edges for training (edge-split.json)
//! biplink split data/imdb/small -o out/ --seed 42
//!
//! # Score candidate pairs with embeddings from a trained model
//! biplink score data/imdb/small --embeddings z.csv -o out/ --split out/edge-split.json
//!
//! # Export node-classification results from model logits
//! biplink classify --logits logits.csv --labels labels.txt -o out/
//! ```

use anyhow::{Context, Result};
use biplink_core::evaluation::{accuracy, argmax_labels, evaluate_split, logits_from_csv_file};
use biplink_core::export::{ArtifactWriter, NodeClassificationResults};
use biplink_core::pipeline::{predict_links, prepare};
use biplink_core::split::split_edges;
use biplink_core::{
    BipartiteIndex, Dataset, EdgeSplit, EmbeddingMatrix, Error, FeatureMatrix, NodeType, PipelineConfig,
};
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressBar;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "biplink")]
#[command(about = "Bipartite link-prediction data preparation and edge scoring", long_about = None)]
struct Cli {
    /// Pipeline configuration (JSON); flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where to find a dataset and how to split it.
#[derive(Args)]
struct DatasetArgs {
    /// Dataset directory holding graph.json and attr-meta.json
    dataset: PathBuf,

    /// Separate per-node attribute table (JSON array, one row per node)
    #[arg(long)]
    attributes: Option<PathBuf>,

    /// Node type forming the user side of the bipartite split
    #[arg(long)]
    user_type: Option<String>,

    /// Fail if one side of the bipartite split is empty
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about a dataset
    Stats {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Write every candidate pair with its observed flag (candidates.csv)
    Candidates {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the node feature matrix (features.csv)
    Features {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Write 1 for positive values and 0 otherwise
        #[arg(long)]
        binary: bool,

        /// Divide each row by its sum
        #[arg(long)]
        normalize: bool,
    },

    /// Split observed edges into train/val/test with negatives (edge-split.json)
    Split {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Fraction of edges held out for validation
        #[arg(long)]
        val_ratio: Option<f64>,

        /// Fraction of edges held out for testing
        #[arg(long)]
        test_ratio: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score candidate pairs with trained embeddings and write all artifacts
    Score {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Node embeddings (CSV, one row per node)
        #[arg(long)]
        embeddings: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Edge split to report validation/test ROC-AUC on
        #[arg(long)]
        split: Option<PathBuf>,

        /// Write binarized features
        #[arg(long)]
        binary_features: bool,
    },

    /// Export node-classification results from model logits
    Classify {
        /// Logits (CSV, one row per node, one column per class)
        #[arg(long)]
        logits: PathBuf,

        /// True labels (one integer per line)
        #[arg(long)]
        labels: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Stats { dataset } => cmd_stats(&dataset, &mut config),
        Commands::Candidates { dataset, output } => cmd_candidates(&dataset, &output, &mut config),
        Commands::Features {
            dataset,
            output,
            binary,
            normalize,
        } => {
            config.features.normalize |= normalize;
            cmd_features(&dataset, &output, binary, &mut config)
        }
        Commands::Split {
            dataset,
            output,
            val_ratio,
            test_ratio,
            seed,
        } => {
            if let Some(r) = val_ratio {
                config.split.val_ratio = r;
            }
            if let Some(r) = test_ratio {
                config.split.test_ratio = r;
            }
            if let Some(s) = seed {
                config.split.seed = s;
            }
            cmd_split(&dataset, &output, &mut config)
        }
        Commands::Score {
            dataset,
            embeddings,
            output,
            split,
            binary_features,
        } => cmd_score(&dataset, &embeddings, &output, split.as_deref(), binary_features, &mut config),
        Commands::Classify {
            logits,
            labels,
            output,
        } => cmd_classify(&logits, &labels, &output),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_dataset(args: &DatasetArgs, config: &mut PipelineConfig) -> Result<Dataset> {
    if let Some(t) = &args.user_type {
        config.enumeration.user_type = NodeType::new(t.as_str());
    }
    config.enumeration.strict |= args.strict;

    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {}...", args.dataset.display()));

    let dir = &args.dataset;
    let dataset = Dataset::load(
        dir.join(biplink_core::dataset::GRAPH_FILE),
        dir.join(biplink_core::dataset::ATTR_META_FILE),
        args.attributes.as_ref(),
    )
    .with_context(|| format!("Failed to load dataset {}", dir.display()))?;

    pb.finish_and_clear();
    tracing::info!(elapsed = ?start.elapsed(), "loaded {}", dir.display());
    Ok(dataset)
}

fn cmd_stats(args: &DatasetArgs, config: &mut PipelineConfig) -> Result<()> {
    let dataset = load_dataset(args, config)?;
    let stats = dataset.graph.stats();
    let index = BipartiteIndex::build(&dataset.graph, &config.enumeration)?;
    let partition = index.partition();

    println!("Dataset Statistics");
    println!("==================");
    println!("Nodes:          {}", stats.num_nodes);
    println!("Edges:          {}", stats.num_edges);
    println!("Components:     {}", stats.num_components);
    println!("Attributes:     {}", dataset.attributes.len());
    for (node_type, count) in &stats.nodes_by_type {
        println!("  type {:<10} {}", node_type, count);
    }
    println!("Other side:     {}", partition.other.len());
    println!("User side:      {}", partition.user.len());
    println!("Candidates:     {}", partition.num_candidates());
    println!("Unseen:         {}", index.num_unseen());

    Ok(())
}

fn cmd_candidates(args: &DatasetArgs, output: &Path, config: &mut PipelineConfig) -> Result<()> {
    let dataset = load_dataset(args, config)?;
    let index = BipartiteIndex::build(&dataset.graph, &config.enumeration)?;

    let writer = ArtifactWriter::new(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let (path, rows) = writer.write_candidates(index.stream())?;

    println!("Candidates:     {}", rows);
    println!("Observed:       {}", rows - index.num_unseen());
    println!("Unseen:         {}", index.num_unseen());
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_features(args: &DatasetArgs, output: &Path, binary: bool, config: &mut PipelineConfig) -> Result<()> {
    let dataset = load_dataset(args, config)?;
    let features = FeatureMatrix::build(&dataset.graph, &dataset.attributes, &config.features)?;

    let writer = ArtifactWriter::new(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let path = writer.write_features(&features, binary)?;

    println!(
        "Wrote {} x {} features to {}",
        features.num_nodes(),
        features.num_features(),
        path.display()
    );
    Ok(())
}

fn cmd_split(args: &DatasetArgs, output: &Path, config: &mut PipelineConfig) -> Result<()> {
    let dataset = load_dataset(args, config)?;
    let index = BipartiteIndex::build(&dataset.graph, &config.enumeration)?;
    let split = split_edges(&index, &config.split)?;

    let writer = ArtifactWriter::new(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let path = writer.write_split(&split)?;

    println!(
        "Split edges: train {} | val {} (+{} neg) | test {} (+{} neg)",
        split.train_pos.len(),
        split.val_pos.len(),
        split.val_neg.len(),
        split.test_pos.len(),
        split.test_neg.len()
    );
    println!("Wrote {}", path.display());
    Ok(())
}

fn cmd_score(
    args: &DatasetArgs,
    embeddings: &Path,
    output: &Path,
    split: Option<&Path>,
    binary_features: bool,
    config: &mut PipelineConfig,
) -> Result<()> {
    let dataset = load_dataset(args, config)?;
    let z = EmbeddingMatrix::from_csv_file(embeddings)
        .with_context(|| format!("Failed to read embeddings {}", embeddings.display()))?;

    let start = Instant::now();
    let prepared = prepare(&dataset, config)?;
    let results = predict_links(&prepared.index, &prepared.candidates.unseen, &z)?;
    tracing::info!(elapsed = ?start.elapsed(), "scored candidates");

    let writer = ArtifactWriter::new(output).with_context(|| format!("Failed to create {}", output.display()))?;
    writer.write_link_results(&results)?;
    writer.write_embeddings(&z)?;
    writer.write_graph(&dataset.graph)?;
    writer.write_features(&prepared.features, binary_features)?;

    println!("Predicted true:  {}", results.true_allow_edges.len());
    println!("Predicted false: {}", results.false_allow_edges.len());
    println!("Ranked nodes:    {}", results.true_unseen_edges_sorted.len());
    println!("Wrote artifacts to {}", writer.dir().display());

    if let Some(split_path) = split {
        let file = File::open(split_path).with_context(|| format!("Failed to open {}", split_path.display()))?;
        let split: EdgeSplit = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse {}", split_path.display()))?;
        match evaluate_split(&z, &split) {
            Ok(eval) => println!("{}", eval.summary()),
            // Small graphs leave val or test without positives.
            Err(Error::UndefinedMetric(reason)) => {
                tracing::warn!(%reason, "link evaluation skipped");
                println!("AUC unavailable: {}", reason);
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to evaluate {}", split_path.display())),
        }
    }
    Ok(())
}

fn read_labels(path: &Path) -> Result<Vec<usize>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    text.lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, l)| !l.is_empty())
        .map(|(i, l)| {
            l.parse::<usize>()
                .with_context(|| format!("{}: line {} is not a label: {}", path.display(), i + 1, l))
        })
        .collect()
}

fn cmd_classify(logits: &Path, labels: &Path, output: &Path) -> Result<()> {
    let logits = logits_from_csv_file(logits).with_context(|| format!("Failed to read logits {}", logits.display()))?;
    let truth = read_labels(labels)?;
    let predicted = argmax_labels(&logits);

    let acc = accuracy(&predicted, &truth)?;
    let results = NodeClassificationResults::new(predicted, truth);

    let writer = ArtifactWriter::new(output).with_context(|| format!("Failed to create {}", output.display()))?;
    writer.write_classification_results(&results)?;

    println!("Classes:  {}", results.num_node_classes);
    println!("Accuracy: {:.4}", acc);
    Ok(())
}
