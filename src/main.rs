use std::error::Error;
use std::path::PathBuf;

use corpusclean::{CleanerConfig, Pipeline};
use tracing_subscriber::EnvFilter;

/// `corpusclean [config.yaml]`
fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => {
            tracing::info!(config = %path.display(), "loading configuration");
            CleanerConfig::from_file(&path)?
        }
        None => CleanerConfig::default(),
    };

    let summary = Pipeline::new(config)?.run()?;

    println!("Corpus:     {}", summary.corpus_path.display());
    println!("Report:     {}", summary.report_path.display());
    println!("Statistics: {}", summary.stats_path.display());
    if let Some(path) = &summary.rejected_path {
        println!("Rejected:   {}", path.display());
    }
    println!(
        "Kept {} of {} documents ({:.2}% of words removed)",
        summary.stats.kept(),
        summary.stats.total_documents(),
        summary.stats.removal_percentage()
    );
    Ok(())
}

/// `RUST_LOG` picks the filter (default `info`); set `CORPUSCLEAN_LOG_JSON`
/// for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if std::env::var_os("CORPUSCLEAN_LOG_JSON").is_some() {
        builder.json().with_thread_ids(true).init();
    } else {
        builder.init();
    }
}
