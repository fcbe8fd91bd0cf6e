use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use hotitems_job::{HotItemsJob, JobConfig, WriterSink, open_behaviors};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hotitems")]
#[command(about = "Top-N most viewed items over sliding event-time windows", long_about = None)]
struct Cli {
    /// CSV input: userId,itemId,categoryId,behavior,timestamp (ascending seconds)
    input: PathBuf,
    /// JSON job config; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    window_minutes: Option<u64>,
    #[arg(long)]
    slide_minutes: Option<u64>,
    #[arg(long)]
    top_n: Option<usize>,
    /// Behavior to count (default "pv")
    #[arg(long)]
    action: Option<String>,
    #[arg(long)]
    window_parallelism: Option<usize>,
    #[arg(long)]
    ranker_parallelism: Option<usize>,
}

impl Cli {
    fn job_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::from_json_file(path)?,
            None => JobConfig::default(),
        };
        if let Some(v) = self.window_minutes {
            config.window_length_minutes = v;
        }
        if let Some(v) = self.slide_minutes {
            config.slide_minutes = v;
        }
        if let Some(v) = self.top_n {
            config.top_n = v;
        }
        if let Some(v) = &self.action {
            config.filter_action = v.clone();
        }
        if let Some(v) = self.window_parallelism {
            config.window_parallelism = v;
        }
        if let Some(v) = self.ranker_parallelism {
            config.ranker_parallelism = v;
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let job = HotItemsJob::new(cli.job_config()?)?;
    let cancel = job.cancel_handle();
    let events = open_behaviors(&cli.input, job.metrics())?;
    info!(input = %cli.input.display(), "reading events");
    let started = Instant::now();

    let mut run = tokio::task::spawn_blocking(move || {
        let mut sink = WriterSink::new(std::io::stdout().lock());
        job.run(events, &mut sink)
    });

    let summary = tokio::select! {
        joined = &mut run => joined??,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, cancelling job");
            cancel.cancel();
            run.await??
        }
    };

    info!(
        "{}",
        summary
            .metrics
            .to_json_line("hotitems", Some(started.elapsed()))
    );
    Ok(())
}
