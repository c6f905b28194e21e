use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use synod_node::cli::{Cli, Commands};
use synod_node::config::{BenchConfig, ExperimentConfig};
use synod_node::logging::{init_tracing, install_panic_hook};
use synod_node::runtime::bench::run_bench;
use synod_node::{Coordinator, ResultSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli.log_dir)?;
    install_panic_hook(&cli.log_dir);

    match cli.command {
        Commands::Run(args) => {
            let config = args.resolve()?;
            let sink = match &args.results {
                Some(path) => Some(Arc::new(ResultSink::append_to(path).await?)),
                None => None,
            };
            let report = Coordinator::new(config).with_sink(sink).run().await?;

            println!("run:      {}", report.run_id);
            println!("n / f:    {} / {}", report.n, report.f);
            println!("crashed:  {:?}", report.faulty);
            println!("leader:   {}", report.leader);
            match (report.agreed_value(), report.latency) {
                (Some(value), Some(latency)) => println!("decided:  {} in {:?}", value, latency),
                (Some(value), None) => println!("decided:  {}", value),
                (None, _) if !report.is_consistent() => {
                    error!("conflicting decisions: {:?}", report.decided_values());
                    return Err("conflicting decisions".into());
                }
                (None, _) => println!("decided:  nothing"),
            }
        }
        Commands::Bench { config, results, append } => {
            let bench = match config {
                Some(path) => BenchConfig::load_from_file(path)?,
                None => BenchConfig::default(),
            };
            let sink = if append {
                ResultSink::append_to(&results).await?
            } else {
                ResultSink::create(&results).await?
            };
            let summary = run_bench(&bench, Arc::new(sink)).await?;
            println!(
                "{} runs, {} decided, {} conflicting, mean latency {:?}",
                summary.runs,
                summary.decided,
                summary.conflicting,
                summary.mean_latency()
            );
        }
        Commands::InitConfig { out, bench } => {
            if bench {
                BenchConfig::default().save_to_file(&out)?;
            } else {
                ExperimentConfig::default().save_to_file(&out)?;
            }
            info!("📝 default configuration written to {:?}", out);
        }
    }

    Ok(())
}
