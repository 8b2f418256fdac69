mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use cli::Commands;
use task_recall::{
    resolve, EnvSnapshot, FindRelevantExamplesUseCase, StorageFactory, StoreTaskExampleUseCase,
    TaskExample, TaskExampleStorage,
};

#[derive(Parser)]
#[command(name = "task-recall")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    // Selection happens once, before any command runs. A misconfigured
    // process never gets as far as serving a command.
    let snapshot = EnvSnapshot::capture();
    let storage = match StorageFactory::build(&snapshot).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to initialize task storage: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &snapshot, storage).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    snapshot: &EnvSnapshot,
    storage: Arc<dyn TaskExampleStorage>,
) -> Result<()> {
    match command {
        Commands::Store {
            task,
            solution,
            tags,
        } => {
            let use_case = StoreTaskExampleUseCase::new(storage);
            let id = use_case
                .execute(TaskExample::new(task, solution).with_tags(tags))
                .await?;
            println!("{}", id);
        }

        Commands::Find {
            query,
            num,
            min_score,
        } => {
            let mut use_case = FindRelevantExamplesUseCase::new(storage);
            if let Some(score) = min_score {
                use_case = use_case.with_min_score(score);
            }

            let results = use_case.execute(&query, num).await?;

            if results.is_empty() {
                println!("No relevant examples found.");
            } else {
                println!("Found {} examples:\n", results.len());

                for (i, result) in results.iter().enumerate() {
                    println!("{}. {}", i + 1, result.display_line());
                    println!("   Task: {}", result.example().task());
                    if !result.example().tags().is_empty() {
                        println!("   Tags: {}", result.example().tags().join(", "));
                    }

                    let preview: String = result
                        .example()
                        .solution()
                        .lines()
                        .take(10)
                        .map(|l| format!("   | {}", l))
                        .collect::<Vec<_>>()
                        .join("\n");
                    println!("{}", preview);
                    println!();
                }
            }
        }

        Commands::Backend => {
            let tag = resolve(snapshot)?.tag();
            let count = storage.count().await?;

            println!("Backend:  {} ({})", tag.store_name(), tag);
            println!("Examples: {}", count);
        }
    }

    Ok(())
}
