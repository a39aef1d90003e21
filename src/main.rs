//! Command-line entry point for agrovida-loader
//!
//! Runs the whole load with no arguments. Connection parameters come from
//! `DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` and `DB_PORT`, optionally
//! seeded from a `.env` file.
//!
//! Exit status is 1 when the database cannot be reached or foreign key checks
//! cannot be toggled. Failed tables only change the exit status (to 2) when
//! `--strict` is given.

use agrovida_loader::{LoadOptions, LoadPlan, Loader, LoaderArgs};
use agrovida_mysql_sink::MySqlSession;
use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::warn;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Variables already set in the environment take precedence over .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = LoaderArgs::parse();

    println!("Starting AgroVida Database Data Loading...");
    println!("{}", "=".repeat(50));

    let mut session = MySqlSession::connect(&args.database.connect_opts())
        .await
        .context("Failed to connect to database")?;

    let loader = Loader::new(LoadPlan::agrovida(), LoadOptions::from(&args.load));
    let report = loader.run(&mut session).await?;

    if let Err(e) = session.disconnect().await {
        warn!("Failed to close MySQL session cleanly: {e}");
    }

    println!();
    print!("{}", report.summary());
    println!();

    let failed = report.failed_tables();
    if failed.is_empty() {
        println!("Data loading completed successfully!");
    } else {
        println!(
            "Data loading completed with {} failed table(s): {}",
            failed.len(),
            failed.join(", ")
        );
    }
    println!("Completed at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    if args.load.strict && !failed.is_empty() {
        std::process::exit(2);
    }

    Ok(())
}
