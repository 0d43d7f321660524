#![forbid(unsafe_code)]

//! # Cellform Demo
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p cellform_demo
//! ```

use std::sync::Arc;

use anyhow::Context;
use cellform::{OuterDispatcher, spawn_submission_watcher, submission_channel};
use cellscreen::{ScreenOptions, SharedSurface, TerminalScreen};
use clap::Parser;
use indexmap::IndexMap;
use tracing::info;

use cellform_demo::cli::Cli;
use cellform_demo::config::DemoConfig;
use cellform_demo::logging;

type Submission = (String, IndexMap<String, String>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.layout {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::sample(cli.sample_timeout()),
    };

    if cli.dump_layout {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init(&cli.log_file, &cli.log_level)?;
    info!(layout = ?cli.layout, "starting");

    let screen = TerminalScreen::new(ScreenOptions {
        alt_screen: !cli.no_alt_screen,
        ..ScreenOptions::default()
    })
    .context("initializing terminal")?;
    let surface: SharedSurface = screen.clone();

    let result = run(&config, surface).await;
    screen.fini()?;

    for (name, values) in result? {
        println!("{name}: {}", serde_json::to_string(&values)?);
    }
    info!("stopped");
    Ok(())
}

async fn run(config: &DemoConfig, surface: SharedSurface) -> anyhow::Result<Vec<Submission>> {
    let forms = config.build_forms(&surface)?;

    let (submit_tx, submit_rx) = submission_channel(config.submit_capacity);
    let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel::<Submission>();
    let watcher = spawn_submission_watcher(submit_rx, forms.clone(), move |name, values| {
        info!(form = %name, contents = ?values, "collected");
        let _ = seen_tx.send((name.to_string(), values));
    });

    let mut dispatcher = OuterDispatcher::new(Arc::clone(&surface), forms, submit_tx);
    config.bind(&mut dispatcher)?;

    let summary = tokio::task::spawn_blocking(move || dispatcher.run())
        .await
        .context("dispatcher thread")??;
    info!(
        delegations = summary.delegations.len(),
        stale_wakes = summary.stale_wakes,
        exit = ?summary.exit,
        "dispatcher finished"
    );

    watcher.await.context("submission watcher")?;
    let mut submissions = Vec::new();
    while let Ok(submission) = seen_rx.try_recv() {
        submissions.push(submission);
    }
    Ok(submissions)
}
