use anyhow::Result;
use std::sync::Arc;
use std::thread;
use tracing::info;

use llmtrans::pipeline::{ChannelPresenter, Delivery, ErrorResult, Orchestrator, Outcome, Pipeline};
use llmtrans::{logger, platform, Config};

/// `llmtrans <text...>` translates the arguments once and exits.
async fn translate_once(pipeline: &Pipeline, text: &str, max_line_length: Option<usize>) -> Result<()> {
    let outcome = match pipeline.translate(text).await {
        Ok(result) => Outcome::Translated(result),
        Err(e) => Outcome::Failed(ErrorResult::from(&e)),
    };
    let delivery = Delivery {
        run: 0,
        clipboard_counter: 0,
        outcome,
    };
    platform::show(&delivery, max_line_length);
    if delivery.is_error() {
        anyhow::bail!("translation failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    info!("App starting");

    let cfg = Config::load();
    let pipeline = Arc::new(Pipeline::from_config(&cfg));

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return translate_once(&pipeline, &args.join(" "), cfg.max_line_length).await;
    }

    // Presentation runs on its own thread and drains finished runs in completion order.
    let (tx, rx) = crossbeam_channel::unbounded::<Delivery>();
    let max_line_length = cfg.max_line_length;
    thread::spawn(move || {
        while let Ok(delivery) = rx.recv() {
            info!(run = delivery.run, error = delivery.is_error(), "Delivering result");
            platform::show(&delivery, max_line_length);
        }
    });

    let orchestrator = Orchestrator::new(
        pipeline,
        platform::default_clipboard(),
        Arc::new(ChannelPresenter::new(tx)),
        cfg.double_copy_gap(),
    )
    .discard_stale_results(cfg.discard_stale_results);

    tokio::select! {
        _ = orchestrator.run(cfg.poll_interval()) => {}
        _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down"),
    }
    Ok(())
}
