// crab-floor/examples/floor_monitor.rs
// Floor monitor: keeps the table view refreshed and logs every event.
//
// Usage:
//   floor_monitor                       watch only
//   floor_monitor <table_id> <status>   also change one table's status
//
// Reservation conflicts are confirmed on stdin.

use std::sync::Arc;

use crab_floor::{ChannelGate, FloorConfig, FloorEvent, FloorManager, TableStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FloorConfig::load();
    crab_floor::logger::init_logger("info,crab_floor=debug", false)?;

    tracing::info!(url = %config.base_url, "Starting floor monitor");

    let api = Arc::new(config.build_http_client()?);
    let floor = Arc::new(FloorManager::new(api, &config));
    let mut events = floor.subscribe();
    let refresh = floor.start();

    let args: Vec<String> = std::env::args().collect();
    if args.len() == 3 {
        let table_id: i64 = args[1].parse()?;
        let target: TableStatus = args[2].parse()?;

        // first load must land before the table is known
        floor.refresh().await.into_result()?;

        let (gate, mut prompts) = ChannelGate::new(1);
        tokio::spawn(async move {
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            while let Some(request) = prompts.recv().await {
                println!("{} [y/N]", request.prompt.message());
                let answer = stdin.next_line().await.ok().flatten().unwrap_or_default();
                request.answer(answer.trim().eq_ignore_ascii_case("y"));
            }
        });

        let outcome = floor.transition(table_id, target, &gate).await?;
        if let Some(notice) = outcome.notice() {
            println!("[{:?}] {}", notice.level, notice.message);
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(FloorEvent::TablesRefreshed { .. }) => {
                    let counts = floor.status_counts().await;
                    tracing::info!(
                        available = counts.available,
                        reserved = counts.reserved,
                        occupied = counts.occupied,
                        cleaning = counts.cleaning,
                        "Floor updated"
                    );
                    for annotation in floor.annotations().await {
                        if !annotation.reservations.is_empty() {
                            tracing::info!(
                                table = %annotation.code,
                                status = %annotation.table.status,
                                reservations = annotation.reservations.len(),
                                conflict = annotation.has_conflict,
                                "Reserved table"
                            );
                        }
                    }
                }
                Ok(other) => tracing::info!(event = ?other, "Floor event"),
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "Event stream lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    refresh.stop().await;
    tracing::info!("Floor monitor stopped");
    Ok(())
}
