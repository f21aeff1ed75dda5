use anyhow::Context;
use parking_lot::Mutex;
use spiderbot::{
    init_logging, Config, Console, EchoSink, Flow, FrameRelay, LinkManager, MessageLog,
    OperatorCommand, PollCycle, SnapshotWriter, TelemetryStore, BUILD_DATE, VERSION,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn config_path() -> anyhow::Result<PathBuf> {
    match std::env::args_os().nth(1) {
        Some(path) => Ok(PathBuf::from(path)),
        None => Ok(Config::default_path()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("SpiderBot console {} (built {})", VERSION, BUILD_DATE);

    let path = config_path()?;
    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    let log = Arc::new(MessageLog::default());
    let sink = Arc::new(EchoSink::new(log.clone()));
    let telemetry = TelemetryStore::new();
    let link = Arc::new(LinkManager::serial(sink.clone()).with_telemetry(telemetry.clone()));

    let relay = FrameRelay::new(config.frames.capacity, config.frames.overflow);
    let poll = Arc::new(Mutex::new(PollCycle::new(
        relay,
        telemetry,
        config.poll.history_len,
    )));
    let snapshots = SnapshotWriter::new(&config.snapshot.directory).with_log(sink);
    let console = Arc::new(Console::new(link.clone(), poll.clone(), snapshots));

    if config.connection.auto_connect && !config.connection.port.is_empty() {
        let link = link.clone();
        let params = config.connection.params();
        let outcome = tokio::task::spawn_blocking(move || link.connect_with(params)).await?;
        match outcome {
            Ok(message) => println!("{}", message),
            Err(e) => println!("{}", e.user_message()),
        }
    }

    let interval = config.poll.interval();
    let poller = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let snapshot = poll.lock().tick();
            tracing::trace!(
                "tick: {:.1} cm, rgb {}, thermal {}",
                snapshot.distance_cm,
                snapshot.rgb_updated,
                snapshot.thermal_updated
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match OperatorCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let console = console.clone();
        match tokio::task::spawn_blocking(move || console.execute(command)).await? {
            Flow::Continue(replies) => replies.iter().for_each(|reply| println!("{}", reply)),
            Flow::Quit => break,
        }
    }

    poller.abort();
    link.disconnect();
    tracing::info!("Console closed");
    Ok(())
}
