use parking_lot::Mutex;
use spiderbot::{
    Console, Flow, FrameRelay, LinkManager, MessageLog, MotionCommand, OperatorCommand,
    PollCycle, SnapshotWriter, TelemetryStore,
};
use spiderbot_communication::MockProvider;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct Rig {
    console: Console,
    provider: Arc<MockProvider>,
    poll: Arc<Mutex<PollCycle>>,
    log: Arc<MessageLog>,
    _dir: tempfile::TempDir,
}

fn rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::new(["COM3", "COM4"]));
    let log = Arc::new(MessageLog::default());
    let telemetry = TelemetryStore::new();
    let link = Arc::new(
        LinkManager::new(provider.clone(), log.clone()).with_telemetry(telemetry.clone()),
    );
    let poll = Arc::new(Mutex::new(PollCycle::new(
        FrameRelay::default(),
        telemetry,
        10,
    )));
    let console = Console::new(
        link,
        poll.clone(),
        SnapshotWriter::new(dir.path().join("snapshots")),
    );
    Rig {
        console,
        provider,
        poll,
        log,
        _dir: dir,
    }
}

fn run(console: &Console, line: &str) -> Flow {
    let command = OperatorCommand::parse(line).unwrap().unwrap();
    console.execute(command)
}

#[test]
fn test_connect_drive_and_status() {
    let rig = rig();

    assert_eq!(
        run(&rig.console, "connect COM3 115200"),
        Flow::Continue(vec!["Connected to COM3".to_string()])
    );
    assert_eq!(run(&rig.console, "forward"), Flow::Continue(Vec::new()));
    assert_eq!(run(&rig.console, "say hello"), Flow::Continue(Vec::new()));

    let transport = rig.provider.last_opened().unwrap();
    assert_eq!(transport.written_text(), vec!["forward\r\n", "hello\r\n"]);
    assert_eq!(
        rig.log.recent(2),
        vec!["TX: forward".to_string(), "TX: hello".to_string()]
    );

    let Flow::Continue(status) = run(&rig.console, "status") else {
        panic!("status must not quit");
    };
    assert_eq!(status[0], "State: Connected (COM3)");
}

#[test]
fn test_telemetry_reaches_poll_cycle() {
    let rig = rig();
    run(&rig.console, "connect COM4");
    rig.provider.last_opened().unwrap().push_line("DIST: 64.5");

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut seen = 0.0;
    while Instant::now() < deadline {
        seen = rig.poll.lock().tick().distance_cm;
        if seen == 64.5 {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(seen, 64.5);
}

#[test]
fn test_busy_port_message() {
    let rig = rig();
    rig.provider.set_busy("COM3", true);

    let Flow::Continue(lines) = run(&rig.console, "connect COM3") else {
        panic!("connect must not quit");
    };
    assert!(lines[0].starts_with("Port Busy!"));
}

#[test]
fn test_snapshot_writes_data_record() {
    let rig = rig();
    let Flow::Continue(lines) = run(&rig.console, "snapshot") else {
        panic!("snapshot must not quit");
    };
    assert!(lines[0].starts_with("Snapshot "));
}

#[test]
fn test_quit_disconnects() {
    let rig = rig();
    run(&rig.console, "connect COM3");
    assert_eq!(run(&rig.console, "quit"), Flow::Quit);
    assert_eq!(
        rig.console
            .execute(OperatorCommand::Motion(MotionCommand::Stop)),
        Flow::Continue(vec!["Not connected".to_string()])
    );
}

#[test]
fn test_ports_lists_directory_entries() {
    let rig = rig();
    assert_eq!(
        run(&rig.console, "ports"),
        Flow::Continue(vec![
            "COM3 (Mock Serial)".to_string(),
            "COM4 (Mock Serial)".to_string(),
        ])
    );
}
