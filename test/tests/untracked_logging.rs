//! The default reporter writes untracked reads to the `tracing` subscriber.

use std::{
    io,
    sync::{Arc, Mutex},
};

use remx::{prelude::*, reactive::ReportUntracked};
use serial_test::serial;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_captured_logs(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::WARN)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

fn read_name(runtime: &Runtime) {
    let store = Store::new(runtime, object([("person", object([("name", "nothing")]))])).unwrap();
    store.root().get_path(["person", "name"]).unwrap();
}

#[test]
#[serial]
fn test_untracked_reads_are_logged_as_warnings() {
    let logs = with_captured_logs(|| read_name(&Runtime::new()));

    let lines: Vec<_> = logs.lines().collect();
    assert_eq!(lines.len(), 2, "{logs}");
    assert!(lines[0].contains("WARN"));
    assert!(lines[0].contains(
        "[REMX] attemted to access prop 'person' in react component untracked by remx"
    ));
    assert!(lines[1].contains("prop 'name'"));
}

#[test]
#[serial]
fn test_tracked_reads_are_not_logged() {
    let logs = with_captured_logs(|| {
        let runtime = Runtime::new();
        runtime.track(|| read_name(&runtime));
    });
    assert!(logs.is_empty(), "{logs}");
}

#[test]
#[serial]
fn test_reporting_can_be_disabled() {
    let logs = with_captured_logs(|| {
        let runtime =
            Runtime::with_config(RuntimeConfig::default().report_untracked(ReportUntracked::Never));
        read_name(&runtime);
    });
    assert!(logs.is_empty(), "{logs}");
}
