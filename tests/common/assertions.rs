//! Custom test assertions for integration tests

use media_dl::{Event, TaskId};
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::MockServer;

/// Wait for an event matching `predicate` on an existing subscription
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    predicate: F,
) -> Option<Event>
where
    F: Fn(&Event) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    })
    .await;

    result.ok().flatten()
}

/// Everything already queued on `events`
pub fn drain_events(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut collected = Vec::new();
    while let Ok(event) = events.try_recv() {
        collected.push(event);
    }
    collected
}

/// True for the done event of `id`
pub fn is_done(event: &Event, id: TaskId) -> bool {
    matches!(event, Event::DownloadDone { task } if task.id == id)
}

/// Poll until the mock server has seen at least `count` requests
pub async fn wait_for_requests(server: &MockServer, count: usize, timeout: Duration) -> bool {
    let result = tokio::time::timeout(timeout, async {
        loop {
            let seen = server.received_requests().await.unwrap_or_default().len();
            if seen >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    result.is_ok()
}

/// Assert that files exist in the download directory
pub fn assert_files_exist(dir: &Path, expected_files: &[&str]) {
    for filename in expected_files {
        let path = dir.join(filename);
        assert!(path.exists(), "Expected file {} to exist", path.display());
    }
}

/// Assert that no `.download` temp file is left in `dir`
pub fn assert_no_temp_files(dir: &Path) {
    let leftovers: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".download"))
        .collect();
    assert!(leftovers.is_empty(), "Temp files left behind: {:?}", leftovers);
}
