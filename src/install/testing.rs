use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::InstallError;

use super::queue::{QueueAdmin, QueueSpec};

#[derive(Debug, Clone)]
pub struct FakeQueue {
    pub uri: String,
    pub driver: PathBuf,
    pub description: String,
    /// Contents of the driver file at the moment the queue was created.
    pub driver_contents: Option<String>,
}

#[derive(Default)]
struct State {
    queues: HashMap<String, FakeQueue>,
    removals: usize,
    creates: Vec<String>,
    in_flight: usize,
    max_in_flight: usize,
}

/// In-memory stand-in for the printer administration commands.
#[derive(Default)]
pub struct FakeAdmin {
    state: Mutex<State>,
    fail_removal: bool,
    fail_create: Option<String>,
    fail_create_for: HashMap<String, String>,
    create_delay: Option<Duration>,
}

impl FakeAdmin {
    pub fn failing_removal(mut self) -> Self {
        self.fail_removal = true;
        self
    }

    pub fn failing_create(mut self, output: &str) -> Self {
        self.fail_create = Some(output.to_string());
        self
    }

    pub fn failing_create_for(mut self, name: &str, output: &str) -> Self {
        self.fail_create_for
            .insert(name.to_string(), output.to_string());
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub fn preinstall(&self, name: &str) {
        self.state.lock().unwrap().queues.insert(
            name.to_string(),
            FakeQueue {
                uri: "ipp://stale/ipp/print".into(),
                driver: PathBuf::from("/stale.ppd"),
                description: "stale".into(),
                driver_contents: None,
            },
        );
    }

    pub fn queue(&self, name: &str) -> Option<FakeQueue> {
        self.state.lock().unwrap().queues.get(name).cloned()
    }

    pub fn queue_count(&self) -> usize {
        self.state.lock().unwrap().queues.len()
    }

    pub fn removals(&self) -> usize {
        self.state.lock().unwrap().removals
    }

    /// Queue names in the order create was called.
    pub fn creates(&self) -> Vec<String> {
        self.state.lock().unwrap().creates.clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }
}

#[async_trait]
impl QueueAdmin for FakeAdmin {
    async fn exists(&self, name: &str) -> bool {
        self.state.lock().unwrap().queues.contains_key(name)
    }

    async fn remove(&self, name: &str) -> Result<(), InstallError> {
        if self.fail_removal {
            return Err(InstallError::Command("lpadmin: Permission denied".into()));
        }
        let mut state = self.state.lock().unwrap();
        state.removals += 1;
        state.queues.remove(name);
        Ok(())
    }

    async fn create(&self, queue: &QueueSpec<'_>) -> Result<(), InstallError> {
        {
            let mut state = self.state.lock().unwrap();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.creates.push(queue.name.to_string());
        }

        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;

        if let Some(output) = self
            .fail_create_for
            .get(queue.name)
            .or(self.fail_create.as_ref())
        {
            return Err(InstallError::Command(output.clone()));
        }

        state.queues.insert(
            queue.name.to_string(),
            FakeQueue {
                uri: queue.uri.to_string(),
                driver: queue.driver.to_path_buf(),
                description: queue.description.to_string(),
                driver_contents: read_driver(queue.driver),
            },
        );
        Ok(())
    }
}

fn read_driver(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
