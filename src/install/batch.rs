use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::catalog::{Printer, PrinterConfig};
use crate::error::InstallError;

use super::fetcher::fetch_driver;
use super::queue::{self, QueueAdmin};
use super::resolver::resolve_driver_url;

/// How the printers of one batch are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallPolicy {
    /// One printer at a time, in selection order.
    #[default]
    Sequential,
    /// Up to `max_in_flight` printers at once; results arrive in completion order.
    Parallel { max_in_flight: usize },
}

/// Result of one installation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub printer: String,
    pub error: Option<InstallError>,
}

impl InstallOutcome {
    pub fn success(printer: &str) -> Self {
        Self {
            printer: printer.to_string(),
            error: None,
        }
    }

    pub fn failure(printer: &str, error: InstallError) -> Self {
        Self {
            printer: printer.to_string(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `"<name>: <reason>"` for failures.
    pub fn failure_line(&self) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| format!("{}: {e}", self.printer))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failures: Vec<String>,
}

impl BatchResult {
    pub fn record(&mut self, outcome: &InstallOutcome) {
        match outcome.failure_line() {
            Some(line) => self.failures.push(line),
            None => self.succeeded += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Human readable report listing at most `limit` failures.
    pub fn summary(&self, limit: usize) -> String {
        let mut text = format!(
            "Installation finished.\n\nSucceeded: {}\nFailed: {}",
            self.succeeded,
            self.failed()
        );
        if !self.failures.is_empty() {
            text.push_str("\n\nFailures:\n");
            let shown = self.failures.len().min(limit);
            text.push_str(&self.failures[..shown].join("\n"));
            if self.failures.len() > shown {
                text.push_str(&format!("\n... and {} more", self.failures.len() - shown));
            }
        }
        text
    }
}

/// Progress of a running batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        printer: String,
    },
    Completed {
        outcome: InstallOutcome,
        done: usize,
        total: usize,
    },
    Finished(BatchResult),
}

/// Runs the resolve → download → create chain for single printers.
pub struct Installer {
    http: reqwest::Client,
    admin: Arc<dyn QueueAdmin>,
}

impl Installer {
    pub fn new(http: reqwest::Client, admin: Arc<dyn QueueAdmin>) -> Self {
        Self { http, admin }
    }

    /// Install one printer. Never fails: every error becomes a failed outcome.
    pub async fn install(&self, config: &PrinterConfig, printer: &Printer) -> InstallOutcome {
        match self.try_install(config, printer).await {
            Ok(()) => {
                tracing::info!("Installed printer {}", printer.name);
                InstallOutcome::success(&printer.name)
            }
            Err(e) => {
                tracing::warn!("Failed to install printer {}: {e}", printer.name);
                InstallOutcome::failure(&printer.name, e)
            }
        }
    }

    async fn try_install(&self, config: &PrinterConfig, printer: &Printer) -> Result<(), InstallError> {
        queue::validate_queue_name(&printer.name)?;
        let driver_url = resolve_driver_url(config, printer)?;
        let uri = queue::connection_uri(printer)?;

        // Dropping `driver` deletes the temp file, whatever the outcome below.
        let driver = fetch_driver(&self.http, &driver_url).await?;
        queue::install_queue(self.admin.as_ref(), printer, &uri, driver.path()).await
    }
}

/// One user-triggered installation over a snapshot of the configuration.
pub struct Batch {
    pub installer: Arc<Installer>,
    pub config: Arc<PrinterConfig>,
    pub printers: Vec<Printer>,
    pub policy: InstallPolicy,
    pub cancel: CancellationToken,
}

enum Job {
    Install(Printer),
    Skip(InstallOutcome),
}

struct Tally {
    result: BatchResult,
    done: usize,
    total: usize,
    events: mpsc::UnboundedSender<BatchEvent>,
}

impl Tally {
    fn record(&mut self, outcome: InstallOutcome) {
        self.result.record(&outcome);
        self.done += 1;
        let _ = self.events.send(BatchEvent::Completed {
            outcome,
            done: self.done,
            total: self.total,
        });
    }
}

impl Batch {
    /// Install every printer and report one outcome per input printer.
    ///
    /// Progress goes to `events` after each printer; `Finished` is left to the caller.
    pub async fn run(self, events: mpsc::UnboundedSender<BatchEvent>) -> BatchResult {
        let total = self.printers.len();
        tracing::info!("Installing {total} printer(s) ({:?})", self.policy);

        let jobs = plan_jobs(self.printers);
        let tally = Tally {
            result: BatchResult::default(),
            done: 0,
            total,
            events,
        };

        let result = match self.policy {
            InstallPolicy::Sequential => {
                run_sequential(&self.installer, &self.config, &self.cancel, jobs, tally).await
            }
            InstallPolicy::Parallel { max_in_flight } => {
                run_parallel(
                    self.installer,
                    self.config,
                    self.cancel,
                    jobs,
                    tally,
                    max_in_flight.max(1),
                )
                .await
            }
        };

        tracing::info!(
            "Batch finished: {} succeeded, {} failed",
            result.succeeded,
            result.failed()
        );
        result
    }
}

/// Later printers reusing an earlier printer's queue name are skipped.
fn plan_jobs(printers: Vec<Printer>) -> Vec<Job> {
    let mut seen = HashSet::new();
    printers
        .into_iter()
        .map(|printer| {
            if seen.insert(printer.name.clone()) {
                Job::Install(printer)
            } else {
                Job::Skip(InstallOutcome::failure(&printer.name, InstallError::Duplicate))
            }
        })
        .collect()
}

async fn run_sequential(
    installer: &Installer,
    config: &PrinterConfig,
    cancel: &CancellationToken,
    jobs: Vec<Job>,
    mut tally: Tally,
) -> BatchResult {
    for job in jobs {
        let outcome = match job {
            Job::Skip(outcome) => outcome,
            Job::Install(printer) if cancel.is_cancelled() => {
                InstallOutcome::failure(&printer.name, InstallError::Cancelled)
            }
            Job::Install(printer) => {
                let _ = tally.events.send(BatchEvent::Started {
                    printer: printer.name.clone(),
                });
                install_guarded(installer, config, &printer).await
            }
        };
        tally.record(outcome);
    }
    tally.result
}

async fn run_parallel(
    installer: Arc<Installer>,
    config: Arc<PrinterConfig>,
    cancel: CancellationToken,
    jobs: Vec<Job>,
    tally: Tally,
    max_in_flight: usize,
) -> BatchResult {
    let tally = Arc::new(Mutex::new(tally));
    let permits = Arc::new(Semaphore::new(max_in_flight));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let printer = match job {
            Job::Skip(outcome) => {
                tally.lock().await.record(outcome);
                continue;
            }
            Job::Install(printer) => printer,
        };

        let installer = installer.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        let permits = permits.clone();
        let tally = tally.clone();

        tasks.spawn(async move {
            let outcome = match permits.acquire_owned().await {
                Ok(_permit) if !cancel.is_cancelled() => {
                    let _ = tally.lock().await.events.send(BatchEvent::Started {
                        printer: printer.name.clone(),
                    });
                    install_guarded(&installer, &config, &printer).await
                }
                _ => InstallOutcome::failure(&printer.name, InstallError::Cancelled),
            };
            tally.lock().await.record(outcome);
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!("Install task did not complete: {e}");
        }
    }

    let result = tally.lock().await.result.clone();
    result
}

/// Like [`Installer::install`], but a panic becomes a failed outcome too.
async fn install_guarded(installer: &Installer, config: &PrinterConfig, printer: &Printer) -> InstallOutcome {
    AssertUnwindSafe(installer.install(config, printer))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::error!("Installing {} panicked", printer.name);
            InstallOutcome::failure(&printer.name, InstallError::Aborted("internal error".into()))
        })
}
