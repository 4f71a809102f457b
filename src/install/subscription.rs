use tokio::sync::mpsc;

use crate::error::InstallError;

use super::batch::{Batch, BatchEvent, BatchResult, InstallOutcome};

/// Run `batch` in the background, streaming its progress and finally `Finished`.
pub fn watch_batch(batch: Batch) -> impl futures::Stream<Item = BatchEvent> {
    iced::stream::channel(16, |mut output| async move {
        use futures::SinkExt;

        let mut pending: Vec<String> = batch.printers.iter().map(|p| p.name.clone()).collect();
        let mut reported = BatchResult::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = tokio::spawn(batch.run(tx));

        while let Some(event) = rx.recv().await {
            if let BatchEvent::Completed { outcome, .. } = &event {
                reported.record(outcome);
                if let Some(pos) = pending.iter().position(|name| *name == outcome.printer) {
                    pending.remove(pos);
                }
            }
            if output.send(event).await.is_err() {
                return;
            }
        }

        let result = match run.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Install batch died: {e}");
                aborted(reported, pending, &e.to_string())
            }
        };

        let _ = output.send(BatchEvent::Finished(result)).await;
    })
}

/// Result for a batch whose runner died: whatever never reported counts as failed.
fn aborted(mut result: BatchResult, pending: Vec<String>, reason: &str) -> BatchResult {
    for name in pending {
        result.record(&InstallOutcome::failure(
            &name,
            InstallError::Aborted(reason.to_string()),
        ));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelInfo, Printer, PrinterConfig};
    use crate::install::testing::FakeAdmin;
    use crate::install::{InstallPolicy, Installer};
    use crate::test_support::serve;
    use axum::{routing::get, Router};
    use futures::StreamExt;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn printer(name: &str, model: &str) -> Printer {
        Printer {
            name: name.into(),
            model: model.into(),
            ip: Some("10.0.0.1".into()),
            ppd: None,
            uri: None,
        }
    }

    #[tokio::test]
    async fn stream_reports_every_printer_then_finishes() {
        let addr = serve(Router::new().route("/a.ppd", get(|| async { "*PPD-Adobe: \"4.3\"\n" }))).await;
        let printers = vec![printer("A", "M1"), printer("B", "M2"), printer("A", "M1")];
        let config = Arc::new(PrinterConfig {
            locations: HashMap::from([("HQ".to_string(), printers.clone())]),
            printer_models: HashMap::from([(
                "M1".to_string(),
                ModelInfo {
                    ppd_url: Some(format!("http://{addr}/a.ppd")),
                },
            )]),
        });

        for policy in [
            InstallPolicy::Sequential,
            InstallPolicy::Parallel { max_in_flight: 2 },
        ] {
            let admin = Arc::new(FakeAdmin::default());
            let batch = Batch {
                installer: Arc::new(Installer::new(reqwest::Client::new(), admin.clone())),
                config: config.clone(),
                printers: printers.clone(),
                policy,
                cancel: CancellationToken::new(),
            };

            let events: Vec<BatchEvent> = watch_batch(batch).collect().await;

            let completed: Vec<&str> = events
                .iter()
                .filter_map(|e| match e {
                    BatchEvent::Completed { outcome, .. } => Some(outcome.printer.as_str()),
                    _ => None,
                })
                .collect();
            let mut sorted = completed.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, vec!["A", "A", "B"], "{policy:?}");

            let finished: Vec<&BatchResult> = events
                .iter()
                .filter_map(|e| match e {
                    BatchEvent::Finished(result) => Some(result),
                    _ => None,
                })
                .collect();
            assert_eq!(finished.len(), 1, "{policy:?}");

            let Some(BatchEvent::Finished(result)) = events.last() else {
                panic!("{policy:?}: stream did not end with Finished: {events:?}");
            };
            assert_eq!(result.total(), 3);
            assert_eq!(result.succeeded, 1);
            assert!(result.failures.iter().any(|f| f.starts_with("A: duplicate")));
            assert!(result.failures.iter().any(|f| f.starts_with("B: ") && f.contains("M2")));
            assert_eq!(admin.queue_count(), 1);
        }
    }

    #[test]
    fn aborted_marks_unreported_printers_failed() {
        let mut reported = BatchResult::default();
        reported.record(&InstallOutcome::success("C"));

        let result = aborted(reported, vec!["A".into(), "B".into()], "task panicked");
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.total(), 3);
        assert_eq!(
            result.failures,
            vec![
                "A: installation aborted: task panicked",
                "B: installation aborted: task panicked"
            ]
        );
    }
}
