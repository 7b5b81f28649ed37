use crate::rename::file::Action;
use crate::rename::stream::RenameEvent;
use derive_more::Display;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::pin::pin;
use time::OffsetDateTime;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[display("success")]
    Success,
    #[display("skipped")]
    Skipped,
    #[display("error")]
    Error,
}

/// What happened to one file, and when.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationLog {
    pub original: String,
    /// The new name on success; the unchanged original name otherwise.
    pub final_name: String,
    pub status: Status,
    pub message: Option<String>,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub timestamp: OffsetDateTime,
}

/// Totals and per-file log of a rename batch.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub operations: Vec<OperationLog>,
}

impl BatchReport {
    /// Drains a [`rename_batch`](crate::rename::rename_batch) stream into a report.
    pub async fn collect(events: impl Stream<Item = RenameEvent>) -> Self {
        let mut events = pin!(events);
        let mut report = Self::default();
        while let Some(event) = events.next().await {
            if let RenameEvent::Processed(action) = event {
                report.record(action);
            }
        }
        tracing::info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Batch finished"
        );
        report
    }

    pub fn record(&mut self, action: Action) {
        let (original, final_name, status, message) = match action {
            Action::Renamed { from, to } => {
                self.processed += 1;
                (from, to, Status::Success, None)
            },
            Action::Skipped { name, reason } => {
                self.skipped += 1;
                (name.clone(), name, Status::Skipped, Some(reason))
            },
            Action::Failed { name, reason } => {
                self.failed += 1;
                (name.clone(), name, Status::Error, Some(reason))
            },
        };
        self.operations.push(OperationLog {
            original,
            final_name,
            status,
            message,
            timestamp: OffsetDateTime::now_utc(),
        });
    }

    pub fn total(&self) -> u64 {
        self.processed + self.skipped + self.failed
    }

    /// `"<original>: <message>"` for every file that was skipped or failed.
    pub fn errors(&self) -> impl Iterator<Item = String> + '_ {
        self.operations
            .iter()
            .filter_map(|op| op.message.as_ref().map(|message| format!("{}: {message}", op.original)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_collect() {
        let events = stream::iter([
            RenameEvent::Started,
            RenameEvent::Planned(3),
            RenameEvent::Processed(Action::Renamed {
                from: "IMG_1.jpg".into(),
                to: "Prague.jpg".into(),
            }),
            RenameEvent::Processed(Action::Skipped {
                name: "_IMG_2.jpg".into(),
                reason: "Already has underscore prefix".into(),
            }),
            RenameEvent::Processed(Action::Failed {
                name: "IMG_3.jpg".into(),
                reason: "source file not found: IMG_3.jpg".into(),
            }),
            RenameEvent::Complete,
        ]);
        let report = BatchReport::collect(events).await;

        assert_eq!((report.processed, report.skipped, report.failed), (1, 1, 1));
        assert_eq!(report.total(), 3);
        assert_eq!(report.operations[0].final_name, "Prague.jpg");
        assert_eq!(report.operations[0].status, Status::Success);
        assert_eq!(report.operations[2].final_name, "IMG_3.jpg");
        assert_eq!(report.operations[2].status.to_string(), "error");
        assert_eq!(
            report.errors().collect::<Vec<_>>(),
            [
                "_IMG_2.jpg: Already has underscore prefix",
                "IMG_3.jpg: source file not found: IMG_3.jpg"
            ]
        );
    }

    #[test]
    fn test_serialize() {
        let mut report = BatchReport::default();
        report.record(Action::Skipped {
            name: "a.jpg".into(),
            reason: "Not selected".into(),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["operations"][0]["status"], "skipped");
        assert!(json["operations"][0]["timestamp"].is_string());
    }
}
