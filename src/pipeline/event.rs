use crate::aggregate::{AlertReport, WindowReport};
use crate::source::LogRecord;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

/// Cumulative counters for one consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub messages_consumed: u64,
    pub windows_closed: u64,
    pub alerts_fired: u64,
    /// Trigger words counted since the last alert
    pub positive_word_count: u64,
    /// Messages counted in the still-open window
    pub window_count: u64,
}

/// Everything the dispatch loop reports to the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Started {
        path: PathBuf,
        offset: u64,
    },
    Consumed(LogRecord),
    Window {
        report: WindowReport,
        window_duration: Duration,
    },
    Alert(AlertReport),
    Summary(RunSummary),
}

/// Human summary of a closed window, e.g. "12 messages in the last 60 seconds".
/// Sub-second windows keep their fraction ("0.5 seconds").
pub fn window_message(report: &WindowReport, window_duration: Duration) -> String {
    format!(
        "{} messages in the last {} seconds",
        report.count,
        window_duration.as_secs_f64()
    )
}

pub trait EventSink: Send {
    fn emit(&mut self, event: &PipelineEvent);
}

/// Writes pipeline events as structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Started { path, offset } => {
                info!(
                    path = %path.display(),
                    offset = *offset,
                    "Consumer is ready and waiting for new messages"
                );
            }
            PipelineEvent::Consumed(record) => {
                info!(offset = record.offset, "consumed message: {}", record.text);
            }
            PipelineEvent::Window {
                report,
                window_duration,
            } => {
                info!(
                    count = report.count,
                    window_start = %report.window_start,
                    window_end = %report.window_end,
                    span_secs = report.span().as_secs_f64(),
                    "{}",
                    window_message(report, *window_duration)
                );
            }
            PipelineEvent::Alert(report) => {
                warn!(
                    total = report.total,
                    "ALERT: positive word count reached {}",
                    report.total
                );
            }
            PipelineEvent::Summary(summary) => {
                info!(
                    messages_consumed = summary.messages_consumed,
                    windows_closed = summary.windows_closed,
                    alerts_fired = summary.alerts_fired,
                    window_count = summary.window_count,
                    "Final positive word count: {}",
                    summary.positive_word_count
                );
            }
        }
    }
}

impl EventSink for Vec<PipelineEvent> {
    fn emit(&mut self, event: &PipelineEvent) {
        self.push(event.clone());
    }
}

/// Collects events behind a shared handle, so they can be inspected while
/// the dispatch loop owning the sink is still running.
///
/// Public so embedders can observe a running consumer in-process; the
/// integration tests drive the dispatcher through it too.
#[derive(Debug, Clone, Default)]
pub struct SharedSink {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Text of every consumed record, in delivery order
    pub fn consumed_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::Consumed(record) => Some(record.text),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for SharedSink {
    fn emit(&mut self, event: &PipelineEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
