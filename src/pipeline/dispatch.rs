use crate::aggregate::{AlertState, Vocabulary, WindowState};
use crate::config::ConsumerConfig;
use crate::pipeline::clock::{Clock, SystemClock};
use crate::pipeline::event::{EventSink, PipelineEvent, RunSummary};
use crate::source::{LogRecord, ReadOutcome, ReaderError, TailReader};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info};

/// What the loop did on its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No complete line was available
    Waiting,
    /// A line was read and fed to both aggregators
    Dispatching,
}

/// Single-task consumer: reads lines from the tail reader and feeds each one
/// to the window aggregator and then the alert tracker.
pub struct Dispatcher<S, C = SystemClock> {
    reader: TailReader,
    window: WindowState,
    alerts: AlertState,
    sink: S,
    clock: C,
    poll_interval: Duration,
    summary: RunSummary,
}

impl<S: EventSink> Dispatcher<S, SystemClock> {
    pub fn new(reader: TailReader, config: &ConsumerConfig, sink: S) -> Self {
        Self::with_clock(reader, config, sink, SystemClock)
    }
}

impl<S: EventSink, C: Clock> Dispatcher<S, C> {
    pub fn with_clock(reader: TailReader, config: &ConsumerConfig, sink: S, clock: C) -> Self {
        let window = WindowState::new(clock.now(), config.window);
        let alerts = AlertState::new(
            config.alert_threshold,
            Vocabulary::new(&config.vocabulary),
        );

        Self {
            reader,
            window,
            alerts,
            sink,
            clock,
            poll_interval: config.poll_interval,
            summary: RunSummary::default(),
        }
    }

    /// Feed one record through windowing then alerting, emitting events in that order.
    pub fn dispatch(&mut self, record: LogRecord) {
        let now = self.clock.now();
        self.summary.messages_consumed += 1;

        let window_report = self.window.record_arrival(now);
        let alert_report = self.alerts.record_message(&record.text);

        self.sink.emit(&PipelineEvent::Consumed(record));

        if let Some(report) = window_report {
            self.summary.windows_closed += 1;
            self.sink.emit(&PipelineEvent::Window {
                report,
                window_duration: self.window.window_duration(),
            });
        }

        if let Some(report) = alert_report {
            self.summary.alerts_fired += 1;
            self.sink.emit(&PipelineEvent::Alert(report));
        }
    }

    /// One read attempt, dispatching the line if there was one.
    pub fn poll_once(&mut self) -> Result<DispatchState, ReaderError> {
        match self.reader.next_line()? {
            ReadOutcome::Line(record) => {
                self.dispatch(record);
                Ok(DispatchState::Dispatching)
            }
            ReadOutcome::Pending => Ok(DispatchState::Waiting),
        }
    }

    /// Run until `shutdown` becomes true or its sender is dropped.
    ///
    /// A record that has been read is always dispatched before the signal is
    /// checked again. On exit the file handle is released and a summary event
    /// is emitted, even if reading failed.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<RunSummary, ReaderError> {
        self.sink.emit(&PipelineEvent::Started {
            path: self.reader.path().to_path_buf(),
            offset: self.reader.offset(),
        });

        let result = self.run_loop(&mut shutdown).await;

        self.reader.close();
        let summary = self.summary();
        self.sink.emit(&PipelineEvent::Summary(summary));

        result.map(|()| summary)
    }

    async fn run_loop(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<(), ReaderError> {
        loop {
            if *shutdown.borrow() {
                info!("Shutdown signal received");
                return Ok(());
            }

            if self.poll_once()? == DispatchState::Dispatching {
                // More data may already be buffered, read again without waiting
                continue;
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped, stopping consumer");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Counters as of now, including the partially filled window and alert cycle
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            positive_word_count: self.alerts.cumulative_count(),
            window_count: self.window.count(),
            ..self.summary
        }
    }

    pub fn reader(&self) -> &TailReader {
        &self.reader
    }

    pub fn window(&self) -> &WindowState {
        &self.window
    }

    pub fn alerts(&self) -> &AlertState {
        &self.alerts
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AlertReport, WindowReport};
    use crate::pipeline::clock::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn append(path: &Path, data: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(data.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    fn dispatcher(
        path: &Path,
        clock: ManualClock,
    ) -> Dispatcher<Vec<PipelineEvent>, ManualClock> {
        let config = ConsumerConfig {
            poll_interval: Duration::from_millis(10),
            ..ConsumerConfig::default()
        };
        let reader = TailReader::open(path).unwrap();
        Dispatcher::with_clock(reader, &config, Vec::new(), clock)
    }

    #[test]
    fn test_window_event_precedes_alert_event() {
        let temp_file = NamedTempFile::new().unwrap();
        let clock = ManualClock::new(at(0));
        let mut d = dispatcher(temp_file.path(), clock.clone());

        append(temp_file.path(), "happy happy happy happy\n");
        assert_eq!(d.poll_once().unwrap(), DispatchState::Dispatching);

        clock.set(at(60));
        append(temp_file.path(), "amazing day\n");
        assert_eq!(d.poll_once().unwrap(), DispatchState::Dispatching);
        assert_eq!(d.poll_once().unwrap(), DispatchState::Waiting);

        let events = &d.sink()[1..];
        assert!(matches!(&events[0], PipelineEvent::Consumed(r) if r.text == "amazing day"));
        assert_eq!(
            events[1],
            PipelineEvent::Window {
                report: WindowReport {
                    count: 2,
                    window_start: at(0),
                    window_end: at(60),
                },
                window_duration: Duration::from_secs(60),
            }
        );
        assert_eq!(events[2], PipelineEvent::Alert(AlertReport { total: 5 }));
    }

    #[test]
    fn test_summary_tracks_counters() {
        let temp_file = NamedTempFile::new().unwrap();
        let clock = ManualClock::new(at(0));
        let mut d = dispatcher(temp_file.path(), clock.clone());

        append(temp_file.path(), "loved it\nnothing\nfunny\n");
        while d.poll_once().unwrap() == DispatchState::Dispatching {}

        let summary = d.summary();
        assert_eq!(summary.messages_consumed, 3);
        assert_eq!(summary.window_count, 3);
        assert_eq!(summary.positive_word_count, 2);
        assert_eq!(summary.windows_closed, 0);
        assert_eq!(summary.alerts_fired, 0);
    }

    #[tokio::test]
    async fn test_shutdown_during_backoff() {
        let temp_file = NamedTempFile::new().unwrap();
        let clock = ManualClock::new(at(0));
        let mut d = dispatcher(temp_file.path(), clock);
        append(temp_file.path(), "too early\n");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let summary = d.run(shutdown_rx).await;
            (d, summary)
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let (d, summary) = handle.await.unwrap();
        let summary = summary.unwrap();
        // Appended after the reader attached, so it is delivered
        assert_eq!(summary.messages_consumed, 1);
        assert!(!d.reader().is_open());
        assert!(matches!(d.sink().last(), Some(PipelineEvent::Summary(s)) if *s == summary));
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_loop() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut d = dispatcher(temp_file.path(), ManualClock::new(at(0)));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);

        let summary = d.run(shutdown_rx).await.unwrap();
        assert_eq!(summary, RunSummary::default());
        assert!(!d.reader().is_open());
    }
}
