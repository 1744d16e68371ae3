//! Report sinks - where per-command outcomes go

use crate::apply::{CommandReport, Outcome};
use crossbeam_channel::Sender;

/// Receives one report per applied command, in application order.
///
/// Called on the consumer thread before the next command is applied, so a
/// slow sink delays the stream.
pub trait ReportSink: Send {
    fn report(&mut self, report: &CommandReport);
}

impl<F> ReportSink for F
where
    F: FnMut(&CommandReport) + Send,
{
    fn report(&mut self, report: &CommandReport) {
        self(report)
    }
}

/// Logs every outcome. Rejections are warnings.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&mut self, report: &CommandReport) {
        match &report.outcome {
            Outcome::Rejected { .. } => log::warn!(
                "#{} {} from {}: {}",
                report.sequence,
                report.command,
                report.producer,
                report.outcome
            ),
            _ => log::info!(
                "#{} {}: {} ({:?})",
                report.sequence,
                report.command,
                report.outcome,
                report.elapsed
            ),
        }
    }
}

/// Forwards reports over a channel. A closed receiver is ignored.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    sender: Sender<CommandReport>,
}

impl ChannelSink {
    pub fn new(sender: Sender<CommandReport>) -> Self {
        Self { sender }
    }
}

impl ReportSink for ChannelSink {
    fn report(&mut self, report: &CommandReport) {
        if self.sender.send(report.clone()).is_err() {
            log::debug!("Report receiver gone, dropping report #{}", report.sequence);
        }
    }
}

/// Sends every report to each inner sink in turn
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ReportSink for FanoutSink {
    fn report(&mut self, report: &CommandReport) {
        for sink in &mut self.sinks {
            sink.report(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::RejectReason;
    use stage_command::{Command, ProducerId};
    use stage_core::Id;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn report(outcome: Outcome) -> CommandReport {
        CommandReport {
            sequence: 1,
            producer: ProducerId(Id::new(1)),
            command: Command::load_scene("rover"),
            outcome,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelSink::new(tx);

        sink.report(&report(Outcome::Cleared { count: 0 }));
        assert_eq!(rx.recv().unwrap().outcome, Outcome::Cleared { count: 0 });

        drop(rx);
        sink.report(&report(Outcome::Cleared { count: 0 }));
    }

    #[test]
    fn test_fanout_and_closure_sinks() {
        let seen = Arc::new(AtomicUsize::new(0));
        let a = seen.clone();
        let b = seen.clone();

        let mut sink = FanoutSink::new()
            .with(move |_: &CommandReport| {
                a.fetch_add(1, Ordering::SeqCst);
            })
            .with(LogSink)
            .with(move |r: &CommandReport| {
                if r.outcome.is_rejected() {
                    b.fetch_add(10, Ordering::SeqCst);
                }
            });

        sink.report(&report(Outcome::Rejected {
            scene_id: Some("rover".into()),
            reason: RejectReason::NotFound,
        }));
        assert_eq!(seen.load(Ordering::SeqCst), 11);
    }
}
