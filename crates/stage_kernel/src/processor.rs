//! Scene processor - the single consumer of the command stream
//!
//! The processor pulls commands off the stream one at a time, applies them,
//! republishes the anchor view and hands the report to the sink. The next
//! command is not touched until all of that is done.

use crate::apply::{ApplyStats, CommandApplier, CommandReport};
use crate::sink::{LogSink, ReportSink};
use stage_anchor::AnchorView;
use stage_command::{CommandConsumer, StreamError, StreamStats};
use stage_scene::SceneRuntime;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Errors from running the processor
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("Failed to spawn processor thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Processor thread panicked")]
    Panicked,
}

/// Totals after the processor stops
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessorSummary {
    /// Applicator counters
    pub apply: ApplyStats,
    /// Stream counters at the time of the summary
    pub stream: StreamStats,
    /// Anchors in the table
    pub anchors: usize,
}

/// Owns the consumer end of the stream and everything it mutates
pub struct SceneProcessor<R: SceneRuntime> {
    applier: CommandApplier<R>,
    consumer: CommandConsumer,
    sink: Box<dyn ReportSink>,
    view: AnchorView,
}

impl<R: SceneRuntime> SceneProcessor<R> {
    /// Create a processor that logs its reports
    pub fn new(applier: CommandApplier<R>, consumer: CommandConsumer) -> Self {
        let view = AnchorView::new();
        view.publish(applier.anchors());
        Self {
            applier,
            consumer,
            sink: Box::new(LogSink),
            view,
        }
    }

    /// Replace the report sink
    pub fn with_sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Read-only view of the anchor table, usable from any thread
    pub fn view(&self) -> AnchorView {
        self.view.clone()
    }

    fn handle(&mut self, envelope: stage_command::CommandEnvelope) -> CommandReport {
        log::debug!("Applying #{} {}", envelope.sequence, envelope.command);
        let report = self.applier.apply(envelope);
        self.view.publish(self.applier.anchors());
        self.sink.report(&report);
        report
    }

    /// Apply the next buffered command, if any, without blocking
    pub fn step(&mut self) -> Result<Option<CommandReport>, StreamError> {
        match self.consumer.try_recv()? {
            Some(envelope) => Ok(Some(self.handle(envelope))),
            None => Ok(None),
        }
    }

    /// Wait up to `timeout` for a command and apply it
    pub fn step_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<CommandReport>, StreamError> {
        match self.consumer.recv_timeout(timeout)? {
            Some(envelope) => Ok(Some(self.handle(envelope))),
            None => Ok(None),
        }
    }

    /// Apply every buffered command and return how many were applied
    pub fn run_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(Some(_)) = self.step() {
            applied += 1;
        }
        applied
    }

    /// Apply commands until every publisher is gone and the stream is drained
    pub fn run(&mut self) -> ProcessorSummary {
        log::info!("Scene processor running on '{}'", self.applier.runtime().name());
        while let Some(envelope) = self.consumer.recv() {
            self.handle(envelope);
        }
        let summary = self.summary();
        log::info!(
            "Command stream closed after {} command(s), {} anchor(s) live",
            summary.apply.applied,
            summary.anchors
        );
        summary
    }

    /// Current totals
    pub fn summary(&self) -> ProcessorSummary {
        ProcessorSummary {
            apply: self.applier.stats(),
            stream: self.consumer.stats(),
            anchors: self.applier.anchors().len(),
        }
    }

    pub fn applier(&self) -> &CommandApplier<R> {
        &self.applier
    }

    pub fn applier_mut(&mut self) -> &mut CommandApplier<R> {
        &mut self.applier
    }
}

impl<R: SceneRuntime + 'static> SceneProcessor<R> {
    /// Run on a dedicated thread until the stream closes
    pub fn spawn(self) -> Result<ProcessorHandle<R>, KernelError> {
        let view = self.view();
        let join = thread::Builder::new()
            .name("stage-processor".into())
            .spawn(move || {
                let mut processor = self;
                processor.run();
                processor
            })?;

        Ok(ProcessorHandle { view, join })
    }
}

/// Handle to a processor running on its own thread
pub struct ProcessorHandle<R: SceneRuntime> {
    view: AnchorView,
    join: JoinHandle<SceneProcessor<R>>,
}

impl<R: SceneRuntime> ProcessorHandle<R> {
    /// Read-only view of the anchor table
    pub fn view(&self) -> AnchorView {
        self.view.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the stream to close and get the processor back
    pub fn join(self) -> Result<SceneProcessor<R>, KernelError> {
        self.join.join().map_err(|_| KernelError::Panicked)
    }
}
