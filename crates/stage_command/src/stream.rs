//! Command Stream - ordered hand-off from producers to the single consumer
//!
//! Any number of [`CommandPublisher`]s may publish from any thread. The one
//! [`CommandConsumer`] sees commands in channel arrival order, each exactly
//! once. A bounded stream never drops silently: depending on
//! [`Backpressure`] a full buffer either blocks the producer or fails the
//! publish with [`StreamError::BackpressureExceeded`].

use crate::command::Command;
use core::fmt;
use crossbeam_channel::{
    bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};
use stage_core::{Id, IdGenerator};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// What a bounded stream does when its buffer is full
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backpressure {
    /// Block the producer until the consumer makes room
    #[default]
    Block,
    /// Fail the publish with [`StreamError::BackpressureExceeded`]
    Reject,
}

/// Configuration for a command stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    /// Buffer capacity, `None` for unbounded
    pub capacity: Option<usize>,
    /// Full-buffer behaviour. Ignored when unbounded.
    pub backpressure: Backpressure,
}

impl StreamConfig {
    /// Unbounded buffer; publish never blocks
    pub const fn unbounded() -> Self {
        Self {
            capacity: None,
            backpressure: Backpressure::Block,
        }
    }

    /// Bounded buffer with explicit full-buffer behaviour.
    ///
    /// A capacity of 0 is raised to 1; the stream always buffers at least
    /// one command.
    pub const fn bounded(capacity: usize, backpressure: Backpressure) -> Self {
        Self {
            capacity: Some(if capacity == 0 { 1 } else { capacity }),
            backpressure,
        }
    }

    /// Same config with a zero capacity raised to 1
    fn normalized(self) -> Self {
        Self {
            capacity: self.capacity.map(|capacity| capacity.max(1)),
            ..self
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Errors from publishing or receiving
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("Command stream is full (capacity {capacity})")]
    BackpressureExceeded { capacity: usize },

    #[error("Command stream is closed")]
    Closed,
}

/// Identifies one producer on a stream
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProducerId(pub Id);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "producer#{}", self.0)
    }
}

/// A delivered command with its delivery metadata
#[derive(Clone, Debug, PartialEq)]
pub struct CommandEnvelope {
    /// Delivery sequence number, starting at 1 and strictly increasing
    pub sequence: u64,
    /// Who published it
    pub producer: ProducerId,
    /// The command
    pub command: Command,
}

/// Snapshot of stream counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Commands accepted into the buffer
    pub published: u64,
    /// Publishes refused because the buffer was full
    pub rejected: u64,
    /// Commands handed to the consumer
    pub delivered: u64,
}

impl StreamStats {
    /// Accepted but not yet delivered
    pub fn in_flight(&self) -> u64 {
        self.published.saturating_sub(self.delivered)
    }
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    rejected: AtomicU64,
    delivered: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> StreamStats {
        StreamStats {
            published: self.published.load(Ordering::Acquire),
            rejected: self.rejected.load(Ordering::Acquire),
            delivered: self.delivered.load(Ordering::Acquire),
        }
    }
}

struct Published {
    producer: ProducerId,
    command: Command,
}

/// The command stream. Hand out publishers, then turn it into the consumer.
pub struct CommandStream {
    config: StreamConfig,
    sender: Sender<Published>,
    receiver: Receiver<Published>,
    counters: Arc<Counters>,
    producers: IdGenerator,
}

impl CommandStream {
    /// Create a new stream
    pub fn new(config: StreamConfig) -> Self {
        let config = config.normalized();
        let (sender, receiver) = match config.capacity {
            Some(capacity) => bounded(capacity),
            None => unbounded(),
        };

        Self {
            config,
            sender,
            receiver,
            counters: Arc::new(Counters::default()),
            producers: IdGenerator::new(),
        }
    }

    /// Stream configuration
    pub fn config(&self) -> StreamConfig {
        self.config
    }

    /// Create a publisher with a fresh producer id
    pub fn publisher(&self, label: &str) -> CommandPublisher {
        let id = ProducerId(self.producers.next());
        log::debug!("Registered {} ({})", id, label);
        CommandPublisher {
            id,
            label: Arc::from(label),
            sender: self.sender.clone(),
            config: self.config,
            counters: self.counters.clone(),
        }
    }

    /// Give up the ability to create publishers and take the consumer end.
    ///
    /// Once every publisher is dropped and the buffer drains,
    /// [`CommandConsumer::recv`] returns `None`.
    pub fn into_consumer(self) -> CommandConsumer {
        CommandConsumer {
            receiver: self.receiver,
            counters: self.counters,
        }
    }
}

impl Default for CommandStream {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

/// Producer end. Clones share the producer id.
#[derive(Clone)]
pub struct CommandPublisher {
    id: ProducerId,
    label: Arc<str>,
    sender: Sender<Published>,
    config: StreamConfig,
    counters: Arc<Counters>,
}

impl CommandPublisher {
    /// Producer id
    pub fn id(&self) -> ProducerId {
        self.id
    }

    /// Producer label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Publish a command
    pub fn publish(&self, command: Command) -> Result<(), StreamError> {
        let msg = Published {
            producer: self.id,
            command,
        };

        let result = match (self.config.capacity, self.config.backpressure) {
            (Some(capacity), Backpressure::Reject) => match self.sender.try_send(msg) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(rejected)) => {
                    self.counters.rejected.fetch_add(1, Ordering::AcqRel);
                    log::warn!(
                        "{} ({}) dropped {}: stream full",
                        self.id,
                        self.label,
                        rejected.command.name()
                    );
                    Err(StreamError::BackpressureExceeded { capacity })
                }
                Err(TrySendError::Disconnected(_)) => Err(StreamError::Closed),
            },
            _ => self.sender.send(msg).map_err(|_| StreamError::Closed),
        };

        if result.is_ok() {
            self.counters.published.fetch_add(1, Ordering::AcqRel);
        }
        result
    }

    /// Publish every command in order, stopping at the first failure
    pub fn publish_all<I>(&self, commands: I) -> Result<usize, StreamError>
    where
        I: IntoIterator<Item = Command>,
    {
        let mut count = 0;
        for command in commands {
            self.publish(command)?;
            count += 1;
        }
        Ok(count)
    }

    /// Current stream counters
    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }
}

impl fmt::Debug for CommandPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandPublisher")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

/// Consumer end. There is exactly one per stream.
pub struct CommandConsumer {
    receiver: Receiver<Published>,
    counters: Arc<Counters>,
}

impl CommandConsumer {
    fn deliver(&self, msg: Published) -> CommandEnvelope {
        let sequence = self.counters.delivered.fetch_add(1, Ordering::AcqRel) + 1;
        CommandEnvelope {
            sequence,
            producer: msg.producer,
            command: msg.command,
        }
    }

    /// Block until the next command. `None` once the stream is closed and empty.
    pub fn recv(&self) -> Option<CommandEnvelope> {
        self.receiver.recv().ok().map(|msg| self.deliver(msg))
    }

    /// Next command if one is buffered
    pub fn try_recv(&self) -> Result<Option<CommandEnvelope>, StreamError> {
        match self.receiver.try_recv() {
            Ok(msg) => Ok(Some(self.deliver(msg))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StreamError::Closed),
        }
    }

    /// Wait up to `timeout` for the next command. `Ok(None)` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<CommandEnvelope>, StreamError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Ok(Some(self.deliver(msg))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(StreamError::Closed),
        }
    }

    /// Take everything currently buffered, in order
    pub fn drain(&self) -> Vec<CommandEnvelope> {
        let mut envelopes = Vec::with_capacity(self.receiver.len());
        while let Ok(msg) = self.receiver.try_recv() {
            envelopes.push(self.deliver(msg));
        }
        envelopes
    }

    /// Buffered command count
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Current stream counters
    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }
}

impl fmt::Debug for CommandConsumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandConsumer")
            .field("stats", &self.stats())
            .finish()
    }
}
