// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Dispatch outcome events.
//!
//! Every per-channel decision the dispatcher takes is recorded as a
//! `DispatchEvent` and pushed through a bounded buffer. The dispatcher
//! never blocks on the buffer: a full buffer drops the event and bumps a
//! counter. Production wires the consumer end to a logging writer thread;
//! tests read the consumer directly to assert channel isolation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use tracing::{info, warn};

/// One per-channel dispatch outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
	/// Inbox message stored for the matched owner
	InboxSent {
		subject_id: String,
		listing_id: String,
		message_id: String,
	},
	/// Inbox channel suppressed by a live cooldown window
	InboxSuppressed {
		subject_id: String,
		listing_id: String,
	},
	/// Inbox message could not be stored or gated
	InboxFailed {
		subject_id: String,
		listing_id: String,
		error: String,
	},
	/// Email handed to the transport
	EmailSent {
		subject_id: String,
		listing_id: String,
	},
	/// Email channel suppressed by a live cooldown window
	EmailSuppressed {
		subject_id: String,
		listing_id: String,
	},
	/// Owner has no email address, or delivery is disabled
	EmailSkipped {
		subject_id: String,
		listing_id: String,
	},
	/// Email transport reported a failure
	EmailFailed {
		subject_id: String,
		listing_id: String,
		error: String,
	},
}

impl DispatchEvent {
	/// The matched owner this outcome concerns.
	pub fn subject_id(&self) -> &str {
		match self {
			DispatchEvent::InboxSent { subject_id, .. }
			| DispatchEvent::InboxSuppressed { subject_id, .. }
			| DispatchEvent::InboxFailed { subject_id, .. }
			| DispatchEvent::EmailSent { subject_id, .. }
			| DispatchEvent::EmailSuppressed { subject_id, .. }
			| DispatchEvent::EmailSkipped { subject_id, .. }
			| DispatchEvent::EmailFailed { subject_id, .. } => subject_id,
		}
	}
}

/// Bounded outcome buffer between the dispatcher and its consumer.
pub struct OutcomeBuffer {
	sender: Sender<DispatchEvent>,
	receiver: Receiver<DispatchEvent>,
}

impl OutcomeBuffer {
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split into the producer end (dispatcher) and consumer end (writer
	/// thread or test).
	pub fn split(self) -> (OutcomeProducer, OutcomeConsumer) {
		(
			OutcomeProducer {
				sender: self.sender,
				dropped: Arc::new(AtomicU64::new(0)),
			},
			OutcomeConsumer {
				receiver: self.receiver,
			},
		)
	}
}

/// Producer end of the outcome buffer.
#[derive(Clone)]
pub struct OutcomeProducer {
	sender: Sender<DispatchEvent>,
	dropped: Arc<AtomicU64>,
}

impl OutcomeProducer {
	/// Record an outcome without blocking. A full buffer drops the event.
	pub fn record(&self, event: DispatchEvent) {
		match self.sender.try_send(event) {
			Ok(()) => {}
			Err(TrySendError::Full(event)) => {
				let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
				warn!(
					target: "notifier::events",
					subject_id = %event.subject_id(),
					dropped_total = dropped,
					"outcome buffer full, event dropped"
				);
			}
			Err(TrySendError::Disconnected(_)) => {
				// Consumer gone; dispatch outcomes become log-only.
			}
		}
	}

	/// Outcomes dropped because the buffer was full.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}
}

/// Consumer end of the outcome buffer.
pub struct OutcomeConsumer {
	receiver: Receiver<DispatchEvent>,
}

impl OutcomeConsumer {
	/// Non-blocking receive.
	pub fn try_recv(&self) -> Option<DispatchEvent> {
		self.receiver.try_recv().ok()
	}

	/// Blocking receive with a deadline.
	pub fn recv_timeout(&self, timeout: Duration) -> Result<DispatchEvent, RecvTimeoutError> {
		self.receiver.recv_timeout(timeout)
	}

	/// Drain up to `max_count` buffered outcomes.
	pub fn drain(&self, max_count: usize) -> Vec<DispatchEvent> {
		let mut events = Vec::with_capacity(max_count);
		for _ in 0..max_count {
			match self.receiver.try_recv() {
				Ok(event) => events.push(event),
				Err(_) => break,
			}
		}
		events
	}
}

/// Default batch drained per writer pass.
pub const DEFAULT_WRITER_BATCH: usize = 64;

/// Background thread that drains the outcome buffer into the log.
///
/// Keeps outcome handling off the dispatch path; stops and flushes on
/// drop.
pub struct OutcomeWriter {
	thread_handle: Option<JoinHandle<()>>,
	shutdown: Arc<AtomicBool>,
}

impl OutcomeWriter {
	pub fn start(consumer: OutcomeConsumer) -> Self {
		let shutdown = Arc::new(AtomicBool::new(false));
		let shutdown_flag = shutdown.clone();

		let thread_handle = thread::Builder::new()
			.name("outcome-writer".to_string())
			.spawn(move || {
				info!(target: "notifier::events", "outcome writer started");
				Self::run(&consumer, &shutdown_flag);
				info!(target: "notifier::events", "outcome writer stopped");
			})
			.ok();

		Self {
			thread_handle,
			shutdown,
		}
	}

	fn run(consumer: &OutcomeConsumer, shutdown: &AtomicBool) {
		loop {
			if shutdown.load(Ordering::Relaxed) {
				for event in consumer.drain(DEFAULT_WRITER_BATCH) {
					Self::log(&event);
				}
				return;
			}
			match consumer.recv_timeout(Duration::from_millis(200)) {
				Ok(event) => {
					Self::log(&event);
					for event in consumer.drain(DEFAULT_WRITER_BATCH) {
						Self::log(&event);
					}
				}
				Err(RecvTimeoutError::Timeout) => {}
				Err(RecvTimeoutError::Disconnected) => return,
			}
		}
	}

	fn log(event: &DispatchEvent) {
		match event {
			DispatchEvent::InboxFailed { error, .. } | DispatchEvent::EmailFailed { error, .. } => {
				warn!(
					target: "notifier::events",
					subject_id = %event.subject_id(),
					error = %error,
					"dispatch channel failed"
				);
			}
			_ => {
				info!(target: "notifier::events", outcome = ?event, "dispatch outcome");
			}
		}
	}
}

impl Drop for OutcomeWriter {
	fn drop(&mut self) {
		self.shutdown.store(true, Ordering::Relaxed);
		if let Some(handle) = self.thread_handle.take() {
			let _ = handle.join();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sent(subject: &str) -> DispatchEvent {
		DispatchEvent::EmailSent {
			subject_id: subject.to_string(),
			listing_id: "l1".to_string(),
		}
	}

	#[test]
	fn record_and_drain_round_trip() {
		let (producer, consumer) = OutcomeBuffer::new(8).split();
		producer.record(sent("u1"));
		producer.record(sent("u2"));

		let drained = consumer.drain(8);
		assert_eq!(drained.len(), 2);
		assert_eq!(drained[0].subject_id(), "u1");
	}

	#[test]
	fn full_buffer_drops_instead_of_blocking() {
		let (producer, consumer) = OutcomeBuffer::new(1).split();
		producer.record(sent("kept"));
		producer.record(sent("dropped"));

		assert_eq!(producer.dropped(), 1);
		let drained = consumer.drain(8);
		assert_eq!(drained.len(), 1);
		assert_eq!(drained[0].subject_id(), "kept");
	}
}
