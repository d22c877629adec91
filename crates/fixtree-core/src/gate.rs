//! Serialized-write primitive.
//!
//! Some embedded engines take a lock on the whole store for every write and
//! reject a second write transaction while one is open. Every create and
//! update issued by the resolver goes through a [`WriteGate`]; in
//! [`WriteMode::Serialized`] the gate admits one write at a time, in the order
//! writers arrived.

use std::future::Future;

use tokio::sync::Mutex;

use crate::config::WriteMode;

/// Runs write operations one fully completed before the next starts.
///
/// The gate only wraps single storage calls. It is never held while nested
/// fixtures resolve, so recursion through the gate cannot deadlock.
#[derive(Debug, Default)]
pub struct WriteGate {
	mode: WriteMode,
	lock: Mutex<()>,
}

impl WriteGate {
	/// Creates a gate for `mode`.
	pub fn new(mode: WriteMode) -> Self {
		Self {
			mode,
			lock: Mutex::new(()),
		}
	}

	/// Returns the gate's write mode.
	pub fn mode(&self) -> WriteMode {
		self.mode
	}

	/// Runs one write operation.
	///
	/// The operation is not polled until the gate admits it. The mutex is
	/// FIFO, so waiting writers run in arrival order.
	pub async fn run<F, T>(&self, operation: F) -> T
	where
		F: Future<Output = T>,
	{
		match self.mode {
			WriteMode::Serialized => {
				let _permit = self.lock.lock().await;
				operation.await
			}
			WriteMode::Concurrent => operation.await,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	struct Probe {
		active: AtomicUsize,
		peak: AtomicUsize,
	}

	impl Probe {
		fn new() -> Arc<Self> {
			Arc::new(Self {
				active: AtomicUsize::new(0),
				peak: AtomicUsize::new(0),
			})
		}

		async fn write(&self) {
			let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
			self.peak.fetch_max(now, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(5)).await;
			self.active.fetch_sub(1, Ordering::SeqCst);
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_serialized_writes_never_overlap() {
		let gate = WriteGate::new(WriteMode::Serialized);
		let probe = Probe::new();

		futures::future::join_all((0..4).map(|_| gate.run(probe.write()))).await;

		assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_concurrent_writes_overlap() {
		let gate = WriteGate::new(WriteMode::Concurrent);
		let probe = Probe::new();

		futures::future::join_all((0..4).map(|_| gate.run(probe.write()))).await;

		assert_eq!(probe.peak.load(Ordering::SeqCst), 4);
	}
}
