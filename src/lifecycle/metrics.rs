// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for lifecycle operations.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	cache_hits: AtomicU64,
	code_exchanges: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
}
impl LifecycleMetrics {
	/// Access secrets served from the store without contacting the provider.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Successful authorization code exchanges.
	pub fn code_exchanges(&self) -> u64 {
		self.code_exchanges.load(Ordering::Relaxed)
	}

	/// Refresh grants sent to the provider.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Refresh grants that produced a new access secret.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Refresh grants that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_code_exchange(&self) {
		self.code_exchanges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}
}
