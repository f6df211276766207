//! Thread-safe in-memory credential store keyed by principal.
//!
//! The outer map only changes when a principal is seen for the first time; every principal then
//! owns its own slot lock. A [`CredentialStore::put`] swaps the whole record under that slot's
//! write lock, so readers observe either the old record or the new one, never a mix of secrets
//! from two exchanges, and writes for one principal never block reads for another.

// self
use crate::{
	_prelude::*,
	auth::{CredentialRecord, PrincipalKey, TokenSecret},
	clock::{Clock, SystemClock},
};

type Slot = Arc<RwLock<CredentialRecord>>;

/// In-memory mapping from principal to [`CredentialRecord`].
///
/// Records live until the store is dropped. Expired access secrets are not evicted eagerly; they
/// are simply never returned.
pub struct CredentialStore {
	slots: RwLock<HashMap<PrincipalKey, Slot>>,
	clock: Arc<dyn Clock>,
}
impl CredentialStore {
	/// Creates an empty store reading time from `clock`.
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self { slots: Default::default(), clock }
	}

	/// Inserts or overwrites the record for `principal`; the access secret expires `ttl` from now.
	pub fn put(
		&self,
		principal: &PrincipalKey,
		refresh_secret: TokenSecret,
		access_secret: TokenSecret,
		ttl: Duration,
	) {
		let record = CredentialRecord::new(refresh_secret, access_secret, self.clock.now(), ttl);

		if let Some(slot) = self.slot(principal) {
			*slot.write() = record;

			return;
		}

		let mut slots = self.slots.write();

		match slots.get(principal) {
			Some(slot) => *slot.write() = record,
			None => {
				slots.insert(principal.clone(), Arc::new(RwLock::new(record)));
			},
		}
	}

	/// Returns the access secret iff it is stored and has not reached its expiry.
	pub fn access_secret(&self, principal: &PrincipalKey) -> Option<TokenSecret> {
		let slot = self.slot(principal)?;
		let now = self.clock.now();
		let record = slot.read();

		record.access_at(now).cloned()
	}

	/// Returns the stored refresh secret, or `None` if the principal was never authorized.
	pub fn refresh_secret(&self, principal: &PrincipalKey) -> Option<TokenSecret> {
		self.slot(principal).map(|slot| slot.read().refresh_secret.clone())
	}

	/// Returns `true` once a refresh secret has been stored for `principal`.
	pub fn has_refresh_secret(&self, principal: &PrincipalKey) -> bool {
		self.slots.read().contains_key(principal)
	}

	/// Returns a consistent copy of the whole record for `principal`.
	pub fn snapshot(&self, principal: &PrincipalKey) -> Option<CredentialRecord> {
		self.slot(principal).map(|slot| slot.read().clone())
	}

	/// Number of principals with a stored record.
	pub fn len(&self) -> usize {
		self.slots.read().len()
	}

	/// Returns `true` when no principal has been authorized yet.
	pub fn is_empty(&self) -> bool {
		self.slots.read().is_empty()
	}

	/// Current instant according to the store's clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	fn slot(&self, principal: &PrincipalKey) -> Option<Slot> {
		self.slots.read().get(principal).cloned()
	}
}
impl Default for CredentialStore {
	fn default() -> Self {
		Self::new(Arc::new(SystemClock))
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").field("principals", &self.len()).finish()
	}
}
