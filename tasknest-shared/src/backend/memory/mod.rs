/// In-memory backend for tests and demos
///
/// Implements all three backend contracts without any external service:
///
/// - [`MemoryDocumentStore`]: collections keyed by path, live queries pushed
///   through unbounded channels
/// - [`MemoryBlobStore`]: blobs keyed by path, `memory://{bucket}/{path}` URLs
/// - [`MemoryIdentityProvider`]: email/password accounts and a watched
///   current principal
///
/// Failures can be injected per operation with [`FaultInjector::fail_next`],
/// and document pushes can be held back with
/// [`MemoryDocumentStore::pause_pushes`] to observe local state between a
/// mutation and the push that reflects it.
///
/// # Example
///
/// ```
/// use tasknest_shared::backend::memory::MemoryBackend;
///
/// let backend = MemoryBackend::new("tasknest-test.appspot.com");
/// let principal = backend.identity.seed_account("u1@example.com", "secret1", true);
/// assert!(principal.email_verified);
/// ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

mod blobs;
mod documents;
mod identity;

pub use blobs::MemoryBlobStore;
pub use documents::MemoryDocumentStore;
pub use identity::MemoryIdentityProvider;

/// Backend operation that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Subscribe,
    Create,
    Update,
    Delete,
    Upload,
    GetUrl,
    DeleteBlob,
    SignIn,
    SignUp,
    SendVerification,
    SignOut,
}

/// Shared failure plan for the in-memory stores
///
/// Each armed fault fires once, on the next call of its operation.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    armed: Arc<Mutex<HashMap<FaultPoint, usize>>>,
}

impl FaultInjector {
    /// Creates an injector with no armed faults
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call of `point` fail
    pub fn fail_next(&self, point: FaultPoint) {
        self.fail_times(point, 1);
    }

    /// Makes the next `times` calls of `point` fail
    pub fn fail_times(&self, point: FaultPoint, times: usize) {
        *lock(&self.armed).entry(point).or_insert(0) += times;
    }

    /// Consumes one armed fault for `point`, returning whether it fires
    pub fn should_fail(&self, point: FaultPoint) -> bool {
        let mut armed = lock(&self.armed);
        match armed.get_mut(&point) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    /// Disarms every fault
    pub fn clear(&self) {
        lock(&self.armed).clear();
    }
}

/// All three in-memory stores sharing one fault injector
#[derive(Clone)]
pub struct MemoryBackend {
    pub documents: MemoryDocumentStore,
    pub blobs: MemoryBlobStore,
    pub identity: MemoryIdentityProvider,
    pub faults: FaultInjector,
}

impl MemoryBackend {
    /// Creates an empty backend whose blob URLs live under `bucket`
    pub fn new(bucket: &str) -> Self {
        let faults = FaultInjector::new();
        MemoryBackend {
            documents: MemoryDocumentStore::with_faults(faults.clone()),
            blobs: MemoryBlobStore::with_faults(bucket, faults.clone()),
            identity: MemoryIdentityProvider::with_faults(faults.clone()),
            faults,
        }
    }
}

/// Locks a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
