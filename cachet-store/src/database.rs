//! Database facade and single-instance registry
//!
//! `Database` composes the user registry, the record store and the nonce
//! ledger behind one contract. Every public operation runs in its own
//! serializable transaction: boolean operations catch storage failures,
//! log them and report `false`; collection operations surface the failure
//! through their `Result`.
//!
//! One facade exists per data directory process-wide. `instance` keeps a
//! weak-value map keyed by canonical path; a cached facade is health-probed
//! with a read transaction before being handed out again, and unused
//! facades are reclaimed when the last holder drops them.

use crate::config::{Config, ConfigError};
use crate::error::StoreError;
use crate::kv::DupStore;
use crate::{nonces, records, registry};
use crate::records::PutOutcome;
use cachet_model::{Clock, Nonce, RevValue, SystemClock, User};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, Weak};
use tracing::{error, warn};

const DB_FILE: &str = "cachet.redb";

static INSTANCES: LazyLock<Mutex<HashMap<PathBuf, Weak<Database>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

pub struct Database {
    store: DupStore,
    config: Config,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Get the facade for a data directory, creating it on first request.
    /// Repeated requests for the same directory return the same live
    /// instance.
    pub fn instance(data_dir: impl AsRef<Path>) -> Result<Arc<Self>, StoreError> {
        Self::instance_with(data_dir, Config::default(), Arc::new(SystemClock))
    }

    /// As [`Database::instance`], with explicit configuration and clock.
    /// Configuration only applies when this call actually constructs the
    /// facade; a cached instance keeps the configuration it was opened with.
    pub fn instance_with(
        data_dir: impl AsRef<Path>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Arc<Self>, StoreError> {
        let dir = validate_data_dir(data_dir.as_ref())?;

        let mut map = INSTANCES.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = map.get(&dir).and_then(Weak::upgrade) {
            if existing.probe().is_ok() {
                return Ok(existing);
            }
            map.remove(&dir);
        }

        let db = Arc::new(Self::open(&dir, config, clock)?);
        map.insert(dir, Arc::downgrade(&db));
        Ok(db)
    }

    /// Open a facade directly, bypassing the instance registry. The data
    /// directory must already exist; the store file is created inside it.
    /// Most callers want [`Database::instance`] — the embedded store
    /// refuses a second open of the same file in one process.
    pub fn open(
        data_dir: impl AsRef<Path>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let dir = validate_data_dir(data_dir.as_ref())?;
        let store = DupStore::open(dir.join(DB_FILE))?;
        Ok(Self { store, config, clock })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Health check used by the instance registry: a cached facade that can
    /// no longer open a read transaction is discarded.
    fn probe(&self) -> Result<(), StoreError> {
        self.store.begin_read().map(drop)
    }

    // --- user registry ---

    /// Register a user. `false` when the hash is already registered, when
    /// either byte string is empty, or on storage failure.
    pub fn add_user(&self, public_key: &[u8], public_hash: &[u8]) -> bool {
        let result = (|| -> Result<bool, StoreError> {
            let user =
                User::new(public_key.to_vec(), public_hash.to_vec(), self.clock.now_ms())?;
            let mut txn = self.store.begin_write()?;
            let added = registry::add_user(&mut txn, &user)?;
            txn.commit()?;
            Ok(added)
        })();
        self.unwrap_flag(result, "add_user", public_hash)
    }

    pub fn have_user(&self, public_hash: &[u8]) -> bool {
        let result = (|| -> Result<bool, StoreError> {
            let txn = self.store.begin_read()?;
            registry::have_user(&txn, public_hash)
        })();
        self.unwrap_flag(result, "have_user", public_hash)
    }

    pub fn get_user(&self, public_hash: &[u8]) -> Result<User, StoreError> {
        let txn = self.store.begin_read()?;
        registry::get_user(&txn, public_hash)
    }

    pub fn get_public_key(&self, public_hash: &[u8]) -> Result<Vec<u8>, StoreError> {
        let txn = self.store.begin_read()?;
        registry::get_public_key(&txn, public_hash)
    }

    /// Remove a user and, in the same transaction, every record and nonce
    /// rooted at them. `false` when the user was not registered.
    pub fn delete_user(&self, user: &User) -> bool {
        let result = (|| -> Result<bool, StoreError> {
            let mut txn = self.store.begin_write()?;
            let found = registry::delete_user(&mut txn, user)?;
            txn.commit()?;
            Ok(found)
        })();
        self.unwrap_flag(result, "delete_user", &user.public_hash)
    }

    // --- record store ---

    /// Store a value under `(key, revision)`. `false` when the revision
    /// already exists (revisions are immutable), when the revision is
    /// empty, or on storage failure.
    pub fn put_record(&self, user: &User, key: &[u8], revision: &[u8], value: &[u8]) -> bool {
        let result = (|| -> Result<bool, StoreError> {
            let rv = RevValue::new(revision.to_vec(), value.to_vec())?;
            let mut txn = self.store.begin_write()?;
            match records::put(&mut txn, user, key, &rv)? {
                PutOutcome::Stored => {
                    txn.commit()?;
                    Ok(true)
                }
                PutOutcome::DuplicateRevision => {
                    txn.abort()?;
                    Ok(false)
                }
            }
        })();
        self.unwrap_flag(result, "put_record", &user.public_hash)
    }

    /// All (revision, value) pairs under `key`; `None` when the index is
    /// absent.
    pub fn get_record(
        &self,
        user: &User,
        key: &[u8],
    ) -> Result<Option<Vec<RevValue>>, StoreError> {
        let txn = self.store.begin_read()?;
        records::get_record(&txn, user, key)
    }

    pub fn get_revision(
        &self,
        user: &User,
        key: &[u8],
        revision: &[u8],
    ) -> Result<Option<RevValue>, StoreError> {
        let txn = self.store.begin_read()?;
        records::get_revision(&txn, user, key, revision)
    }

    pub fn get_indices(&self, user: &User) -> Result<Vec<Vec<u8>>, StoreError> {
        let txn = self.store.begin_read()?;
        records::get_indices(&txn, user)
    }

    /// Revision bytes under `key`; `None` when there are none.
    pub fn get_revisions(
        &self,
        user: &User,
        key: &[u8],
    ) -> Result<Option<Vec<Vec<u8>>>, StoreError> {
        let txn = self.store.begin_read()?;
        records::get_revisions(&txn, user, key)
    }

    /// Remove `key` and all its revisions. `true` when anything was removed.
    pub fn delete_record(&self, user: &User, key: &[u8]) -> bool {
        let result = (|| -> Result<bool, StoreError> {
            let mut txn = self.store.begin_write()?;
            let removed = records::delete_record(&mut txn, user, key)?;
            txn.commit()?;
            Ok(removed)
        })();
        self.unwrap_flag(result, "delete_record", &user.public_hash)
    }

    // --- nonce ledger ---

    /// Atomically record the nonce unless it has been seen for this key.
    /// `true` means the request may proceed.
    pub fn check_and_add_nonce(&self, nonce: &Nonce, public_key: &[u8]) -> bool {
        let result = (|| -> Result<bool, StoreError> {
            let mut txn = self.store.begin_write()?;
            let accepted = nonces::check_and_add(&mut txn, nonce, public_key)?;
            txn.commit()?;
            Ok(accepted)
        })();
        self.unwrap_flag(result, "check_and_add_nonce", public_key)
    }

    /// Purge nonces older than the configured TTL across all users.
    /// Intended to be driven by a periodic server task; returns the number
    /// of tokens removed (0 on storage failure).
    pub fn clear_old_nonces(&self) -> usize {
        let result = (|| -> Result<usize, StoreError> {
            let mut txn = self.store.begin_write()?;
            let removed =
                nonces::purge_expired(&mut txn, self.clock.now_secs(), self.config.nonce_ttl)?;
            txn.commit()?;
            Ok(removed)
        })();
        match result {
            Ok(removed) => removed,
            Err(e) => {
                error!(op = "clear_old_nonces", error = %e, "storage failure");
                0
            }
        }
    }

    /// Collapse a failure into the boolean contract: abort happened when
    /// the transaction dropped, log with a short hash prefix (never
    /// payloads or full keys), report `false`. Entity-validation rejections
    /// are expected caller mistakes and log at warn, not error.
    fn unwrap_flag(&self, result: Result<bool, StoreError>, op: &'static str, id: &[u8]) -> bool {
        match result {
            Ok(flag) => flag,
            Err(StoreError::InvalidEntity(e)) => {
                warn!(op, user = %hash_prefix(id), error = %e, "rejected invalid entity");
                false
            }
            Err(e) => {
                error!(op, user = %hash_prefix(id), error = %e, "storage failure");
                false
            }
        }
    }
}

fn validate_data_dir(path: &Path) -> Result<PathBuf, StoreError> {
    if !path.exists() {
        return Err(ConfigError::MissingDataDir(path.to_path_buf()).into());
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()).into());
    }
    Ok(path.canonicalize()?)
}

fn hash_prefix(bytes: &[u8]) -> String {
    hex::encode(&bytes[..bytes.len().min(4)])
}
