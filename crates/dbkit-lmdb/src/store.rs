use std::path::Path;
use std::sync::Arc;

use dbkit_store::{KvBackend, StoreError, StoreResult};
use lmdb::{DatabaseFlags, Environment, EnvironmentFlags};
use tracing::{debug, info};

use crate::collection::LmdbCollection;
use crate::config::LmdbConfig;
use dbkit_store::guard::ActiveTxns;
use crate::txn::LmdbTxn;

/// LMDB-backed key-value backend.
///
/// Each collection is a named LMDB sub-database inside one environment.
/// Collections must be opened before transactions are started on the calling
/// thread, since LMDB opens sub-databases through a transaction of its own.
pub struct LmdbBackend {
    env: Arc<Environment>,
    config: LmdbConfig,
    active: Arc<ActiveTxns>,
}

impl LmdbBackend {
    /// Open (or create) the environment described by `config`.
    pub fn open(config: LmdbConfig) -> StoreResult<Self> {
        if !config.read_only {
            std::fs::create_dir_all(&config.path)?;
        }

        let mut builder = Environment::new();
        builder.set_max_dbs(config.max_collections);
        builder.set_max_readers(config.max_readers);
        builder.set_map_size(config.map_size);
        if config.read_only {
            builder.set_flags(EnvironmentFlags::READ_ONLY);
        }
        let env = builder.open(&config.path).map_err(StoreError::backend)?;

        info!(
            path = %config.path.display(),
            map_size = config.map_size,
            read_only = config.read_only,
            "opened LMDB environment"
        );

        Ok(Self {
            env: Arc::new(env),
            config,
            active: Arc::new(ActiveTxns::default()),
        })
    }

    /// Open with default settings at `path`.
    pub fn open_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open(LmdbConfig::new(path.as_ref()))
    }

    /// Settings the environment was opened with.
    pub fn config(&self) -> &LmdbConfig {
        &self.config
    }

    /// Directory of the LMDB environment.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Flush buffered data to disk.
    pub fn sync(&self, force: bool) -> StoreResult<()> {
        self.env.sync(force).map_err(StoreError::backend)
    }
}

impl KvBackend for LmdbBackend {
    type Txn<'b> = LmdbTxn<'b>;
    type Collection = LmdbCollection;

    fn open_collection(&self, name: &str) -> StoreResult<LmdbCollection> {
        let _slot = self.active.enter()?;
        let db = if self.config.read_only {
            self.env.open_db(Some(name)).map_err(|e| match e {
                lmdb::Error::NotFound => {
                    StoreError::Backend(format!("collection {name} does not exist"))
                }
                other => StoreError::backend(other),
            })?
        } else {
            self.env
                .create_db(Some(name), DatabaseFlags::empty())
                .map_err(StoreError::backend)?
        };
        debug!(collection = name, "opened LMDB sub-database");
        Ok(LmdbCollection::new(
            name,
            db,
            Arc::clone(&self.env),
            Arc::clone(&self.active),
            self.config.read_only,
        ))
    }

    fn begin_read(&self) -> StoreResult<LmdbTxn<'_>> {
        let slot = self.active.enter()?;
        let txn = self.env.begin_ro_txn().map_err(StoreError::backend)?;
        Ok(LmdbTxn::read(txn, slot))
    }

    fn begin_write(&self) -> StoreResult<LmdbTxn<'_>> {
        if self.config.read_only {
            return Err(StoreError::ReadOnly);
        }
        let slot = self.active.enter()?;
        let txn = self.env.begin_rw_txn().map_err(StoreError::backend)?;
        Ok(LmdbTxn::write(txn, slot))
    }
}

impl std::fmt::Debug for LmdbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbBackend")
            .field("path", &self.config.path)
            .field("read_only", &self.config.read_only)
            .finish()
    }
}
