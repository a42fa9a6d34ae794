#![forbid(unsafe_code)]
//! Citizen registry on top of `avlindex-core`: the record type, its admission
//! rules, an append-only audit log, and CSV interchange.

pub mod audit;
pub mod citizen;
pub mod config;
pub mod csv;
pub mod error;
pub mod validation;

use avlindex_core::{AuditSink, AvlTree, GuardedTree};

pub use audit::FileAudit;
pub use citizen::Citizen;
pub use config::{BenchConfig, RegistryConfig, SNAPSHOT_KEY_ENV};
pub use csv::{ImportReport, MalformedRow};
pub use error::{RegistryError, Result};
pub use validation::{CitizenValidator, ValidationError};

/// Validated citizen index, audited to a file unless another sink is supplied.
pub type Registry<A = FileAudit> = AvlTree<Citizen, CitizenValidator, A>;

/// Builds a registry wired to `audit` and fills it from the configured snapshot, if
/// one exists.
pub fn open_with<A: AuditSink>(config: &RegistryConfig, audit: A) -> Result<Registry<A>> {
    let registry = GuardedTree::with_hooks(CitizenValidator::new(), audit);
    let key = config.snapshot_key()?;
    if registry.load(&config.snapshot_path, &key)? {
        tracing::info!(
            path = %config.snapshot_path.display(),
            citizens = registry.len(),
            "registry restored from snapshot"
        );
    }
    Ok(registry)
}

/// [`open_with`] using a [`FileAudit`] on `config.audit_log`.
pub fn open(config: &RegistryConfig) -> Result<Registry> {
    let audit = FileAudit::open(&config.audit_log)?;
    open_with(config, audit)
}
