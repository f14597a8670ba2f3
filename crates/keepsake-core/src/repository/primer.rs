//! PrimerRepository trait definition.
//!
//! Persistence port for compiled memory primers, one per handle.

use keepsake_types::error::RepositoryError;
use keepsake_types::handle::Handle;
use keepsake_types::memory::MemoryPrimer;

/// Repository trait for memory primer persistence.
///
/// Implementations live in keepsake-infra (e.g., `SqlitePrimerRepository`).
/// A primer is keyed by normalized handle; `upsert_primer` replaces any
/// existing row, which makes the last rebuild win on concurrent writes.
pub trait PrimerRepository: Send + Sync {
    /// Store or replace the primer for a handle.
    fn upsert_primer(
        &self,
        primer: &MemoryPrimer,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the primer for a handle, if one has been compiled.
    fn get_primer(
        &self,
        handle: &Handle,
    ) -> impl std::future::Future<Output = Result<Option<MemoryPrimer>, RepositoryError>> + Send;
}
