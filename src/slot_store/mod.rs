//! Persistent storage of registered slots.
//!
//! A slot is addressed by its zone and the words of its name, and holds the textual IP address
//! registered for it. Stores must provide an atomic create-if-absent operation: of any number of
//! concurrent [`SlotStore::create_slot`] calls for the same slot, exactly one succeeds.
//!
//! Two implementations are provided, [`memory::InMemorySlotStore`] and [`file::FileSlotStore`].
//! The former is not durable across restarts. The latter keeps one file per slot in a directory
//! tree that can be inspected, backed up or edited by hand.

use crate::error::Error;
use std::sync::Arc;

pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use file::FileSlotStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemorySlotStore;

/// `DynSlotStore` is a type alias for a [`SlotStore`] shared by the registry's readers and
/// writers. Stores synchronize internally.
#[allow(clippy::module_name_repetitions)]
pub type DynSlotStore = Arc<dyn SlotStore + Send + Sync>;

/// An async trait describing storage of slot contents, keyed by zone directory name and the
/// words of the slot's name.
#[async_trait::async_trait]
pub trait SlotStore {
    /// Read the content of a slot, `None` if the slot is free.
    async fn read_slot(&self, zone: &str, words: &[&str]) -> Result<Option<String>, Error>;

    /// Atomically claim a free slot with the given content. Returns `false` without touching
    /// the slot if it is already taken.
    async fn create_slot(&self, zone: &str, words: &[&str], content: &str) -> Result<bool, Error>;

    /// Free a slot. Freeing a free slot is not an error.
    async fn remove_slot(&self, zone: &str, words: &[&str]) -> Result<(), Error>;
}
