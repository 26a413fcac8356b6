pub mod eigenda;
pub mod memory;

pub use eigenda::{EigenDaStore, EigenDaStoreSettings};
pub use memory::{MemoryStore, MemoryStoreSettings};
