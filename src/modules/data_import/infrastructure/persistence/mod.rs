pub mod checkpoint_store_impl;
pub mod in_memory_checkpoint_store;

pub use checkpoint_store_impl::CheckpointStoreImpl;
pub use in_memory_checkpoint_store::InMemoryCheckpointStore;
