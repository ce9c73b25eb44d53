pub mod memory;
pub mod opensearch;

pub use memory::{document_id_for, MemoryStore};
pub use opensearch::OpenSearchStore;
