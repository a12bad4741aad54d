pub mod document_store;
pub use document_store::{Collection, Document, DocumentStore, Query, SharedStore, SortDirection};
pub mod memory_store;
pub use memory_store::MemoryDocumentStore;
pub mod pg_store;
pub use pg_store::PgDocumentStore;
pub mod repository;
pub use repository::{Entity, Repository};
