pub mod vector_db;

pub use vector_db::{MatchMetadata, PineconeIndex, RetrievalMatch, VectorDBError, VectorSearch};
