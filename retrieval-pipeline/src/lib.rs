pub mod chunking;
pub mod retrieval;

pub use chunking::{chunk_transcript, num_chunks_to_retrieve, MAX_WORDS_PER_CHUNK};
pub use retrieval::relevant_chunks;
