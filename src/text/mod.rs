//! Text front end: normalization, chunking, and tokenization

pub mod chunker;
pub mod normalizer;
pub mod tokenizer;

pub use chunker::{chunk_text, DEFAULT_MAX_CHUNK_LEN};
pub use normalizer::TextNormalizer;
pub use tokenizer::{TokenBatch, UnicodeIndexer, UnicodeTokenizer};
