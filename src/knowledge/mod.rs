//! Core knowledge engine — classification, chunking, sync, search,
//! auditing, and retention.
//!
//! The write path ([`sync`]) discovers markdown files via [`classify`],
//! hashes them via [`normalize`], splits them via [`chunker`], and persists
//! them via [`store`]. The read path ([`search`]) re-syncs before ranking
//! so a search never returns stale data. [`audit`] and [`retention`] are
//! the autoload token audit and the importance-protected forgetting pass.
//! Type definitions live in [`types`].

pub mod audit;
pub mod chunker;
pub mod classify;
pub mod normalize;
pub mod retention;
pub mod save;
pub mod search;
pub mod stats;
pub mod store;
pub mod sync;
pub mod types;

/// Convert an f32 embedding slice to raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            embedding.len() * std::mem::size_of::<f32>(),
        )
    }
}

/// Convert an L2 distance between two unit vectors to cosine similarity.
///
/// sqlite-vec reports L2 distance; for L2-normalized vectors
/// `cos = 1 − d²/2`.
pub fn l2_to_cosine(distance: f64) -> f64 {
    1.0 - (distance * distance) / 2.0
}
