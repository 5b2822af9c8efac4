//! Key material for the incremental position hashes.

pub mod zobrist;
