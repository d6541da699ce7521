pub mod avalanche;
pub mod xxhash64;
