pub mod stats;
pub mod tiles;
