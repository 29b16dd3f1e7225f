pub mod container;
pub mod fs;
pub mod stats;
