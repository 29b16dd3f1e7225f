pub mod clock;
pub mod medium;
pub mod sample_source;
pub mod sleep;
