pub mod transmitter;

pub use transmitter::*;
