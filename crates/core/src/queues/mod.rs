pub mod fifo_drop_oldest_queue;

pub use fifo_drop_oldest_queue::*;
