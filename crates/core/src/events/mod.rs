pub mod event;
pub mod payload;
pub mod session;

pub use event::*;
pub use payload::*;
pub use session::*;
