//! Quote request flow: the step-gated wizard, the stricter project-capture
//! form and the backend that stores both as leads.

pub mod capture;
pub mod draft;
pub mod submit;
pub mod wizard;

pub use capture::*;
pub use draft::*;
pub use submit::*;
pub use wizard::*;
