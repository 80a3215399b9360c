pub mod envelope;
pub mod trace;

pub use envelope::*;
pub use trace::*;
