pub mod log;
pub mod mapping;
pub mod transcript;

pub use log::*;
pub use mapping::*;
pub use transcript::*;
