pub mod client;
pub mod prompts;
pub mod safeguard_prompt;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use client::*;
pub use prompts::*;
pub use safeguard_prompt::*;
pub use validation::*;
