pub mod stage1_map_roles;
pub mod stage2_substitute;
pub mod stage3_safeguard;

pub use stage1_map_roles::*;
pub use stage2_substitute::*;
pub use stage3_safeguard::*;
