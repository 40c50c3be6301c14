pub use phorm_core::*;
pub use phorm_macros::*;
