mod binary_op;
mod filter;
mod predicate;
mod unary_op;

pub use binary_op::*;
pub use filter::*;
pub use predicate::*;
pub use unary_op::*;
