mod as_value;
mod behavior;
mod contract;
mod decoder;
mod diagnostics;
mod encoder;
mod error;
mod genspec;
mod lazy_list;
mod member;
mod model;
mod parameter;
mod predicate;
mod reader;
mod resultset;
mod row;
mod secure;
mod settings;
mod shape;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use behavior::*;
pub use contract::*;
pub use decoder::*;
pub use diagnostics::*;
pub use encoder::*;
pub use error::*;
pub use genspec::*;
pub use lazy_list::*;
pub use member::*;
pub use model::*;
pub use parameter::*;
pub use predicate::*;
pub use reader::*;
pub use resultset::*;
pub use row::*;
pub use secure::*;
pub use settings::*;
pub use shape::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
