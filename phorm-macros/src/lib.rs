mod contract_trait;
mod decode_contract;
mod decode_member;
mod decode_predicate;
mod default_factory;
mod enum_value;

use contract_trait::contract_trait;
use decode_contract::decode_contract;
use decode_predicate::decode_predicate;
use enum_value::enum_value;
use proc_macro::TokenStream;
use syn::{Expr, ItemEnum, ItemStruct, parse_macro_input};

/// Implements `phorm::Contract` for a struct with named fields.
///
/// Container attributes: `name`, `rename_all`, `record`, `abstract_type`,
/// `spec_of(member = .., value = ..)` and `calculated(name = .., ty = ..)`.
///
/// Member attributes: `rename`, `ignore`, `console`, `required`, `output`, `return_value`,
/// `read_only`, `write_only`, `size`, `secure(classification = .., authenticator = ..)`,
/// `transform`, `enum_as_string` and `resultset(order = .., matcher = ..)`.
#[proc_macro_derive(Contract, attributes(phorm))]
pub fn derive_contract(input: TokenStream) -> TokenStream {
    let item: ItemStruct = parse_macro_input!(input as ItemStruct);
    if !item.generics.params.is_empty() {
        panic!("Contract cannot be derived for a generic struct");
    }
    let contract = decode_contract(item);
    contract_trait(&contract).into()
}

/// Implements `phorm::AsValue` for a fieldless enum.
#[proc_macro_derive(Enum)]
pub fn derive_enum(input: TokenStream) -> TokenStream {
    let item: ItemEnum = parse_macro_input!(input as ItemEnum);
    enum_value(&item).into()
}

/// Builds a `phorm::Predicate` from a Rust boolean expression.
///
/// `Entity::member` paths are columns, other paths, fields and literals are captured as values
/// when the predicate is built. Forms that cannot be evaluated over a row end up as unsupported
/// nodes and are rejected by the filter.
#[proc_macro]
pub fn predicate(input: TokenStream) -> TokenStream {
    let expr = parse_macro_input!(input as Expr);
    decode_predicate(&expr).into()
}
