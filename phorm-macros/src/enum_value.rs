use proc_macro2::{Literal, TokenStream};
use quote::{ToTokens, quote};
use syn::{Expr, ExprLit, ExprUnary, Fields, ItemEnum, Lit, LitStr, UnOp, spanned::Spanned};

fn discriminant(expr: &Expr) -> i64 {
    let parsed = match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(v), ..
        }) => v.base10_parse::<i64>().ok(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(..),
            expr,
            ..
        }) => match expr.as_ref() {
            Expr::Lit(ExprLit {
                lit: Lit::Int(v), ..
            }) => v.base10_parse::<i64>().ok().map(|v| -v),
            _ => None,
        },
        _ => None,
    };
    let Some(v) = parsed else {
        panic!(
            "Enum discriminant `{}` must be an integer literal",
            expr.to_token_stream()
        );
    };
    v
}

/// `AsValue` for a fieldless enum: the case travels as `EnumValue` and is read back from an
/// enum value, a case name or any integer.
pub(crate) fn enum_value(item: &ItemEnum) -> TokenStream {
    let name = &item.ident;
    let type_name = LitStr::new(&name.to_string(), name.span());
    let mut next = 0i64;
    let cases: Vec<_> = item
        .variants
        .iter()
        .map(|v| {
            if !matches!(v.fields, Fields::Unit) {
                panic!(
                    "Enum can only be derived for fieldless enums, `{}` carries data",
                    v.ident
                );
            }
            let value = v.discriminant.as_ref().map_or(next, |(_, e)| discriminant(e));
            next = value.wrapping_add(1);
            (v.ident.clone(), LitStr::new(&v.ident.to_string(), v.span()), Literal::i64_suffixed(value))
        })
        .collect();
    let to_value = cases.iter().map(|(ident, case, value)| {
        quote!(#name::#ident => (#case, #value))
    });
    let by_value = cases
        .iter()
        .map(|(ident, _, value)| quote!(__v__ if __v__ == #value => Some(#name::#ident)));
    let by_name = cases
        .iter()
        .map(|(ident, case, _)| quote!(__v__ if __v__.eq_ignore_ascii_case(#case) => Some(#name::#ident)));
    quote! {
        impl ::phorm::AsValue for #name {
            fn as_empty_value() -> ::phorm::Value {
                ::phorm::Value::Enum(None)
            }
            fn as_value(self) -> ::phorm::Value {
                let (name, value) = match self {
                    #(#to_value,)*
                };
                ::phorm::Value::Enum(Some(::phorm::EnumValue {
                    type_name: #type_name,
                    name,
                    value,
                }))
            }
            fn try_from_value(value: ::phorm::Value) -> ::phorm::Result<Self> {
                let by_value = |v: i64| match v {
                    #(#by_value,)*
                    _ => None,
                };
                let by_name = |v: &str| match v.trim() {
                    #(#by_name,)*
                    _ => None,
                };
                let result = match &value {
                    ::phorm::Value::Enum(Some(v)) => by_value(v.value),
                    ::phorm::Value::Varchar(Some(v)) => by_name(v)
                        .or_else(|| v.trim().parse::<i64>().ok().and_then(by_value)),
                    v => v
                        .as_i128()
                        .and_then(|v| i64::try_from(v).ok())
                        .and_then(by_value),
                };
                result.ok_or_else(|| {
                    ::phorm::Error::msg(format!("Cannot convert {:?} to {}", value, #type_name))
                })
            }
        }
    }
}
