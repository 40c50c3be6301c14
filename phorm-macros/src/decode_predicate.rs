use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{BinOp, Expr, ExprPath, LitStr, Path, UnOp, spanned::Spanned};

fn is_none(expr: &Expr) -> bool {
    matches!(expr, Expr::Path(ExprPath { path, .. }) if path.is_ident("None"))
}

/// `Entity::member`: at least two segments, the last one in snake case.
fn column_path(path: &Path) -> Option<(Path, String)> {
    if path.segments.len() < 2 {
        return None;
    }
    let member = path.segments.last()?.ident.to_string();
    if !member.starts_with(|c: char| c.is_lowercase() || c == '_') {
        return None;
    }
    let mut owner = path.clone();
    owner.segments.pop();
    // Drop the trailing separator left by pop
    let owner_segments = owner.segments.into_pairs().map(|v| v.into_value()).collect();
    owner.segments = owner_segments;
    Some((owner, member))
}

fn unsupported(expr: &Expr, kind: &str) -> TokenStream {
    let reason = LitStr::new(
        &format!("{kind} `{}` cannot be evaluated over a row", expr.to_token_stream()),
        expr.span(),
    );
    quote!(::phorm::Predicate::unsupported(#reason))
}

pub fn decode_predicate(condition: &Expr) -> TokenStream {
    match condition {
        Expr::Binary(v) => {
            let lhs = decode_predicate(&v.left);
            if is_none(&v.right) {
                match v.op {
                    BinOp::Eq(..) => return quote!((#lhs).is_null()),
                    BinOp::Ne(..) => return quote!((#lhs).is_not_null()),
                    _ => {}
                }
            }
            let op = match v.op {
                BinOp::Add(..) => quote! { ::phorm::BinaryOpType::Addition },
                BinOp::Sub(..) => quote! { ::phorm::BinaryOpType::Subtraction },
                BinOp::Mul(..) => quote! { ::phorm::BinaryOpType::Multiplication },
                BinOp::Div(..) => quote! { ::phorm::BinaryOpType::Division },
                BinOp::Rem(..) => quote! { ::phorm::BinaryOpType::Remainder },
                BinOp::And(..) => quote! { ::phorm::BinaryOpType::And },
                BinOp::Or(..) => quote! { ::phorm::BinaryOpType::Or },
                BinOp::Eq(..) => quote! { ::phorm::BinaryOpType::Equal },
                BinOp::Ne(..) => quote! { ::phorm::BinaryOpType::NotEqual },
                BinOp::Lt(..) => quote! { ::phorm::BinaryOpType::Less },
                BinOp::Le(..) => quote! { ::phorm::BinaryOpType::LessEqual },
                BinOp::Ge(..) => quote! { ::phorm::BinaryOpType::GreaterEqual },
                BinOp::Gt(..) => quote! { ::phorm::BinaryOpType::Greater },
                _ => return unsupported(condition, "Operator"),
            };
            let rhs = decode_predicate(&v.right);
            quote!((#lhs).operation(#op, #rhs))
        }
        Expr::Unary(v) => match v.op {
            UnOp::Not(..) => {
                let v = decode_predicate(&v.expr);
                quote!(!(#v))
            }
            UnOp::Neg(..) => {
                let v = decode_predicate(&v.expr);
                quote!(-(#v))
            }
            _ => quote!(::phorm::Predicate::value(#condition)),
        },
        Expr::Paren(v) => decode_predicate(&v.expr),
        Expr::Group(v) => decode_predicate(&v.expr),
        Expr::Path(ExprPath { path, .. }) => {
            if let Some((owner, member)) = column_path(path) {
                let member = LitStr::new(&member, path.span());
                quote!(::phorm::Predicate::column::<#owner>(#member))
            } else if is_none(condition) {
                quote!(::phorm::Predicate::value(::phorm::Value::Null))
            } else {
                quote!(::phorm::Predicate::value(#path))
            }
        }
        Expr::Lit(..) | Expr::Field(..) | Expr::Cast(..) => {
            quote!(::phorm::Predicate::value(#condition))
        }
        Expr::MethodCall(..) => unsupported(condition, "Method call"),
        Expr::Call(..) => unsupported(condition, "Function call"),
        Expr::Index(..) => unsupported(condition, "Indexing"),
        Expr::Closure(..) => unsupported(condition, "Closure"),
        _ => unsupported(condition, "Expression"),
    }
}
