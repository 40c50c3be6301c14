use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{
    Expr, Field, GenericArgument, Ident, LitInt, LitStr, PathArguments, Type, TypePath,
    parse::ParseBuffer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Association {
    Many,
    One,
}

pub(crate) struct ResultsetMetadata {
    pub(crate) order: usize,
    pub(crate) matcher: Option<Expr>,
    pub(crate) association: Association,
    /// Child type, extracted from `Vec<C>` or `Option<C>`.
    pub(crate) child: Type,
}

pub(crate) struct MemberMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) rename: Option<String>,
    pub(crate) ignore: bool,
    pub(crate) console: bool,
    pub(crate) required: bool,
    pub(crate) output: bool,
    pub(crate) return_value: bool,
    pub(crate) access: Access,
    pub(crate) size: Option<usize>,
    pub(crate) behaviors: Vec<TokenStream>,
    pub(crate) resultset: Option<ResultsetMetadata>,
}

impl MemberMetadata {
    /// Stored in the struct but not described as a member.
    pub(crate) fn is_skipped(&self) -> bool {
        self.ignore || self.resultset.is_some()
    }
}

fn generic_argument(ty: &Type, wrapper: &str) -> Option<Type> {
    let Type::Path(TypePath { path, .. }) = ty else {
        return None;
    };
    let last = path.segments.last()?;
    if last.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(v) => Some(v.clone()),
        _ => None,
    }
}

fn decode_resultset(arg: &syn::meta::ParseNestedMeta, ty: &Type) -> ResultsetMetadata {
    let (association, child) = if let Some(child) = generic_argument(ty, "Vec") {
        (Association::Many, child)
    } else if let Some(child) = generic_argument(ty, "Option") {
        (Association::One, child)
    } else {
        panic!(
            "A resultset member must be either `Vec<T>` or `Option<T>`, found `{}`",
            ty.to_token_stream()
        );
    };
    let mut result = ResultsetMetadata {
        order: 0,
        matcher: None,
        association,
        child,
    };
    let _ = arg.parse_nested_meta(|arg| {
        if arg.path.is_ident("order") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitInt>) else {
                panic!("Error while parsing `order`, use it like: `#[phorm(resultset(order = 1))]`");
            };
            let Ok(v) = v.base10_parse() else {
                panic!("Error while parsing `order`, it must be a non negative integer");
            };
            result.order = v;
        } else if arg.path.is_ident("matcher") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                panic!(
                    "Error while parsing `matcher`, use it like: `#[phorm(resultset(matcher = |p: &Parent, c: &Child| p.id == c.parent_id))]`"
                );
            };
            result.matcher = Some(v);
        } else {
            panic!(
                "Unknown attribute `{}` inside resultset",
                arg.path.to_token_stream()
            );
        }
        Ok(())
    });
    result
}

fn decode_secure(arg: &syn::meta::ParseNestedMeta) -> TokenStream {
    let mut classification = None;
    let mut authenticator = None;
    let _ = arg.parse_nested_meta(|arg| {
        if arg.path.is_ident("classification") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                panic!(
                    "Error while parsing `classification`, use it like: `#[phorm(secure(classification = \"pii\"))]`"
                );
            };
            classification = Some(v);
        } else if arg.path.is_ident("authenticator") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                panic!(
                    "Error while parsing `authenticator`, use it like: `#[phorm(secure(classification = \"pii\", authenticator = \"id\"))]`"
                );
            };
            authenticator = Some(v);
        } else {
            panic!("Unknown attribute `{}` inside secure", arg.path.to_token_stream());
        }
        Ok(())
    });
    let Some(classification) = classification else {
        panic!("A secure member requires a classification: `#[phorm(secure(classification = \"pii\"))]`");
    };
    match authenticator {
        Some(authenticator) => {
            quote!(::phorm::Behavior::secure_with(#classification, #authenticator))
        }
        None => quote!(::phorm::Behavior::secure(#classification)),
    }
}

fn require_flag(arg: &syn::meta::ParseNestedMeta, name: &str) {
    // value() is Err for Meta::Path
    let Err(..) = arg.value() else {
        panic!("Error while parsing `{name}`, use it like: `#[phorm({name})]`");
    };
}

pub(crate) fn decode_member(field: &Field) -> MemberMetadata {
    let ident = field
        .ident
        .clone()
        .expect("Field is expected to have a name");
    let mut metadata = MemberMetadata {
        ident,
        ty: field.ty.clone(),
        rename: None,
        ignore: false,
        console: false,
        required: false,
        output: false,
        return_value: false,
        access: Access::ReadWrite,
        size: None,
        behaviors: Vec::new(),
        resultset: None,
    };
    for attr in &field.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("phorm") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `phorm`, use it like: `#[phorm(attribute = value, ...)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("rename") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `rename`, use it like: `#[phorm(rename = \"my_column\")]`");
                };
                metadata.rename = Some(v.value());
            } else if arg.path.is_ident("ignore") {
                require_flag(&arg, "ignore");
                metadata.ignore = true;
            } else if arg.path.is_ident("console") {
                require_flag(&arg, "console");
                metadata.console = true;
            } else if arg.path.is_ident("required") {
                require_flag(&arg, "required");
                metadata.required = true;
            } else if arg.path.is_ident("output") {
                require_flag(&arg, "output");
                metadata.output = true;
            } else if arg.path.is_ident("return_value") {
                require_flag(&arg, "return_value");
                metadata.return_value = true;
            } else if arg.path.is_ident("read_only") {
                require_flag(&arg, "read_only");
                metadata.access = Access::ReadOnly;
            } else if arg.path.is_ident("write_only") {
                require_flag(&arg, "write_only");
                metadata.access = Access::WriteOnly;
            } else if arg.path.is_ident("size") {
                let Ok(v) = arg
                    .value()
                    .and_then(ParseBuffer::parse::<LitInt>)
                    .and_then(|v| v.base10_parse::<usize>())
                else {
                    panic!("Error while parsing `size`, use it like: `#[phorm(size = 50)]`");
                };
                metadata.size = Some(v);
            } else if arg.path.is_ident("secure") {
                metadata.behaviors.push(decode_secure(&arg));
            } else if arg.path.is_ident("transform") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                    panic!("Error while parsing `transform`, use it like: `#[phorm(transform = MyTransform)]`");
                };
                metadata
                    .behaviors
                    .push(quote!(::phorm::Behavior::transform(#v)));
            } else if arg.path.is_ident("enum_as_string") {
                require_flag(&arg, "enum_as_string");
                metadata
                    .behaviors
                    .push(quote!(::phorm::Behavior::EnumAsString));
            } else if arg.path.is_ident("resultset") {
                metadata.resultset = Some(decode_resultset(&arg, &field.ty));
            } else {
                panic!(
                    "Unknown attribute `{}` inside phorm macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    metadata
}
