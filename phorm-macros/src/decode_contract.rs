use crate::decode_member::{MemberMetadata, decode_member};
use convert_case::{Case, Casing};
use quote::ToTokens;
use syn::{Expr, Fields, Ident, ItemStruct, LitStr, Type, parse::ParseBuffer};

pub(crate) struct CalculatedMetadata {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
}

pub(crate) struct SpecOfMetadata {
    pub(crate) member: String,
    pub(crate) value: Expr,
}

pub(crate) struct ContractMetadata {
    pub(crate) item: ItemStruct,
    pub(crate) name: String,
    pub(crate) rename_all: Option<Case>,
    pub(crate) members: Vec<MemberMetadata>,
    pub(crate) calculated: Vec<CalculatedMetadata>,
    pub(crate) record: bool,
    pub(crate) is_abstract: bool,
    pub(crate) spec_of: Option<SpecOfMetadata>,
}

impl ContractMetadata {
    /// Name on the wire of `member`, `None` when it is the identifier itself.
    pub(crate) fn db_name(&self, member: &MemberMetadata) -> Option<String> {
        if let Some(rename) = &member.rename {
            return Some(rename.clone());
        }
        self.case_name(&member.ident)
    }

    /// `ident` converted by `rename_all`, `None` when unchanged.
    pub(crate) fn case_name(&self, ident: &Ident) -> Option<String> {
        let ident = ident.to_string();
        let renamed = self.rename_all.map(|case| ident.to_case(case))?;
        (renamed != ident).then_some(renamed)
    }
}

fn decode_case(value: &str) -> Case {
    match value {
        "snake_case" => Case::Snake,
        "camelCase" => Case::Camel,
        "PascalCase" => Case::Pascal,
        "SCREAMING_SNAKE_CASE" => Case::UpperSnake,
        "kebab-case" => Case::Kebab,
        "lowercase" => Case::Flat,
        "UPPERCASE" => Case::UpperFlat,
        _ => panic!(
            "Unknown case `{value}`, use one of: snake_case, camelCase, PascalCase, SCREAMING_SNAKE_CASE, kebab-case, lowercase, UPPERCASE"
        ),
    }
}

fn decode_calculated(arg: &syn::meta::ParseNestedMeta) -> CalculatedMetadata {
    let mut name = None;
    let mut ty = None;
    let _ = arg.parse_nested_meta(|arg| {
        if arg.path.is_ident("name") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                panic!(
                    "Error while parsing `name`, use it like: `#[phorm(calculated(name = \"full_name\", ty = \"String\"))]`"
                );
            };
            name = Some(Ident::new(&v.value(), v.span()));
        } else if arg.path.is_ident("ty") {
            let Ok(v) = arg
                .value()
                .and_then(ParseBuffer::parse::<LitStr>)
                .and_then(|v| v.parse::<Type>())
            else {
                panic!(
                    "Error while parsing `ty`, use it like: `#[phorm(calculated(name = \"full_name\", ty = \"String\"))]`"
                );
            };
            ty = Some(v);
        } else {
            panic!(
                "Unknown attribute `{}` inside calculated",
                arg.path.to_token_stream()
            );
        }
        Ok(())
    });
    let (Some(ident), Some(ty)) = (name, ty) else {
        panic!("A calculated member requires both `name` and `ty`");
    };
    CalculatedMetadata { ident, ty }
}

fn decode_spec_of(arg: &syn::meta::ParseNestedMeta) -> SpecOfMetadata {
    let mut member = None;
    let mut value = None;
    let _ = arg.parse_nested_meta(|arg| {
        if arg.path.is_ident("member") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                panic!(
                    "Error while parsing `member`, use it like: `#[phorm(spec_of(member = \"kind\", value = 1))]`"
                );
            };
            member = Some(v.value());
        } else if arg.path.is_ident("value") {
            let Ok(v) = arg.value().and_then(ParseBuffer::parse::<Expr>) else {
                panic!(
                    "Error while parsing `value`, use it like: `#[phorm(spec_of(member = \"kind\", value = 1))]`"
                );
            };
            value = Some(v);
        } else {
            panic!(
                "Unknown attribute `{}` inside spec_of",
                arg.path.to_token_stream()
            );
        }
        Ok(())
    });
    let (Some(member), Some(value)) = (member, value) else {
        panic!("`spec_of` requires both `member` and `value`");
    };
    SpecOfMetadata { member, value }
}

pub(crate) fn decode_contract(item: ItemStruct) -> ContractMetadata {
    let Fields::Named(fields) = &item.fields else {
        panic!("Contract can only be derived for structs with named fields");
    };
    let members = fields.named.iter().map(decode_member).collect();
    let mut name = item.ident.to_string();
    let mut rename_all = None;
    let mut calculated = Vec::new();
    let mut record = false;
    let mut is_abstract = false;
    let mut spec_of = None;
    for attr in &item.attrs {
        let meta = &attr.meta;
        if !meta.path().is_ident("phorm") {
            continue;
        }
        let Ok(list) = meta.require_list() else {
            panic!("Error while parsing `phorm`, use it like: `#[phorm(attribute = value, ..)]`");
        };
        let _ = list.parse_nested_meta(|arg| {
            if arg.path.is_ident("name") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!("Error while parsing `name`, use it like: `#[phorm(name = \"Customer\")]`");
                };
                name = v.value();
            } else if arg.path.is_ident("rename_all") {
                let Ok(v) = arg.value().and_then(ParseBuffer::parse::<LitStr>) else {
                    panic!(
                        "Error while parsing `rename_all`, use it like: `#[phorm(rename_all = \"camelCase\")]`"
                    );
                };
                rename_all = Some(decode_case(&v.value()));
            } else if arg.path.is_ident("record") {
                record = true;
            } else if arg.path.is_ident("abstract_type") {
                is_abstract = true;
            } else if arg.path.is_ident("spec_of") {
                if spec_of.is_some() {
                    panic!("`spec_of` can appear just once on a contract");
                }
                spec_of = Some(decode_spec_of(&arg));
            } else if arg.path.is_ident("calculated") {
                calculated.push(decode_calculated(&arg));
            } else {
                panic!(
                    "Unknown attribute `{}` inside phorm macro",
                    arg.path.to_token_stream()
                );
            }
            Ok(())
        });
    }
    ContractMetadata {
        item,
        name,
        rename_all,
        members,
        calculated,
        record,
        is_abstract,
        spec_of,
    }
}
