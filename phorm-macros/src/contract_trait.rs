use crate::{
    decode_contract::ContractMetadata,
    decode_member::{Access, Association, MemberMetadata},
    default_factory::default_factory,
};
use proc_macro2::TokenStream;
use quote::quote;
use syn::LitStr;

fn ident_str(member: &MemberMetadata) -> LitStr {
    LitStr::new(&member.ident.to_string(), member.ident.span())
}

fn member_info(contract: &ContractMetadata, member: &MemberMetadata) -> TokenStream {
    let ident = ident_str(member);
    if member.ignore {
        return quote!(::phorm::MemberInfo::opaque(#ident).with(::phorm::MemberAttribute::Ignore));
    }
    if member.console {
        return quote!(::phorm::MemberInfo::opaque(#ident).with(::phorm::MemberAttribute::Console));
    }
    let ty = &member.ty;
    let mut result = quote!(::phorm::MemberInfo::field::<#ty>(#ident));
    match member.access {
        Access::ReadWrite => {}
        Access::ReadOnly => result = quote!(#result.read_only()),
        Access::WriteOnly => result = quote!(#result.write_only()),
    }
    if let Some(db_name) = contract.db_name(member) {
        result = quote!(#result.with(::phorm::MemberAttribute::Rename(#db_name)));
    }
    if member.required {
        result = quote!(#result.with(::phorm::MemberAttribute::Required));
    }
    if member.output {
        result = quote!(#result.with(::phorm::MemberAttribute::Output));
    }
    if member.return_value {
        result = quote!(#result.with(::phorm::MemberAttribute::ReturnValue));
    }
    if let Some(size) = member.size {
        result = quote!(#result.with(::phorm::MemberAttribute::Size(#size)));
    }
    for behavior in &member.behaviors {
        result = quote!(#result.with(::phorm::MemberAttribute::Behavior(#behavior)));
    }
    result
}

fn resultset(contract: &ContractMetadata, member: &MemberMetadata) -> Option<TokenStream> {
    let metadata = member.resultset.as_ref()?;
    let struct_name = &contract.item.ident;
    let field = &member.ident;
    let ident = ident_str(member);
    let order = metadata.order;
    let child = &metadata.child;
    let matcher = metadata
        .matcher
        .as_ref()
        .map_or_else(|| quote!(::phorm::MatchAll), |v| quote!(#v));
    Some(match metadata.association {
        Association::Many => quote! {
            ::phorm::ResultsetDef::many::<#struct_name, #child, _>(
                #order,
                #ident,
                #matcher,
                |parent: &mut #struct_name, children: Vec<#child>| parent.#field = children,
            )
        },
        Association::One => quote! {
            ::phorm::ResultsetDef::one::<#struct_name, #child, _>(
                #order,
                #ident,
                #matcher,
                |parent: &mut #struct_name, child: #child| parent.#field = Some(child),
            )
        },
    })
}

pub(crate) fn contract_trait(contract: &ContractMetadata) -> TokenStream {
    let item = &contract.item;
    let struct_name = &item.ident;
    let name = &contract.name;
    let members = contract.members.iter().filter(|v| v.resultset.is_none());
    let data_members = || {
        contract
            .members
            .iter()
            .filter(|v| !v.is_skipped() && !v.console)
    };

    let member_infos = members.map(|v| member_info(contract, v));
    let calculated_infos = contract.calculated.iter().map(|v| {
        let ty = &v.ty;
        let ident = LitStr::new(&v.ident.to_string(), v.ident.span());
        match contract.case_name(&v.ident) {
            Some(db_name) => quote! {
                ::phorm::MemberInfo::calculated::<#ty>(#ident)
                    .with(::phorm::MemberAttribute::Rename(#db_name))
            },
            None => quote!(::phorm::MemberInfo::calculated::<#ty>(#ident)),
        }
    });
    let record = contract.record.then(|| {
        let params = data_members().map(ident_str);
        quote!(.record([#(#params),*]))
    });
    let is_abstract = contract.is_abstract.then(|| quote!(.abstract_type()));
    let spec_of = contract.spec_of.as_ref().map(|v| {
        let member = &v.member;
        let value = &v.value;
        quote!(.spec_of(#member, #value))
    });
    let resultsets = contract
        .members
        .iter()
        .filter_map(|v| resultset(contract, v));

    let getters = data_members()
        .filter(|v| v.access != Access::WriteOnly)
        .map(|v| {
            let ident = ident_str(v);
            let field = &v.ident;
            quote!(#ident => Some(::phorm::AsValue::as_value(::std::clone::Clone::clone(&self.#field))))
        })
        .chain(contract.calculated.iter().map(|v| {
            let ident = LitStr::new(&v.ident.to_string(), v.ident.span());
            let method = &v.ident;
            quote!(#ident => Some(::phorm::AsValue::as_value(self.#method())))
        }));
    let setters: Vec<_> = data_members()
        .filter(|v| v.access != Access::ReadOnly)
        .map(|v| {
            let ident = ident_str(v);
            let field = &v.ident;
            let ty = &v.ty;
            quote!(#ident => self.#field = <#ty as ::phorm::AsValue>::try_from_value(value)?)
        })
        .collect();
    let set_member = if setters.is_empty() {
        quote! {
            fn set_member(&mut self, ident: &str, _value: ::phorm::Value) -> ::phorm::Result<()> {
                Err(::phorm::unknown_member(#name, ident))
            }
        }
    } else {
        quote! {
            fn set_member(&mut self, ident: &str, value: ::phorm::Value) -> ::phorm::Result<()> {
                match ident {
                    #(#setters,)*
                    _ => return Err(::phorm::unknown_member(#name, ident)),
                }
                Ok(())
            }
        }
    };

    let (factory, create_default) = default_factory(contract);
    let create_record = contract.record.then(|| {
        let assignments = item.fields.iter().filter_map(|field| {
            let ident = field.ident.as_ref()?;
            let ty = &field.ty;
            let member = contract.members.iter().find(|v| v.ident == *ident)?;
            Some(if member.is_skipped() || member.console {
                quote!(#ident: ::std::default::Default::default())
            } else {
                quote! {
                    #ident: <#ty as ::phorm::AsValue>::try_from_value(
                        __values__.next().unwrap_or_default()
                    )?
                }
            })
        });
        quote! {
            fn create_record(values: Vec<::phorm::Value>) -> ::phorm::Result<Self> {
                let mut __values__ = values.into_iter();
                Ok(Self {
                    #(#assignments,)*
                })
            }
        }
    });

    quote! {
        #factory
        impl ::phorm::Contract for #struct_name {
            fn describe() -> ::phorm::TypeDescription {
                ::phorm::TypeDescription::new(#name)
                    #(.member(#member_infos))*
                    #(.member(#calculated_infos))*
                    #record
                    #is_abstract
                    #spec_of
                    #(.resultset(#resultsets))*
            }
            fn get_member(&self, ident: &str) -> Option<::phorm::Value> {
                match ident {
                    #(#getters,)*
                    _ => None,
                }
            }
            #set_member
            fn create_default() -> Option<Self> {
                #create_default
            }
            #create_record
        }
    }
}
