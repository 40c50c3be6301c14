use crate::decode_contract::ContractMetadata;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, spanned::Spanned};

/// Zero argument construction when the struct implements `Default`, nothing otherwise.
///
/// The inherent `create_default` applies only when `T: Default`, for any other `T` the call
/// resolves to the trait one.
pub(crate) fn default_factory(contract: &ContractMetadata) -> (TokenStream, TokenStream) {
    let item = &contract.item;
    let struct_name = &item.ident;
    let trait_name = Ident::new(&format!("{}DefaultTrait", item.ident), item.span());
    let factory_name = Ident::new(&format!("{}DefaultFactory", item.ident), item.span());
    (
        quote! {
            trait #trait_name {
                fn create_default() -> Option<#struct_name>;
            }
            struct #factory_name<T>(::std::marker::PhantomData<T>);
            impl<T: Default + Into<#struct_name>> #factory_name<T> {
                // Called when T has Default Trait
                fn create_default() -> Option<#struct_name> {
                    Some(T::default().into())
                }
            }
            impl<T> #trait_name for #factory_name<T> {
                // Called when T doesn't have default trait
                fn create_default() -> Option<#struct_name> {
                    None
                }
            }
        },
        quote!(#factory_name::<#struct_name>::create_default()),
    )
}
