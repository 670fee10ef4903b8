use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields};

/// Derives the `Params` trait for a struct whose named fields are all
/// `Param` values, exposed in declaration order.
#[proc_macro_derive(Params)]
pub fn derive_params(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let struct_name = ast.ident;
    let fields = match ast.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => fields,
        _ => {
            return syn::Error::new(
                struct_name.span(),
                "Params requires a struct with named fields",
            )
            .to_compile_error()
            .into();
        }
    };

    let idents: Vec<_> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .collect();
    let len = idents.len();
    let indices = 0..len;

    quote! {
        impl Params for #struct_name {
            fn len(&self) -> usize {
                #len
            }

            fn get_param(&self, idx: usize) -> &crate::params::Param {
                match idx {
                    #(#indices => &self.#idents,)*
                    _ => unreachable!(),
                }
            }
        }
    }
    .into()
}
