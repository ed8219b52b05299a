use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr};

pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let collection = extract_collection(input)?;
    let id_field = extract_id_field(input)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics serial_press::Document for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &str {
                self.#id_field.as_ref()
            }
        }
    })
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("collection name must not be empty"));
                }
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `collection = \"...\"`"))
            }
        })?;

        if let Some(c) = collection {
            return Ok(c);
        }
    }

    let name = input.ident.to_string();
    Ok(format!("{}s", to_snake_case(&name)))
}

fn extract_id_field(input: &DeriveInput) -> syn::Result<Ident> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Document derive requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Document derive only supports structs",
            ))
        }
    };

    for field in &fields.named {
        for attr in &field.attrs {
            if !attr.path().is_ident("document") {
                continue;
            }
            let mut is_id = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `id`"))
                }
            })?;
            if is_id {
                if let Some(ident) = &field.ident {
                    return Ok(ident.clone());
                }
            }
        }
    }

    fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == "id")
        .cloned()
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Document derive: no field marked with #[document(id)] and no field named `id`",
            )
        })
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
