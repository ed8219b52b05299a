mod document;

use proc_macro::TokenStream;

/// Derive macro for the `Document` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Document)]
/// #[document(collection = "stories")]
/// struct Story {
///     #[document(id)]
///     pub id: String,
///     pub title: String,
/// }
/// ```
///
/// - `#[document(collection = "...")]` sets the collection name.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[document(id)]` marks the field holding the document identifier.
///   If omitted, defaults to a field named `id`. The field must deref to `str`.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    document::derive_document(input)
}
