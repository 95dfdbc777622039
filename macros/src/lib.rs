use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn};

/// Test attribute used across `rxcast`.
///
/// - `#[rxcast_macro::test]` on a sync fn expands to `#[test]`.
/// - On an async fn it expands to `#[tokio::test]`, `#[rxcast_macro::test(shared)]` selects the
///   multi-threaded runtime.
/// - `#[rxcast_macro::test(virtual_time)]` resets the thread-local virtual clock before the body
///   runs, so the test starts at tick zero with an empty queue.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let mut tokio_args = proc_macro2::TokenStream::new();
  if !raw_args.is_empty() {
    let ident = match syn::parse2::<Ident>(raw_args.clone()) {
      Ok(ident) => ident,
      Err(_) => {
        return syn::Error::new(
          raw_args.span(),
          "rxcast_macro::test only accepts: #[rxcast_macro::test], \
           #[rxcast_macro::test(local)], #[rxcast_macro::test(shared)] or \
           #[rxcast_macro::test(virtual_time)]",
        )
        .to_compile_error()
        .into();
      }
    };
    match ident.to_string().as_str() {
      "local" if is_async => tokio_args = quote!(flavor = "current_thread"),
      "shared" if is_async => tokio_args = quote!(flavor = "multi_thread"),
      "virtual_time" if !is_async => {
        let body = &input.block;
        input.block = syn::parse_quote!({
          ::rxcast::scheduler::TestScheduler::init();
          #body
        });
      }
      _ => {
        return syn::Error::new(
          ident.span(),
          "runtime flavors need an async fn, `virtual_time` needs a sync fn",
        )
        .to_compile_error()
        .into();
      }
    }
  }

  let expanded = if is_async {
    quote! {
      #[tokio::test(#tokio_args)]
      #input
    }
  } else {
    quote! {
      #[test]
      #input
    }
  };

  TokenStream::from(expanded)
}
