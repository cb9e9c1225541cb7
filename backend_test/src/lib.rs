use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one running against a
/// fresh in-memory server, and inject dependencies.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// [`crate::VotingEngine`] and [`crate::model::election::ElectionStore`], all
/// sharing the same state. The server starts with the demo election unless
/// the test is marked `#[backend_test(empty)]`.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the parameters to inject and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Decide whether to seed the demo election.
    let demo_election = match parse_macro_input!(args as Option<Ident>) {
        None => true,
        Some(arg) if arg == "empty" => false,
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `empty` or no argument")
                .into_compile_error()
                .into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, crate::VotingEngine) {
                let engine = crate::test_engine(#demo_election);
                let rocket = crate::rocket_for_engine(engine.clone(), crate::ledger::Ledger::disabled());
                let rocket_client = rocket::local::asynchronous::Client::tracked(rocket)
                    .await
                    .unwrap();
                (rocket_client, engine)
            }

            /// The test itself.
            #item_fn

            // Create an async runtime. The engine is synchronous, so every
            // dependency lives on this one runtime.
            let runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let (rocket_client, engine) = setup().await;
                let store = engine.store().clone();
                let _ = (&rocket_client, &store);
                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, extract parameters to inject, and reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_engine = false;
    let mut has_store = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    if let Some(type_ident) = type_path.path.segments.last().map(|s| &s.ident) {
                        let (seen, arg, what) = if type_ident == "Client" {
                            (
                                &mut has_client,
                                quote! { rocket_client },
                                "rocket::local::asynchronous::Client",
                            )
                        } else if type_ident == "VotingEngine" {
                            (&mut has_engine, quote! { engine.clone() }, "VotingEngine")
                        } else if type_ident == "ElectionStore" {
                            (&mut has_store, quote! { store.clone() }, "ElectionStore")
                        } else {
                            return Err(unexpected(input));
                        };
                        if *seen {
                            return Err(syn::Error::new(
                                input.span(),
                                format!("Test cannot accept more than one `{what}`"),
                            ));
                        }
                        *seen = true;
                        args.push(arg);
                        continue;
                    }
                }
            }
        }

        return Err(unexpected(input));
    }

    Ok(args)
}

fn unexpected(input: &FnArg) -> syn::Error {
    syn::Error::new(
        input.span(),
        "Expected one of `client_ident: Client`, `engine_ident: VotingEngine` or `store_ident: ElectionStore`",
    )
}
