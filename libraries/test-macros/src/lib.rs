//! Proc-macro companion to `test-types`.
//!
//! `#[kernel_test]` turns an ordinary `fn()` into a `#[test_case]` static of
//! type `test_types::UnitTest`, which is what `custom_test_frameworks`
//! collects into the array handed to the crate's `test_runner`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, ItemFn};

#[proc_macro_attribute]
pub fn kernel_test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let func_name = &func.sig.ident;
    let test_name = func_name.to_string();
    let static_name = format_ident!("__UNIT_TEST_{}", func_name.to_string().to_uppercase());

    let expanded = quote! {
        #[test_case]
        static #static_name: test_types::UnitTest = test_types::UnitTest {
            name: #test_name,
            test_func: #func_name,
        };

        #func
    };

    expanded.into()
}
