//! Build script for kws-harness.
//!
//! With the `linked-engine` feature, links the library produced by the model
//! compiler (the object exporting `model_Predict`, `model_GetInputSize`, ...).
//! Without it there is nothing to do: the crate runs against `DummyEngine`.
//!
//! # Environment Variables
//!
//! - `KWS_MODEL_LIB_DIR`: Directory containing the compiled model library
//! - `KWS_MODEL_LIB`: Library name without prefix/suffix (default: "model")
//! - `KWS_MODEL_LINK_KIND`: "static" or "dylib" (default: "static")
//! - `KWS_MODEL_SKIP_LINK`: Set to "1" to skip linking (for development)

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=KWS_MODEL_LIB_DIR");
    println!("cargo:rerun-if-env-changed=KWS_MODEL_LIB");
    println!("cargo:rerun-if-env-changed=KWS_MODEL_LINK_KIND");
    println!("cargo:rerun-if-env-changed=KWS_MODEL_SKIP_LINK");

    if env::var_os("CARGO_FEATURE_LINKED_ENGINE").is_some() {
        link_model();
    }
}

fn link_model() {
    if env::var("KWS_MODEL_SKIP_LINK")
        .map(|v| v == "1")
        .unwrap_or(false)
    {
        println!("cargo:warning=Skipping model link (KWS_MODEL_SKIP_LINK=1)");
        return;
    }

    let lib_name = env::var("KWS_MODEL_LIB").unwrap_or_else(|_| "model".to_string());
    let kind = env::var("KWS_MODEL_LINK_KIND").unwrap_or_else(|_| "static".to_string());
    if kind != "static" && kind != "dylib" {
        panic!(
            "\n\
            \n\
            error: invalid KWS_MODEL_LINK_KIND={kind}\n\
            \n\
            Expected \"static\" or \"dylib\".\n"
        );
    }

    match env::var("KWS_MODEL_LIB_DIR") {
        Ok(dir) => {
            let dir = PathBuf::from(dir);
            if !dir.is_dir() {
                panic!(
                    "\n\
                    \n\
                    error: KWS_MODEL_LIB_DIR does not exist: {}\n\
                    \n\
                    Point it at the directory holding lib{lib_name} produced by the\n\
                    model compiler, or build without the linked-engine feature:\n\
                    \n\
                      cargo build --release\n",
                    dir.display()
                );
            }
            println!("cargo:rustc-link-search=native={}", dir.display());
            if kind == "dylib" {
                println!("cargo:rustc-link-arg=-Wl,-rpath,{}", dir.display());
            }
        }
        Err(_) => {
            println!(
                "cargo:warning=KWS_MODEL_LIB_DIR not set; relying on the default linker search path for lib{}",
                lib_name
            );
        }
    }

    println!("cargo:rustc-link-lib={}={}", kind, lib_name);
}
