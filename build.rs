//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
fn main() {
    // Stamp the crate version and an http User-Agent into the build
    let out_dir = std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR");
    let version = env!("CARGO_PKG_VERSION");
    let rustc = rustc_version::version()
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let ua = format!(
        "NoSQL-Quickstart/{} (rust{}; {}/{})",
        version,
        rustc,
        std::env::consts::ARCH,
        std::env::consts::OS
    );
    let code = format!(
        "const USER_AGENT: &str = \"{}\";\nconst CRATE_VERSION: &str = \"{}\";\n",
        ua, version
    );
    let dest_path = std::path::Path::new(&out_dir).join("ua.rs");
    std::fs::write(&dest_path, &code).expect("cannot write ua.rs");
    println!("cargo::rerun-if-changed=build.rs");
}
