//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//

// Create a table in the NoSQL Database Cloud Service, write a row and read it
// back. With -drop, drop the table instead.
//
// To run this program:
//    cargo run -- <endpoint> [-drop]
//
// for extra output:
//    RUST_LOG=debug cargo run -- <endpoint>

use clap::Parser;
use nosql_cloud_quickstart::hello_world::{self, is_drop, USAGE};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "hello-world", about = "NoSQL cloud service hello world")]
struct Cli {
    /// Service endpoint, for example ndcs.uscom-east-1.oraclecloud.com
    #[arg(allow_hyphen_values = true)]
    endpoint: Option<String>,

    /// Pass -drop to drop the table instead of writing to it
    #[arg(allow_hyphen_values = true)]
    action: Option<String>,

    // anything after the first two arguments is ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    _ignored: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let endpoint = match cli.endpoint {
        Some(ep) if !ep.is_empty() => ep,
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
    };

    // Set up a tracing subscriber to see output based on RUST_LOG environment setting
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    match hello_world::run(&endpoint, is_drop(cli.action.as_deref())).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
