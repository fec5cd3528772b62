//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use std::process::Command;

#[test]
fn missing_endpoint_prints_usage() {
    let out = Command::new(env!("CARGO_BIN_EXE_hello-world"))
        .output()
        .expect("run hello-world");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage: hello-world <endpoint> [-drop]"), "{}", stderr);
    assert!(out.stdout.is_empty());
}

#[test]
fn unreachable_service_is_a_runtime_error() {
    let out = Command::new(env!("CARGO_BIN_EXE_hello-world"))
        .arg("http://127.0.0.1:9")
        .env("ORACLE_NOSQL_AUTH", "cloudsim")
        .env("ORACLE_NOSQL_TIMEOUT_MS", "2000")
        .output()
        .expect("run hello-world");
    assert_eq!(out.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Using endpoint"), "{}", stdout);
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}

#[test]
fn extra_arguments_are_ignored() {
    let out = Command::new(env!("CARGO_BIN_EXE_hello-world"))
        .args(["http://127.0.0.1:9", "-DROP", "extra", "--more"])
        .env("ORACLE_NOSQL_AUTH", "cloudsim")
        .env("ORACLE_NOSQL_TIMEOUT_MS", "2000")
        .output()
        .expect("run hello-world");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Dropping table HelloWorldTable"), "{}", stdout);
    assert!(!stdout.contains("Creating table"), "{}", stdout);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn hyphenated_endpoint_is_not_a_usage_error() {
    let out = Command::new(env!("CARGO_BIN_EXE_hello-world"))
        .arg("-drop")
        .env("ORACLE_NOSQL_AUTH", "cloudsim")
        .env("ORACLE_NOSQL_TIMEOUT_MS", "2000")
        .output()
        .expect("run hello-world");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error:"), "{}", stderr);
    assert!(!stderr.contains("unexpected argument"), "{}", stderr);
    assert!(!stderr.contains("Usage"), "{}", stderr);
}

#[test]
fn endpoint_is_shown_before_credentials_are_read() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("no-such-credentials");
    let out = Command::new(env!("CARGO_BIN_EXE_hello-world"))
        .arg("ndcs.uscom-east-1.oraclecloud.com")
        .env("ORACLE_NOSQL_AUTH", "idcs")
        .env("ORACLE_NOSQL_CREDENTIALS_FILE", &missing)
        .output()
        .expect("run hello-world");
    assert_eq!(out.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("Using endpoint: https://ndcs.uscom-east-1.oraclecloud.com:443"),
        "{}",
        stdout
    );
    assert!(!stdout.contains("Creating table"), "{}", stdout);
}
