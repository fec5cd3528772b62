//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
pub mod access_token_provider;
pub mod credentials_provider;
pub mod file_credentials_provider;
pub(crate) mod file_utils;
