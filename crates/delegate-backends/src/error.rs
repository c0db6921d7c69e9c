// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for delegate construction.

/// Errors raised while constructing a delegate or opening its device.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend is not present on this platform.
    #[error("backend '{backend}' unavailable: {detail}")]
    Unavailable { backend: String, detail: String },

    /// A device context could not be opened.
    #[error("cannot open device context for '{device}': {detail}")]
    DeviceOpen { device: String, detail: String },

    /// An external delegate library could not be loaded.
    #[error("cannot load delegate library {path}: {source}")]
    LibraryLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },

    /// An external delegate library lacks a required entry point.
    #[error("delegate library {path} has no symbol '{symbol}': {source}")]
    MissingSymbol {
        path: String,
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
}
