// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # delegate-backends
//!
//! The hardware side of delegate selection: option structs, the provider
//! traits the selector is written against, platform probing, and concrete
//! providers.
//!
//! # Providers
//! | Trait | Implementations |
//! |---|---|
//! | [`GpuDelegateProvider`] | [`ReferenceGpuProvider`] |
//! | [`AcceleratorApiProvider`] | [`ReferenceAcceleratorApiProvider`] |
//! | [`SpecializedBackend`] | [`ReferenceDeviceBackend`], [`ExternalDelegateBackend`] |
//! | [`PlatformProbe`] | [`SysfsProbe`], [`StaticProbe`] |
//!
//! # Features
//! `opengl` / `opencl` pin the GPU delegate to one graphics API
//! ([`GraphicsApi::compiled`]). Enabling both fails the build.

mod error;
mod external;
mod options;
mod probe;
mod provider;
pub mod reference;

pub use error::BackendError;
pub use external::{
    CreateDelegateFn, DestroyDelegateFn, ErrorReporterFn, ExternalDelegateBackend, PluginEntryPoints,
    DEFAULT_TPU_LIBRARY,
};
pub use options::{
    AcceleratorApiOptions, GpuDelegateOptions, GpuExperimentalFlags, GraphicsApi,
    InferencePriority,
};
pub use probe::{GpuVendor, PlatformProbe, StaticProbe, SysfsProbe};
pub use provider::{
    AcceleratorApiProvider, BackendKind, GpuDelegateProvider, MarkerDelegate, SpecializedBackend,
    NPU_MARKER, TPU_MARKER,
};
pub use reference::{ReferenceAcceleratorApiProvider, ReferenceDeviceBackend, ReferenceGpuProvider};
