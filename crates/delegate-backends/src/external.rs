// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Specialized backends shipped as external delegate plugins.
//!
//! The TPU runtime is a shared library exporting the plugin entry points
//! `tflite_plugin_create_delegate` / `tflite_plugin_destroy_delegate`.
//! Opening the backend loads the library from a fixed path and resolves
//! the entry points; the library and the resolved pointers are held until
//! release. This crate never calls the entry points itself: graph-side
//! partitioning goes through a [`MarkerDelegate`] over the backend's custom
//! op marker, and the pointers are exposed through
//! [`ExternalDelegateBackend::entry_points`] for a host runtime that owns
//! the native delegate.

use crate::{BackendError, BackendKind, MarkerDelegate, SpecializedBackend};
use graph_ir::Delegate;
use libloading::Library;
use std::ffi::{c_char, c_void};
use std::path::{Path, PathBuf};

/// Where the TPU delegate plugin is installed.
pub const DEFAULT_TPU_LIBRARY: &str = "/usr/lib/libedgetpu.so.1";

const CREATE_SYMBOL: &str = "tflite_plugin_create_delegate";
const DESTROY_SYMBOL: &str = "tflite_plugin_destroy_delegate";

pub type ErrorReporterFn = unsafe extern "C" fn(*const c_char);
pub type CreateDelegateFn = unsafe extern "C" fn(
    *const *const c_char,
    *const *const c_char,
    usize,
    Option<ErrorReporterFn>,
) -> *mut c_void;
pub type DestroyDelegateFn = unsafe extern "C" fn(*mut c_void);

/// Entry points resolved from a loaded plugin. Valid only while the
/// owning backend stays open.
#[derive(Debug, Clone, Copy)]
pub struct PluginEntryPoints {
    pub create: CreateDelegateFn,
    pub destroy: DestroyDelegateFn,
}

#[derive(Debug)]
struct LoadedPlugin {
    entry_points: PluginEntryPoints,
    // Must outlive `entry_points`.
    _library: Library,
}

/// A specialized backend loaded from a delegate plugin library.
#[derive(Debug)]
pub struct ExternalDelegateBackend {
    kind: BackendKind,
    path: PathBuf,
    plugin: Option<LoadedPlugin>,
}

impl ExternalDelegateBackend {
    pub fn new(kind: BackendKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            plugin: None,
        }
    }

    /// The TPU plugin at [`DEFAULT_TPU_LIBRARY`].
    pub fn tpu() -> Self {
        Self::new(BackendKind::Tpu, DEFAULT_TPU_LIBRARY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The plugin entry points, while the backend is open.
    pub fn entry_points(&self) -> Option<&PluginEntryPoints> {
        self.plugin.as_ref().map(|p| &p.entry_points)
    }

    fn load(&self) -> Result<LoadedPlugin, BackendError> {
        let path = self.path.display().to_string();
        // SAFETY: loading runs the library's initialisers; the path is a
        // fixed, installed delegate plugin.
        let library = unsafe { Library::new(&self.path) }.map_err(|source| BackendError::LibraryLoad {
            path: path.clone(),
            source,
        })?;
        // SAFETY: the declared types match the plugin ABI. The copied
        // pointers are stored next to the library and dropped with it.
        let entry_points = unsafe {
            let create = *library
                .get::<CreateDelegateFn>(CREATE_SYMBOL.as_bytes())
                .map_err(|source| BackendError::MissingSymbol {
                    path: path.clone(),
                    symbol: CREATE_SYMBOL,
                    source,
                })?;
            let destroy = *library
                .get::<DestroyDelegateFn>(DESTROY_SYMBOL.as_bytes())
                .map_err(|source| BackendError::MissingSymbol {
                    path,
                    symbol: DESTROY_SYMBOL,
                    source,
                })?;
            PluginEntryPoints { create, destroy }
        };
        Ok(LoadedPlugin {
            entry_points,
            _library: library,
        })
    }
}

impl SpecializedBackend for ExternalDelegateBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn open(&mut self) -> Result<Box<dyn Delegate>, BackendError> {
        self.release();
        let plugin = self.load()?;
        tracing::info!("loaded {} delegate plugin {}", self.kind, self.path.display());
        self.plugin = Some(plugin);
        Ok(Box::new(MarkerDelegate::new(
            format!("{}-external", self.kind),
            self.kind.marker(),
        )))
    }

    fn release(&mut self) {
        if self.plugin.take().is_some() {
            tracing::debug!("unloaded {} delegate plugin", self.kind);
        }
    }

    fn is_open(&self) -> bool {
        self.plugin.is_some()
    }
}
