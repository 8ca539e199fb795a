//! Errors surfaced verbatim from the GPU backend (spec §7, `BackendError`).

use thiserror::Error;

/// Errors a [`super::GpuBackend`] implementation may return. Propagated
/// verbatim by the graph's Compile/Execute phases; `DeviceLost` is
/// additionally elevated to a `DeviceInvalidated` event by the caller
/// (spec §7).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("device lost")]
    DeviceLost,
    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfDeviceMemory { requested: u64, available: u64 },
    #[error("out of host memory")]
    OutOfHostMemory,
    #[error("invalid handle {0}")]
    InvalidHandle(u64),
    #[error("timeline semaphore wait timed out after {0} ns")]
    WaitTimeout(u64),
    #[error("swap chain out of date")]
    SwapChainOutOfDate,
    #[error("{0}")]
    Other(String),
}
