//! baladoc-lib: documentation build pipeline for bala artifacts
//!
//! This crate turns a bala locator into a documentation build:
//! - `fetch`: download the bala into a private workspace
//! - `archive`: read the compiler version from the embedded `package.json`
//! - `toolchain`: pick the installed distribution matching that version
//! - `process`: run `bal doc` against the downloaded bala
//! - `workspace`: allocate and always release per-request scratch space
//! - `pipeline`: sequence the steps into a single success/failure result

pub mod archive;
pub mod config;
pub mod consts;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod toolchain;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::BuildConfig;
pub use process::DocOutput;
pub use pipeline::{BuildFailure, BuildOutcome, BuildPipeline, BuildRequest, BuildSuccess, DocsPayload, FailureKind};
