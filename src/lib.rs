//! # pcb-release-action
//!
//! Release orchestration for `.zen` board definitions in CI.
//!
//! The heavy lifting (building and versioning release archives) is done by
//! the external `pcb` tool. This crate resolves user-supplied paths to board
//! files, runs `pcb release` on each, validates and collects the resulting
//! archives, and exposes step outputs for GitHub Actions.
//!
//! ## Usage
//!
//! ```bash
//! pcb-release-action release --path boards/Widget        # one target, abort on failure
//! pcb-release-action batch --paths 'boards/A,boards/B'   # many targets, report failures at the end
//! pcb-release-action sync-workflows --merge-passing      # update the release workflow across repos
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod artifacts;
pub mod cli;
pub mod error;
pub mod outputs;
pub mod release;
pub mod source;
pub mod sync;
pub mod tool;

pub use artifacts::{ArtifactCollector, CollectedArtifact};
pub use cli::Args;
pub use error::{ReleaseError, Result};
pub use outputs::ActionOutputs;
pub use release::{BatchReport, ReleaseContext, TargetFailure};
pub use source::{Target, normalize_paths};
pub use tool::{PcbTool, ReleasePayload};
