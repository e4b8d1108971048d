//! # Reconcile
//!
//! Find resources that exist in a live system but are not declared in any
//! local manifest.
//!
//! ## Pipeline
//!
//! - **Source**: where raw YAML streams come from ([`ManifestFile`] on disk,
//!   or the standard output of a [`CommandSource`])
//! - **Normalize**: split a stream into documents, unwrap `List` kinds and
//!   drop empty documents
//! - **Aggregate**: run every source of one side concurrently and merge
//!   their resources
//! - **Reconcile**: report observed resources whose identity is not declared,
//!   minus excluded kinds
//!
//! ## Example
//!
//! ```no_run
//! use reconcile::{
//!     CommandSource, CommandSpec, ExclusionPolicy, BoxedSource, aggregate, local_sources,
//!     untracked,
//! };
//! use std::path::Path;
//!
//! let declared = aggregate(&local_sources(Path::new("manifests"))?)?;
//!
//! let live: Vec<BoxedSource> = vec![Box::new(CommandSource::new(CommandSpec::new(
//!     "kubectl",
//!     ["get", "deploy,cm", "-A", "-o", "yaml"],
//! )))];
//! let observed = aggregate(&live)?;
//!
//! for resource in untracked(&declared, &observed, &ExclusionPolicy::new(["Event"])) {
//!     println!("{}", resource.id());
//! }
//! # Ok::<(), reconcile::Error>(())
//! ```

pub mod aggregate;
mod error;
pub mod normalize;
pub mod reconcile;
pub mod resource;
pub mod source;

pub use aggregate::{aggregate, load_source};
pub use error::{Error, Result};
pub use normalize::{decode_documents, normalize};
pub use reconcile::{ExclusionPolicy, untracked};
pub use resource::{LIST_KIND, Metadata, Resource, ResourceId};
pub use source::{
    BoxedSource, CommandSource, CommandSpec, ManifestFile, Source, Stream, discover_manifests,
    local_sources,
};
