//! Core identifiers: platform versions, artifacts, descriptor keys, and runner identities.

/// Artifact coordinates and ordered artifact sets.
pub mod artifact;
/// Identity of a resolved application descriptor.
pub mod descriptor;
/// Runner identity used to scope environment registries.
pub mod runner;
/// Version-to-artifact catalog.
pub mod sdk;
/// Platform version identifiers.
pub mod version;

pub use artifact::{ArtifactId, ArtifactSet, ParseArtifactError};
pub use descriptor::DescriptorKey;
pub use runner::RunnerId;
pub use sdk::{SdkCatalog, SdkRelease};
pub use version::{ParseVersionError, VersionConfig};
