// Environments are built inside test processes - report through tracing, never stdout/stderr
#![deny(clippy::print_stderr, clippy::print_stdout)]

//! Isolated execution environments.
//!
//! An [`Environment`] is one platform version's code-loading context, built
//! from that version's resolved artifacts. Construction is expensive, so
//! environments are memoized and kept alive deliberately.
//!
//! # Architecture
//!
//! * [`builder`]: the [`EnvironmentBuilder`] seam and the default [`InstrumentingBuilder`]
//! * [`rules`]: which classes are loaded in isolation and which are instrumented
//! * [`registry`]: per-runner memoization of descriptors and environments, with singleflight builds
//! * [`retention`]: strong hold on the most recently used environment
//!
//! # Flow
//!
//! ```text
//! RetentionGuard::get_or_retain
//!   -> hit: same runner + version, return held environment
//!   -> miss: clear guard, EnvironmentRegistry::get_or_build
//!        -> cached: return it
//!        -> in flight: wait for the leader's result
//!        -> absent: lead the build (resolve + EnvironmentBuilder::build), publish
//!      re-arm guard
//! ```

pub mod builder;
mod environment;
mod error;
pub mod registry;
pub mod retention;
pub mod rules;

pub use builder::{EnvironmentBuilder, InstrumentingBuilder, IsolatedContext};
pub use environment::{ClassOrigin, Environment, EnvironmentId, LoadedClass, LoadingContext};
pub use error::{BuildError, EnvironmentError};
pub use registry::{CachePolicy, EnvironmentRegistry};
pub use retention::RetentionGuard;
pub use rules::InstrumentationRules;
