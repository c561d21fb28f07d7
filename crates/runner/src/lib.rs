// Runs inside test processes - report through tracing, never stdout/stderr
#![deny(clippy::print_stderr, clippy::print_stdout)]

//! Test-runner adapter.
//!
//! A [`RunnerAdapter`] turns one [`TestClass`] into a running engine:
//!
//! ```text
//! Config::load          defaults < roboscope.toml < class layer
//!   -> descriptor_key   manifest / resources / assets / libraries
//!   -> load_descriptor  memoized per runner, missing manifest = warn + None
//!   -> pick_version     override > descriptor target > catalog default
//!   -> TestSession::environment
//!        RetentionGuard -> EnvironmentRegistry -> resolver + builder
//!   -> Environment::bootstrap(class)
//!   -> EngineFactory::construct(class, SpecHooks[EnvironmentInterceptor])
//! ```
//!
//! All shared state lives in a [`TestSession`]; there are no process globals.

mod adapter;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod overrides;
mod selection;
mod session;

pub use adapter::{InitCause, InitializationError, RunnerAdapter, Stage, TestClass};
pub use config::{Config, ConfigError, ManifestSetting, PartialConfig};
pub use descriptor::{Descriptor, DescriptorError, DescriptorParser, descriptor_key};
pub use engine::{
	Description, EngineError, EngineFactory, EnvironmentInterceptor, Filter, NoTestsRemain, RunEvent, RunNotifier,
	Sorter, SpecBinding, SpecEngine, SpecHooks, SpecInfo, SpecInterceptor,
};
pub use overrides::ManifestOverrides;
pub use selection::{UnsupportedConfiguration, pick_version};
pub use session::{TestSession, TestSessionBuilder};
