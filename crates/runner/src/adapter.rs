//! Per-class runner adapter.

use std::fmt;
use std::sync::Arc;

use roboscope_environment::{BuildError, Environment, EnvironmentError};
use roboscope_primitives::{RunnerId, VersionConfig};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigError, PartialConfig};
use crate::descriptor::{Descriptor, DescriptorError, descriptor_key, load_descriptor};
use crate::engine::{
	Description, EngineError, EnvironmentInterceptor, Filter, NoTestsRemain, RunNotifier, Sorter, SpecBinding,
	SpecEngine, SpecHooks,
};
use crate::selection::{UnsupportedConfiguration, pick_version};
use crate::session::TestSession;

/// A test class as handed to the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestClass {
	/// Binary class name, e.g. `com.example.CalculatorSpec`.
	pub name: String,
	/// Class-level configuration layer.
	pub config: Option<PartialConfig>,
}

impl TestClass {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			config: None,
		}
	}

	pub fn with_config(mut self, config: PartialConfig) -> Self {
		self.config = Some(config);
		self
	}
}

/// Initialization milestones, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
	ConfigResolved,
	DescriptorResolved,
	VersionSelected,
	EnvironmentReady,
	ClassLoaded,
	Delegated,
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::ConfigResolved => "resolving configuration",
			Self::DescriptorResolved => "resolving descriptor",
			Self::VersionSelected => "selecting sdk",
			Self::EnvironmentReady => "preparing environment",
			Self::ClassLoaded => "loading test class",
			Self::Delegated => "constructing engine",
		})
	}
}

#[derive(Debug, Error)]
pub enum InitCause {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Descriptor(#[from] DescriptorError),
	#[error(transparent)]
	Unsupported(#[from] UnsupportedConfiguration),
	#[error(transparent)]
	Environment(#[from] EnvironmentError),
	#[error(transparent)]
	Load(#[from] BuildError),
	#[error(transparent)]
	Engine(#[from] EngineError),
}

/// Fatal failure constructing a [`RunnerAdapter`].
#[derive(Debug, Error)]
#[error("cannot initialize {class} while {stage}: {cause}")]
pub struct InitializationError {
	pub class: String,
	/// The milestone that could not be reached.
	pub stage: Stage,
	#[source]
	pub cause: InitCause,
}

fn failed_at<E: Into<InitCause>>(class: &str, stage: Stage) -> impl FnOnce(E) -> InitializationError + '_ {
	move |cause| InitializationError {
		class: class.to_string(),
		stage,
		cause: cause.into(),
	}
}

/// Runs one test class inside the environment selected for it.
pub struct RunnerAdapter {
	class: String,
	runner: RunnerId,
	config: Arc<Config>,
	descriptor: Option<Arc<Descriptor>>,
	environment: Arc<Environment>,
	engine: Box<dyn SpecEngine>,
}

impl RunnerAdapter {
	/// Configures, selects and builds (or reuses) the environment for
	/// `class`, loads it there and constructs its engine.
	///
	/// # Errors
	///
	/// Returns [`InitializationError`] naming the stage that failed.
	pub fn new(session: &TestSession, runner: RunnerId, class: TestClass) -> Result<Self, InitializationError> {
		let name = class.name.as_str();

		let config =
			Arc::new(Config::load(session.base_dir(), class.config.as_ref()).map_err(failed_at(name, Stage::ConfigResolved))?);

		let registry = session.registry(&runner);
		let descriptor = match descriptor_key(&config, session.base_dir(), session.overrides()) {
			Some(key) => load_descriptor(&registry, session.parser(), &key, session.overrides())
				.map_err(failed_at(name, Stage::DescriptorResolved))?,
			None => {
				debug!(class = name, "Running without a descriptor");
				None
			}
		};

		let version = pick_version(
			session.catalog(),
			config.emulate_sdk,
			descriptor.as_ref().and_then(|d| d.target_version()),
			session.pinned_version(),
		)
		.map_err(failed_at(name, Stage::VersionSelected))?;

		let environment = session
			.environment(&runner, version)
			.map_err(failed_at(name, Stage::EnvironmentReady))?;

		let loaded = environment
			.bootstrap(name)
			.map_err(failed_at(name, Stage::ClassLoaded))?;

		let hooks = SpecHooks::new().with(Arc::new(EnvironmentInterceptor::new(SpecBinding {
			environment: Arc::clone(&environment),
			config: Arc::clone(&config),
			descriptor: descriptor.clone(),
		})));
		let engine = session
			.engines()
			.construct(loaded, hooks)
			.map_err(failed_at(name, Stage::Delegated))?;

		info!(class = name, runner = %runner, sdk = %version, environment = %environment.id(), "Runner ready");
		Ok(Self {
			class: class.name,
			runner,
			config,
			descriptor,
			environment,
			engine,
		})
	}

	pub fn class_name(&self) -> &str {
		&self.class
	}

	pub fn runner(&self) -> &RunnerId {
		&self.runner
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn descriptor(&self) -> Option<&Descriptor> {
		self.descriptor.as_deref()
	}

	pub fn version(&self) -> VersionConfig {
		self.environment.version()
	}

	pub fn environment(&self) -> &Arc<Environment> {
		&self.environment
	}

	pub fn description(&self) -> Description {
		self.engine.description()
	}

	pub fn run(&mut self, notifier: &mut dyn RunNotifier) {
		self.engine.run(notifier);
	}

	/// # Errors
	///
	/// Returns [`NoTestsRemain`] when the filter excludes every test.
	pub fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemain> {
		self.engine.filter(filter)
	}

	pub fn sort(&mut self, sorter: &dyn Sorter) {
		self.engine.sort(sorter);
	}
}

impl fmt::Debug for RunnerAdapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RunnerAdapter")
			.field("class", &self.class)
			.field("runner", &self.runner)
			.field("version", &self.version())
			.field("environment", &self.environment.id())
			.finish_non_exhaustive()
	}
}
