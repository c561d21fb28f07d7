//! Interfaces to the inner specification engine.
//!
//! The adapter owns environment selection; everything about discovering and
//! executing individual features belongs to a [`SpecEngine`] built by an
//! [`EngineFactory`]. The engine reports each constructed specification
//! through [`SpecHooks`], which is how the environment binding reaches it.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use roboscope_environment::{Environment, LoadedClass};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::descriptor::Descriptor;

/// Named tree describing a test class and its features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
	name: String,
	children: Vec<Description>,
}

impl Description {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			children: Vec::new(),
		}
	}

	pub fn with_child(mut self, child: Description) -> Self {
		self.children.push(child);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn children(&self) -> &[Description] {
		&self.children
	}

	/// Leaves are individual tests.
	pub fn is_test(&self) -> bool {
		self.children.is_empty()
	}

	pub fn test_count(&self) -> usize {
		if self.is_test() {
			1
		} else {
			self.children.iter().map(Description::test_count).sum()
		}
	}
}

/// Progress reported while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
	Started(Description),
	Finished(Description),
	Failed { test: Description, message: String },
	Ignored(Description),
}

pub trait RunNotifier {
	fn notify(&mut self, event: RunEvent);
}

impl RunNotifier for Vec<RunEvent> {
	fn notify(&mut self, event: RunEvent) {
		self.push(event);
	}
}

/// Selects which tests run.
pub trait Filter {
	fn should_run(&self, test: &Description) -> bool;

	/// Human-readable summary used in diagnostics.
	fn describe(&self) -> String;
}

/// Orders sibling tests.
pub trait Sorter {
	fn compare(&self, a: &Description, b: &Description) -> Ordering;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no tests remain after applying filter: {0}")]
pub struct NoTestsRemain(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot construct engine for {class}: {reason}")]
pub struct EngineError {
	pub class: String,
	pub reason: String,
}

/// Executes one test class.
pub trait SpecEngine: Send {
	fn description(&self) -> Description;

	fn run(&mut self, notifier: &mut dyn RunNotifier);

	/// # Errors
	///
	/// Returns [`NoTestsRemain`] when the filter excludes every test.
	fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemain>;

	fn sort(&mut self, sorter: &dyn Sorter);
}

/// Builds the engine for a class loaded in its environment.
pub trait EngineFactory: Send + Sync {
	/// # Errors
	///
	/// Returns [`EngineError`] if the class is not a runnable specification.
	fn construct(&self, class: LoadedClass, hooks: SpecHooks) -> Result<Box<dyn SpecEngine>, EngineError>;
}

/// Everything a specification needs from the environment it runs in.
#[derive(Debug, Clone)]
pub struct SpecBinding {
	pub environment: Arc<Environment>,
	pub config: Arc<Config>,
	pub descriptor: Option<Arc<Descriptor>>,
}

/// A specification instance as seen by interceptors.
#[derive(Debug, Clone)]
pub struct SpecInfo {
	name: String,
	binding: Option<SpecBinding>,
}

impl SpecInfo {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			binding: None,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn binding(&self) -> Option<&SpecBinding> {
		self.binding.as_ref()
	}

	pub fn bind(&mut self, binding: SpecBinding) {
		self.binding = Some(binding);
	}
}

/// Called by the engine once per constructed specification.
pub trait SpecInterceptor: Send + Sync {
	fn spec_constructed(&self, spec: &mut SpecInfo);
}

/// Interceptors handed to the engine at construction.
#[derive(Clone, Default)]
pub struct SpecHooks {
	interceptors: Vec<Arc<dyn SpecInterceptor>>,
}

impl SpecHooks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, interceptor: Arc<dyn SpecInterceptor>) -> Self {
		self.register(interceptor);
		self
	}

	pub fn register(&mut self, interceptor: Arc<dyn SpecInterceptor>) {
		self.interceptors.push(interceptor);
	}

	/// Runs every registered interceptor, in registration order.
	pub fn spec_constructed(&self, spec: &mut SpecInfo) {
		for interceptor in &self.interceptors {
			interceptor.spec_constructed(spec);
		}
	}

	pub fn len(&self) -> usize {
		self.interceptors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.interceptors.is_empty()
	}
}

impl fmt::Debug for SpecHooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SpecHooks").field("interceptors", &self.len()).finish()
	}
}

/// Attaches the adapter's environment, config and descriptor to each spec.
#[derive(Debug)]
pub struct EnvironmentInterceptor {
	binding: SpecBinding,
}

impl EnvironmentInterceptor {
	pub fn new(binding: SpecBinding) -> Self {
		Self { binding }
	}
}

impl SpecInterceptor for EnvironmentInterceptor {
	fn spec_constructed(&self, spec: &mut SpecInfo) {
		debug!(spec = spec.name(), environment = %self.binding.environment.id(), "Binding spec to environment");
		spec.bind(self.binding.clone());
	}
}
