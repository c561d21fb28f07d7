//! Class loading, spec binding and forwarding to the engine.

use std::cmp::Ordering;

use pretty_assertions::assert_eq;
use roboscope_environment::ClassOrigin;
use roboscope_primitives::{RunnerId, VersionConfig};
use roboscope_runner::{Description, Filter, InitCause, RunEvent, RunnerAdapter, Sorter, Stage, TestClass, TestSession};

use crate::common::{FEATURES, Project};

struct NameContains(&'static str);

impl Filter for NameContains {
	fn should_run(&self, test: &Description) -> bool {
		test.name().contains(self.0)
	}

	fn describe(&self) -> String {
		format!("name contains {:?}", self.0)
	}
}

struct Alphabetical;

impl Sorter for Alphabetical {
	fn compare(&self, a: &Description, b: &Description) -> Ordering {
		a.name().cmp(b.name())
	}
}

fn adapter(session: &TestSession) -> RunnerAdapter {
	RunnerAdapter::new(session, RunnerId::new("SpecRunner"), TestClass::new("com.example.CalculatorSpec")).unwrap()
}

#[test]
fn engine_receives_spec_bound_to_environment() {
	let project = Project::new();
	project.provision(18);
	project.write_manifest("package=com.example\n");
	let session = project.session().build();

	let adapter = adapter(&session);

	let specs = project.constructed_specs();
	assert_eq!(specs.len(), 1);
	assert_eq!(specs[0].name, "com.example.CalculatorSpec");
	assert_eq!(specs[0].environment, Some(adapter.environment().id()));
	assert_eq!(specs[0].version, Some(VersionConfig::new(18)));
	assert_eq!(specs[0].package.as_deref(), Some("com.example"));
}

#[test]
fn test_class_is_loaded_in_isolation() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();

	let adapter = adapter(&session);
	let loaded = adapter.environment().bootstrap("com.example.CalculatorSpec").unwrap();
	assert_eq!(loaded.origin, ClassOrigin::Isolated { instrumented: false });
	assert_eq!(loaded.environment, adapter.environment().id());
}

#[test]
fn description_and_run_are_forwarded() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();
	let mut adapter = adapter(&session);

	let description = adapter.description();
	assert_eq!(description.name(), "com.example.CalculatorSpec");
	assert_eq!(description.test_count(), FEATURES.len());

	let mut events: Vec<RunEvent> = Vec::new();
	adapter.run(&mut events);
	let failures: Vec<_> = events
		.iter()
		.filter_map(|e| match e {
			RunEvent::Failed { test, .. } => Some(test.name()),
			_ => None,
		})
		.collect();
	assert_eq!(failures, vec!["fails on divide by zero"]);
	assert_eq!(events.len(), 2 * FEATURES.len() + 1);
}

#[test]
fn filter_and_sort_are_forwarded() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();
	let mut adapter = adapter(&session);

	adapter.sort(&Alphabetical);
	let names: Vec<_> = adapter
		.description()
		.children()
		.iter()
		.map(|d| d.name().to_string())
		.collect();
	assert_eq!(names, vec!["adds", "fails on divide by zero", "subtracts"]);

	adapter.filter(&NameContains("tracts")).unwrap();
	assert_eq!(adapter.description().test_count(), 1);

	let err = adapter.filter(&NameContains("multiplies")).unwrap_err();
	assert_eq!(err.0, "name contains \"multiplies\"");
}

#[test]
fn invalid_class_name_fails_class_stage() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();

	let err = RunnerAdapter::new(&session, RunnerId::new("SpecRunner"), TestClass::new("com.example..Broken")).unwrap_err();
	assert_eq!(err.stage, Stage::ClassLoaded);
	assert!(matches!(err.cause, InitCause::Load(_)));
	// The environment itself was built and stays cached.
	assert!(session.registry(&RunnerId::new("SpecRunner")).contains(VersionConfig::new(18)));
}

#[test]
fn engine_refusal_fails_delegation_stage() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();

	let err = RunnerAdapter::new(&session, RunnerId::new("SpecRunner"), TestClass::new("com.example.TestHelper")).unwrap_err();
	assert_eq!(err.stage, Stage::Delegated);
	assert!(matches!(err.cause, InitCause::Engine(_)));
	assert!(project.constructed_specs().is_empty());
}
