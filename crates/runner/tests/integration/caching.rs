//! Environment reuse across adapters, threads and failures.

use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;
use roboscope_environment::CachePolicy;
use roboscope_primitives::{RunnerId, VersionConfig};
use roboscope_runner::{InitCause, PartialConfig, RunnerAdapter, Stage, TestClass};

use crate::common::Project;

/// Artifacts per version in the default catalog.
const ARTIFACTS: usize = 3;

fn class(name: &str, sdk: u32) -> TestClass {
	TestClass::new(name).with_config(PartialConfig::default().with_emulate_sdk(VersionConfig::new(sdk)))
}

#[test]
fn classes_on_the_same_version_share_one_environment() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();
	let runner = RunnerId::new("SpecRunner");

	let first = RunnerAdapter::new(&session, runner.clone(), class("com.example.FirstSpec", 18)).unwrap();
	let second = RunnerAdapter::new(&session, runner, class("com.example.SecondSpec", 18)).unwrap();

	assert!(Arc::ptr_eq(first.environment(), second.environment()));
	assert_eq!(project.resolver_calls(), ARTIFACTS);
}

#[test]
fn each_runner_identity_has_its_own_registry() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();

	let a = RunnerAdapter::new(&session, RunnerId::new("A"), class("com.example.FirstSpec", 18)).unwrap();
	let b = RunnerAdapter::new(&session, RunnerId::new("B"), class("com.example.FirstSpec", 18)).unwrap();

	assert!(!Arc::ptr_eq(a.environment(), b.environment()));
	assert_eq!(project.resolver_calls(), 2 * ARTIFACTS);
}

#[test]
fn switching_versions_keeps_strongly_cached_environments() {
	let project = Project::new();
	project.provision(17);
	project.provision(18);
	let session = project.session().build();
	let runner = RunnerId::new("SpecRunner");

	let first = RunnerAdapter::new(&session, runner.clone(), class("com.example.FirstSpec", 18)).unwrap();
	RunnerAdapter::new(&session, runner.clone(), class("com.example.OtherSpec", 17)).unwrap();
	let again = RunnerAdapter::new(&session, runner.clone(), class("com.example.ThirdSpec", 18)).unwrap();

	assert!(Arc::ptr_eq(first.environment(), again.environment()));
	assert_eq!(session.registry(&runner).environment_count(), 2);
	assert_eq!(project.resolver_calls(), 2 * ARTIFACTS);
}

#[test]
fn weak_cache_relies_on_the_retention_guard() {
	let project = Project::new();
	project.provision(17);
	project.provision(18);
	let session = project.session().cache_policy(CachePolicy::Weak).build();
	let runner = RunnerId::new("SpecRunner");

	let first_id = RunnerAdapter::new(&session, runner.clone(), class("com.example.FirstSpec", 18))
		.unwrap()
		.environment()
		.id();
	let second_id = RunnerAdapter::new(&session, runner.clone(), class("com.example.SecondSpec", 18))
		.unwrap()
		.environment()
		.id();
	assert_eq!(first_id, second_id);
	assert_eq!(project.resolver_calls(), ARTIFACTS);

	// Moving to 17 releases the guard's hold on 18; nothing else keeps it alive.
	RunnerAdapter::new(&session, runner.clone(), class("com.example.OtherSpec", 17)).unwrap();
	let rebuilt_id = RunnerAdapter::new(&session, runner.clone(), class("com.example.ThirdSpec", 18))
		.unwrap()
		.environment()
		.id();
	assert_ne!(rebuilt_id, first_id);
	assert_eq!(project.resolver_calls(), 3 * ARTIFACTS);
}

#[test]
fn failed_resolution_is_retried() {
	let project = Project::new();
	let session = project.session().build();
	let runner = RunnerId::new("SpecRunner");

	let err = RunnerAdapter::new(&session, runner.clone(), class("com.example.FirstSpec", 18)).unwrap_err();
	assert_eq!(err.stage, Stage::EnvironmentReady);
	assert!(matches!(err.cause, InitCause::Environment(_)));
	assert!(!session.registry(&runner).contains(VersionConfig::new(18)));
	assert_eq!(session.guard().retained(), None);

	project.provision(18);
	RunnerAdapter::new(&session, runner.clone(), class("com.example.FirstSpec", 18)).unwrap();
	assert!(session.registry(&runner).contains(VersionConfig::new(18)));
}

#[test]
fn corrupt_artifact_fails_environment_stage() {
	let project = Project::new();
	project.provision(18);
	let platform = std::fs::read_dir(project.deps.path())
		.unwrap()
		.map(|e| e.unwrap().path())
		.find(|p| p.to_string_lossy().contains("android-all"))
		.unwrap();
	std::fs::write(&platform, b"not a jar").unwrap();
	let session = project.session().build();

	let err = RunnerAdapter::new(&session, RunnerId::new("SpecRunner"), class("com.example.FirstSpec", 18)).unwrap_err();
	assert_eq!(err.stage, Stage::EnvironmentReady);
	assert!(err.to_string().contains("not a zip archive"), "{err}");
}

#[test]
fn concurrent_adapters_build_once() {
	const THREADS: usize = 6;
	let project = Project::new();
	project.provision(18);
	let session = Arc::new(project.session().build());
	let barrier = Arc::new(Barrier::new(THREADS));

	let handles: Vec<_> = (0..THREADS)
		.map(|i| {
			let session = Arc::clone(&session);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				let adapter = RunnerAdapter::new(
					&session,
					RunnerId::new("SpecRunner"),
					class(&format!("com.example.Spec{i}"), 18),
				)
				.unwrap();
				Arc::clone(adapter.environment())
			})
		})
		.collect();

	let environments: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
	assert!(environments.iter().all(|env| Arc::ptr_eq(env, &environments[0])));
	assert_eq!(project.resolver_calls(), ARTIFACTS);
}
