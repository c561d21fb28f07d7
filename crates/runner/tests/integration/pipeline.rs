//! Configuration, descriptor and version selection through the full adapter.

use pretty_assertions::assert_eq;
use roboscope_primitives::{RunnerId, VersionConfig};
use roboscope_runner::{
	InitCause, ManifestOverrides, ManifestSetting, PartialConfig, RunnerAdapter, Stage, TestClass,
	UnsupportedConfiguration,
};
use serial_test::serial;

use crate::common::Project;

const SPEC: &str = "com.example.CalculatorSpec";

fn runner() -> RunnerId {
	RunnerId::new("SpecRunner")
}

#[test]
fn missing_manifest_runs_with_default_version() {
	let project = Project::new();
	project.provision(18);
	let session = project.session().build();

	let adapter = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap();

	assert!(adapter.descriptor().is_none());
	assert_eq!(adapter.version(), VersionConfig::new(18));
}

#[test]
fn descriptor_target_selects_version() {
	let project = Project::new();
	project.provision(17);
	project.write_manifest("package=com.example\ntarget_sdk=17\n");
	let session = project.session().build();

	let adapter = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap();

	assert_eq!(adapter.version(), VersionConfig::new(17));
	assert_eq!(adapter.descriptor().and_then(|d| d.package_name()), Some("com.example"));
}

#[test]
fn class_config_beats_descriptor() {
	let project = Project::new();
	project.provision(19);
	project.write_manifest("target_sdk=17\n");
	let session = project.session().build();

	let class = TestClass::new(SPEC).with_config(PartialConfig::default().with_emulate_sdk(VersionConfig::new(19)));
	let adapter = RunnerAdapter::new(&session, runner(), class).unwrap();

	assert_eq!(adapter.version(), VersionConfig::new(19));
	assert!(adapter.descriptor().is_some());
}

#[test]
fn global_file_is_layered_under_class_config() {
	let project = Project::new();
	project.provision(16);
	project.provision(19);
	project.write_config("emulate_sdk = 16\nqualifiers = \"land\"\n");
	let session = project.session().build();

	let plain = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap();
	assert_eq!(plain.version(), VersionConfig::new(16));
	assert_eq!(plain.config().qualifiers, "land");

	let class = TestClass::new(SPEC).with_config(PartialConfig::default().with_emulate_sdk(VersionConfig::new(19)));
	let overridden = RunnerAdapter::new(&session, runner(), class).unwrap();
	assert_eq!(overridden.version(), VersionConfig::new(19));
	assert_eq!(overridden.config().qualifiers, "land");
}

#[test]
fn manifest_none_skips_descriptor() {
	let project = Project::new();
	project.provision(18);
	project.write_manifest("target_sdk=17\n");
	let session = project.session().build();

	let class = TestClass::new(SPEC).with_config(PartialConfig::default().with_manifest(ManifestSetting::None));
	let adapter = RunnerAdapter::new(&session, runner(), class).unwrap();

	assert!(adapter.descriptor().is_none());
	assert_eq!(adapter.version(), VersionConfig::new(18));
	assert_eq!(session.registry(&runner()).descriptor_count(), 0);
}

#[test]
fn invalid_global_file_fails_config_stage() {
	let project = Project::new();
	project.write_config("emulate_sdk = [");
	let session = project.session().build();

	let err = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap_err();
	assert_eq!(err.stage, Stage::ConfigResolved);
	assert!(matches!(err.cause, InitCause::Config(_)));
	assert_eq!(err.class, SPEC);
}

#[test]
fn malformed_descriptor_fails_descriptor_stage() {
	let project = Project::new();
	project.write_manifest("broken\n");
	let session = project.session().build();

	let err = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap_err();
	assert_eq!(err.stage, Stage::DescriptorResolved);
	assert_eq!(project.resolver_calls(), 0);
}

#[test]
fn unknown_version_is_rejected_before_resolution() {
	let project = Project::new();
	let session = project.session().build();

	let class = TestClass::new(SPEC).with_config(PartialConfig::default().with_emulate_sdk(VersionConfig::new(42)));
	let err = RunnerAdapter::new(&session, runner(), class).unwrap_err();

	assert_eq!(err.stage, Stage::VersionSelected);
	assert!(matches!(
		err.cause,
		InitCause::Unsupported(UnsupportedConfiguration::UnknownVersion { requested, .. }) if requested == VersionConfig::new(42)
	));
	assert_eq!(project.resolver_calls(), 0);
}

#[test]
fn pinned_session_ignores_descriptor_and_rejects_overrides() {
	let project = Project::new();
	project.provision(16);
	project.write_manifest("target_sdk=19\n");
	let session = project.session().pinned_version(VersionConfig::new(16)).build();

	let adapter = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap();
	assert_eq!(adapter.version(), VersionConfig::new(16));

	let class = TestClass::new(SPEC).with_config(PartialConfig::default().with_emulate_sdk(VersionConfig::new(16)));
	let err = RunnerAdapter::new(&session, runner(), class).unwrap_err();
	assert_eq!(err.stage, Stage::VersionSelected);
	assert!(matches!(
		err.cause,
		InitCause::Unsupported(UnsupportedConfiguration::PinnedOverride { .. })
	));
}

#[test]
fn manifest_override_and_package_are_applied() {
	let project = Project::new();
	project.provision(17);
	let build_dir = project.dir.path().join("build");
	std::fs::create_dir_all(&build_dir).unwrap();
	std::fs::write(build_dir.join("AndroidManifest.xml"), "package=com.example.debug\ntarget_sdk=17\n").unwrap();

	let session = project
		.session()
		.overrides(ManifestOverrides {
			manifest: Some(build_dir.join("AndroidManifest.xml")),
			package: Some("com.example".into()),
			..Default::default()
		})
		.build();

	let adapter = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap();
	let descriptor = adapter.descriptor().unwrap();
	assert_eq!(descriptor.key().resource_dir(), build_dir.join("res"));
	assert_eq!(descriptor.package_name(), Some("com.example"));
	assert_eq!(adapter.version(), VersionConfig::new(17));
}

#[test]
#[serial]
fn overrides_default_to_process_environment() {
	let project = Project::new();
	project.provision(19);
	let manifest = project.dir.path().join("generated").join("AndroidManifest.xml");
	std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
	std::fs::write(&manifest, "target_sdk=19\n").unwrap();

	// SAFETY: serialized with every other test touching these variables.
	unsafe {
		std::env::set_var("ROBOSCOPE_MANIFEST", &manifest);
	}
	let session = roboscope_runner::TestSession::builder(
		crate::common::KeyValueParser,
		crate::common::RecordingEngines::new(project.specs.clone()),
	)
	.base_dir(project.dir.path())
	.resolver(roboscope_resolve::LocalResolver::new(project.deps.path()))
	.build();
	unsafe {
		std::env::remove_var("ROBOSCOPE_MANIFEST");
	}

	let adapter = RunnerAdapter::new(&session, runner(), TestClass::new(SPEC)).unwrap();
	assert_eq!(adapter.descriptor().map(|d| d.key().manifest().to_path_buf()), Some(manifest));
	assert_eq!(adapter.version(), VersionConfig::new(19));
}
