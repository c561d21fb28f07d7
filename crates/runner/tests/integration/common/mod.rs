//! Fixtures for runner integration tests: an on-disk project, a counting
//! offline resolver, a key/value descriptor parser and a recording engine.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use roboscope_environment::{EnvironmentId, LoadedClass};
use roboscope_primitives::{ArtifactId, DescriptorKey, SdkCatalog, VersionConfig};
use roboscope_resolve::{ArtifactResolver, LocalResolver, ResolvedArtifact};
use roboscope_runner::{
	Description, Descriptor, DescriptorError, DescriptorParser, EngineError, EngineFactory, Filter, ManifestOverrides,
	NoTestsRemain, RunEvent, RunNotifier, Sorter, SpecEngine, SpecHooks, SpecInfo, TestSession, TestSessionBuilder,
};
use tempfile::TempDir;

/// Project directory plus a flat directory of provisioned artifacts.
pub struct Project {
	pub dir: TempDir,
	pub deps: TempDir,
	pub resolver_calls: Arc<AtomicUsize>,
	pub specs: Arc<Mutex<Vec<BoundSpec>>>,
}

impl Project {
	pub fn new() -> Self {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
		Self {
			dir: tempfile::tempdir().unwrap(),
			deps: tempfile::tempdir().unwrap(),
			resolver_calls: Arc::new(AtomicUsize::new(0)),
			specs: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// Session wired to this project's fakes. Overrides are empty, not read
	/// from the process environment.
	pub fn session(&self) -> TestSessionBuilder {
		TestSession::builder(KeyValueParser, RecordingEngines::new(Arc::clone(&self.specs)))
			.base_dir(self.dir.path())
			.overrides(ManifestOverrides::default())
			.resolver(CountingResolver {
				inner: LocalResolver::new(self.deps.path()),
				calls: Arc::clone(&self.resolver_calls),
			})
	}

	pub fn write_manifest(&self, contents: &str) {
		fs::write(self.dir.path().join("AndroidManifest.xml"), contents).unwrap();
	}

	pub fn write_config(&self, contents: &str) {
		fs::write(self.dir.path().join("roboscope.toml"), contents).unwrap();
	}

	/// Places valid archives for every artifact `version` needs.
	pub fn provision(&self, version: u32) {
		let artifacts = SdkCatalog::default()
			.artifacts(VersionConfig::new(version))
			.unwrap();
		for id in artifacts.iter() {
			fs::write(self.deps.path().join(id.file_name()), b"PK\x03\x04fixture").unwrap();
		}
	}

	pub fn resolver_calls(&self) -> usize {
		self.resolver_calls.load(Ordering::SeqCst)
	}

	pub fn constructed_specs(&self) -> Vec<BoundSpec> {
		self.specs.lock().clone()
	}
}

pub struct CountingResolver {
	inner: LocalResolver,
	calls: Arc<AtomicUsize>,
}

impl ArtifactResolver for CountingResolver {
	fn resolve(&self, artifact: &ArtifactId) -> roboscope_resolve::Result<ResolvedArtifact> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.resolve(artifact)
	}
}

/// Reads `key=value` lines: `target_sdk`, `package`. A line `broken`
/// makes the manifest malformed.
pub struct KeyValueParser;

impl DescriptorParser for KeyValueParser {
	fn parse(&self, key: &DescriptorKey) -> Result<Descriptor, DescriptorError> {
		let path = key.manifest().to_path_buf();
		let text = fs::read_to_string(&path).map_err(|_| DescriptorError::NotFound(path.clone()))?;

		let mut descriptor = Descriptor::new(key.clone());
		for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
			match line.split_once('=') {
				Some(("target_sdk", value)) => {
					let version = value.trim().parse::<VersionConfig>().map_err(|e| DescriptorError::Malformed {
						path: path.clone(),
						reason: e.to_string(),
					})?;
					descriptor = descriptor.with_target_version(version);
				}
				Some(("package", value)) => descriptor = descriptor.with_package_name(value.trim()),
				_ => {
					return Err(DescriptorError::Malformed {
						path,
						reason: format!("unexpected line {line:?}"),
					});
				}
			}
		}
		Ok(descriptor)
	}
}

/// What a constructed spec was bound to. Holds no environment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSpec {
	pub name: String,
	pub environment: Option<EnvironmentId>,
	pub version: Option<VersionConfig>,
	pub package: Option<String>,
}

pub const FEATURES: [&str; 3] = ["subtracts", "adds", "fails on divide by zero"];

/// Builds [`ListEngine`]s and records every spec it constructs.
pub struct RecordingEngines {
	specs: Arc<Mutex<Vec<BoundSpec>>>,
}

impl RecordingEngines {
	pub fn new(specs: Arc<Mutex<Vec<BoundSpec>>>) -> Self {
		Self { specs }
	}
}

impl EngineFactory for RecordingEngines {
	fn construct(&self, class: LoadedClass, hooks: SpecHooks) -> Result<Box<dyn SpecEngine>, EngineError> {
		if class.name.ends_with("Helper") {
			return Err(EngineError {
				class: class.name,
				reason: "not a specification".into(),
			});
		}
		let mut spec = SpecInfo::new(class.name.clone());
		hooks.spec_constructed(&mut spec);
		let binding = spec.binding();
		self.specs.lock().push(BoundSpec {
			name: spec.name().to_string(),
			environment: binding.map(|b| b.environment.id()),
			version: binding.map(|b| b.environment.version()),
			package: binding
				.and_then(|b| b.descriptor.as_ref())
				.and_then(|d| d.package_name().map(str::to_string)),
		});

		Ok(Box::new(ListEngine {
			class: class.name,
			features: FEATURES.iter().map(|f| Description::new(*f)).collect(),
		}))
	}
}

/// Engine over a flat list of features; features containing "fails" fail.
pub struct ListEngine {
	class: String,
	features: Vec<Description>,
}

impl SpecEngine for ListEngine {
	fn description(&self) -> Description {
		self.features
			.iter()
			.cloned()
			.fold(Description::new(self.class.clone()), Description::with_child)
	}

	fn run(&mut self, notifier: &mut dyn RunNotifier) {
		for feature in &self.features {
			notifier.notify(RunEvent::Started(feature.clone()));
			if feature.name().contains("fails") {
				notifier.notify(RunEvent::Failed {
					test: feature.clone(),
					message: "ArithmeticException".into(),
				});
			}
			notifier.notify(RunEvent::Finished(feature.clone()));
		}
	}

	fn filter(&mut self, filter: &dyn Filter) -> Result<(), NoTestsRemain> {
		self.features.retain(|f| filter.should_run(f));
		if self.features.is_empty() {
			return Err(NoTestsRemain(filter.describe()));
		}
		Ok(())
	}

	fn sort(&mut self, sorter: &dyn Sorter) {
		self.features.sort_by(|a, b| sorter.compare(a, b));
	}
}
