//! Shared state for every runner adapter in a test process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::Mutex;
use roboscope_environment::{
	CachePolicy, Environment, EnvironmentBuilder, EnvironmentError, EnvironmentRegistry, InstrumentingBuilder,
	RetentionGuard,
};
use roboscope_primitives::{RunnerId, SdkCatalog, VersionConfig};
use roboscope_resolve::{ArtifactResolver, ResolverPolicy};
use tracing::info;

use crate::descriptor::{Descriptor, DescriptorParser};
use crate::engine::EngineFactory;
use crate::overrides::ManifestOverrides;

/// Owns registries, the retention guard and the collaborators adapters use.
///
/// `Send + Sync`; share it by reference or `Arc` across threads
/// constructing adapters.
pub struct TestSession {
	registries: Mutex<HashMap<RunnerId, Arc<EnvironmentRegistry<Descriptor>>>>,
	guard: RetentionGuard,
	resolver: OnceLock<Arc<dyn ArtifactResolver>>,
	resolver_policy: Option<ResolverPolicy>,
	builder: Arc<dyn EnvironmentBuilder>,
	parser: Arc<dyn DescriptorParser>,
	engines: Arc<dyn EngineFactory>,
	catalog: SdkCatalog,
	base_dir: PathBuf,
	overrides: ManifestOverrides,
	pinned: Option<VersionConfig>,
	cache_policy: CachePolicy,
}

impl TestSession {
	pub fn builder(parser: impl DescriptorParser + 'static, engines: impl EngineFactory + 'static) -> TestSessionBuilder {
		TestSessionBuilder {
			parser: Arc::new(parser),
			engines: Arc::new(engines),
			resolver: None,
			resolver_policy: None,
			builder: None,
			catalog: SdkCatalog::default(),
			base_dir: PathBuf::from("."),
			overrides: None,
			pinned: None,
			cache_policy: CachePolicy::default(),
		}
	}

	/// The registry owned by `runner`, created on first use.
	pub fn registry(&self, runner: &RunnerId) -> Arc<EnvironmentRegistry<Descriptor>> {
		let mut registries = self.registries.lock();
		Arc::clone(
			registries
				.entry(runner.clone())
				.or_insert_with(|| Arc::new(EnvironmentRegistry::new(self.cache_policy))),
		)
	}

	/// Returns the environment for `(runner, version)`, building it if needed.
	///
	/// # Errors
	///
	/// Returns [`EnvironmentError`] when resolution or construction fails.
	pub fn environment(&self, runner: &RunnerId, version: VersionConfig) -> Result<Arc<Environment>, EnvironmentError> {
		let registry = self.registry(runner);
		self.guard
			.get_or_retain(runner, version, &registry, || self.build_environment(version))
	}

	fn build_environment(&self, version: VersionConfig) -> Result<Environment, EnvironmentError> {
		let artifacts = self
			.catalog
			.artifacts(version)
			.ok_or_else(|| EnvironmentError::Resolution(format!("no artifacts known for sdk {version}")))?;

		let started = Instant::now();
		let resolved = self.resolver().resolve_all(&artifacts)?;
		info!(
			sdk = %version,
			artifacts = resolved.len(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Resolved artifacts"
		);
		Ok(self.builder.build(version, &resolved)?)
	}

	/// The artifact resolver, instantiated from the resolver policy on first use.
	pub fn resolver(&self) -> &Arc<dyn ArtifactResolver> {
		self.resolver.get_or_init(|| {
			self.resolver_policy
				.clone()
				.unwrap_or_else(ResolverPolicy::from_env)
				.into_resolver()
		})
	}

	pub fn guard(&self) -> &RetentionGuard {
		&self.guard
	}

	pub fn parser(&self) -> &dyn DescriptorParser {
		self.parser.as_ref()
	}

	pub fn engines(&self) -> &dyn EngineFactory {
		self.engines.as_ref()
	}

	pub fn catalog(&self) -> &SdkCatalog {
		&self.catalog
	}

	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	pub fn overrides(&self) -> &ManifestOverrides {
		&self.overrides
	}

	/// Version every class runs against, if the session is pinned.
	pub fn pinned_version(&self) -> Option<VersionConfig> {
		self.pinned
	}
}

impl std::fmt::Debug for TestSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TestSession")
			.field("runners", &self.registries.lock().len())
			.field("guard", &self.guard)
			.field("catalog", &self.catalog)
			.field("base_dir", &self.base_dir)
			.field("pinned", &self.pinned)
			.field("cache_policy", &self.cache_policy)
			.finish_non_exhaustive()
	}
}

/// Configures a [`TestSession`].
#[must_use]
pub struct TestSessionBuilder {
	parser: Arc<dyn DescriptorParser>,
	engines: Arc<dyn EngineFactory>,
	resolver: Option<Arc<dyn ArtifactResolver>>,
	resolver_policy: Option<ResolverPolicy>,
	builder: Option<Arc<dyn EnvironmentBuilder>>,
	catalog: SdkCatalog,
	base_dir: PathBuf,
	overrides: Option<ManifestOverrides>,
	pinned: Option<VersionConfig>,
	cache_policy: CachePolicy,
}

impl TestSessionBuilder {
	/// Uses `resolver` instead of one derived from a [`ResolverPolicy`].
	pub fn resolver(mut self, resolver: impl ArtifactResolver + 'static) -> Self {
		self.resolver = Some(Arc::new(resolver));
		self
	}

	/// Policy for the lazily created resolver. Defaults to [`ResolverPolicy::from_env`].
	pub fn resolver_policy(mut self, policy: ResolverPolicy) -> Self {
		self.resolver_policy = Some(policy);
		self
	}

	/// Defaults to [`InstrumentingBuilder`] with default rules.
	pub fn environment_builder(mut self, builder: impl EnvironmentBuilder + 'static) -> Self {
		self.builder = Some(Arc::new(builder));
		self
	}

	pub fn catalog(mut self, catalog: SdkCatalog) -> Self {
		self.catalog = catalog;
		self
	}

	/// Directory holding `roboscope.toml` and the default manifest.
	pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.base_dir = dir.into();
		self
	}

	/// Defaults to [`ManifestOverrides::from_env`].
	pub fn overrides(mut self, overrides: ManifestOverrides) -> Self {
		self.overrides = Some(overrides);
		self
	}

	/// Runs every class against `version`, rejecting per-class overrides.
	pub fn pinned_version(mut self, version: VersionConfig) -> Self {
		self.pinned = Some(version);
		self
	}

	pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
		self.cache_policy = policy;
		self
	}

	pub fn build(self) -> TestSession {
		let resolver = OnceLock::new();
		if let Some(explicit) = self.resolver {
			let _ = resolver.set(explicit);
		}
		TestSession {
			registries: Mutex::new(HashMap::new()),
			guard: RetentionGuard::new(),
			resolver,
			resolver_policy: self.resolver_policy,
			builder: self
				.builder
				.unwrap_or_else(|| Arc::new(InstrumentingBuilder::default()) as Arc<dyn EnvironmentBuilder>),
			parser: self.parser,
			engines: self.engines,
			catalog: self.catalog,
			base_dir: self.base_dir,
			overrides: self.overrides.unwrap_or_else(ManifestOverrides::from_env),
			pinned: self.pinned,
			cache_policy: self.cache_policy,
		}
	}
}
