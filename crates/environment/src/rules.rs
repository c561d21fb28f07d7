//! Class partitioning rules for isolated contexts.

/// Prefixes always delegated to the host rather than loaded in isolation.
const HOST_PREFIXES: &[&str] = &[
	"java.",
	"javax.",
	"sun.",
	"com.sun.",
	"org.w3c.",
	"org.xml.",
	"junit.",
	"org.junit.",
	"org.hamcrest.",
	"org.spockframework.",
	"groovy.",
	"org.codehaus.groovy.",
	"roboscope.",
];

/// Prefixes rewritten when loaded in isolation.
const INSTRUMENTED_PREFIXES: &[&str] = &[
	"android.",
	"com.android.internal.",
	"dalvik.",
	"org.apache.http.",
	"org.ccil.cowan.tagsoup.",
	"org.kxml2.",
];

/// Generated resource tables are loaded in isolation but left untouched.
const RESOURCE_CLASS: &str = "android.R";

/// Decides, per class, where it is loaded and whether it is rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentationRules {
	host_prefixes: Vec<String>,
	instrumented_prefixes: Vec<String>,
}

impl Default for InstrumentationRules {
	fn default() -> Self {
		Self {
			host_prefixes: HOST_PREFIXES.iter().map(|p| p.to_string()).collect(),
			instrumented_prefixes: INSTRUMENTED_PREFIXES.iter().map(|p| p.to_string()).collect(),
		}
	}
}

impl InstrumentationRules {
	/// Delegates classes under `prefix` to the host.
	pub fn with_host_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.host_prefixes.push(prefix.into());
		self
	}

	/// Instruments classes under `prefix`.
	pub fn with_instrumented_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.instrumented_prefixes.push(prefix.into());
		self
	}

	/// Returns true if `class_name` must be loaded inside the isolated context.
	pub fn should_acquire(&self, class_name: &str) -> bool {
		!self.host_prefixes.iter().any(|p| class_name.starts_with(p.as_str()))
	}

	/// Returns true if `class_name` is rewritten when loaded.
	pub fn should_instrument(&self, class_name: &str) -> bool {
		self.should_acquire(class_name)
			&& !is_resource_class(class_name)
			&& self.instrumented_prefixes.iter().any(|p| class_name.starts_with(p.as_str()))
	}
}

fn is_resource_class(class_name: &str) -> bool {
	class_name == RESOURCE_CLASS
		|| class_name
			.strip_prefix(RESOURCE_CLASS)
			.is_some_and(|rest| rest.starts_with('$'))
}
