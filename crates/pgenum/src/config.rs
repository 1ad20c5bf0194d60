//! Comparison configuration.
//!
//! A [`Config`] is read once at the start of every comparison pass. Pass it
//! explicitly to [`crate::compare_enums_for_additions_with_config`], or
//! install it process-wide with [`set_configuration`] for callers that use
//! [`crate::compare_enums_for_additions`].

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

/// A predicate deciding which enum type names take part in comparison.
///
/// A panicking predicate is not caught; the panic reaches the caller of the
/// comparison pass.
#[derive(Clone)]
pub struct NameFilter(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl NameFilter {
    /// Build a filter from an arbitrary predicate.
    pub fn new(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Only the given names.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: HashSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(move |name| names.contains(name))
    }

    /// Names ending with `suffix`, e.g. `"_status"`.
    pub fn suffix(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        Self::new(move |name| name.ends_with(suffix.as_str()))
    }

    /// Names starting with `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::new(move |name| name.starts_with(prefix.as_str()))
    }

    /// Whether `name` passes the filter.
    pub fn matches(&self, name: &str) -> bool {
        (self.0)(name)
    }
}

impl fmt::Debug for NameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NameFilter(..)")
    }
}

/// Options for a comparison pass.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Only enum types accepted by this filter are compared. `None` compares
    /// every enum.
    pub include_name: Option<NameFilter>,
}

impl Config {
    /// Default configuration: every enum is included.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict comparison to names accepted by `filter`.
    pub fn include_name(mut self, filter: NameFilter) -> Self {
        self.include_name = Some(filter);
        self
    }

    /// Whether `name` should be compared under this configuration.
    pub fn includes(&self, name: &str) -> bool {
        self.include_name.as_ref().is_none_or(|f| f.matches(name))
    }
}

static CONFIGURATION: LazyLock<RwLock<Arc<Config>>> =
    LazyLock::new(|| RwLock::new(Arc::new(Config::default())));

/// The process-wide configuration, initialized to [`Config::default`] on
/// first use.
pub fn get_configuration() -> Arc<Config> {
    match CONFIGURATION.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the process-wide configuration wholesale.
///
/// Passes already running keep the configuration they started with.
/// Callers running passes from several threads must serialize changes
/// themselves.
pub fn set_configuration(config: Config) {
    let mut guard = match CONFIGURATION.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Arc::new(config);
}
