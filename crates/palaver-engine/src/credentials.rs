//! Credential discovery for the palaver engine.
//!
//! The fallback path needs an API credential that is never hard-coded.
//! This module hides where credentials physically live behind a small
//! trait, and walks a fixed, ordered list of sources at most once each.

use std::path::PathBuf;

/// Environment variables consulted for a fallback credential, in order.
pub const CREDENTIAL_ENV_VARS: &[&str] = &["PALAVER_API_KEY", "OPENAI_API_KEY"];

/// Well-known key file, relative to the working directory.
pub const CREDENTIAL_FILE: &str = ".palaver/api_key";

/// A single place a fallback credential might live.
pub trait CredentialSource: Send + Sync {
    /// Short source name for diagnostics.
    fn name(&self) -> &str;

    /// Attempt to read a credential. `None` when the source has nothing.
    fn load(&self) -> Option<String>;
}

/// Credential stored in an environment variable.
#[derive(Debug, Clone)]
pub struct EnvSource {
    var: String,
}

impl EnvSource {
    /// Create a source reading the given environment variable.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvSource {
    fn name(&self) -> &str {
        &self.var
    }

    fn load(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Credential stored in a local key file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    /// Create a source reading the given key file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl CredentialSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let key = content.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

/// The default source list: both environment variables, then the key file.
pub fn default_sources() -> Vec<Box<dyn CredentialSource>> {
    let mut sources: Vec<Box<dyn CredentialSource>> = CREDENTIAL_ENV_VARS
        .iter()
        .map(|var| Box::new(EnvSource::new(*var)) as Box<dyn CredentialSource>)
        .collect();
    sources.push(Box::new(FileSource::new(CREDENTIAL_FILE)));
    sources
}

/// Ordered, probe-once credential resolver.
///
/// Sources are consulted in list order; the first truthy value wins and is
/// retained. A source that has been attempted is never probed again.
pub struct CredentialProbe {
    sources: Vec<Box<dyn CredentialSource>>,
    attempted: Vec<bool>,
    resolved: Option<String>,
}

impl CredentialProbe {
    /// Create a probe over the given sources.
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        let attempted = vec![false; sources.len()];
        Self {
            sources,
            attempted,
            resolved: None,
        }
    }

    /// Resolve a credential, consulting unattempted sources in order.
    ///
    /// Whitespace-only values do not count. Returns the previously resolved
    /// value without touching any source once one has been found.
    pub fn probe(&mut self) -> Option<String> {
        if let Some(key) = &self.resolved {
            return Some(key.clone());
        }

        for (idx, source) in self.sources.iter().enumerate() {
            if self.attempted[idx] {
                continue;
            }
            self.attempted[idx] = true;

            match source.load().filter(|v| !v.trim().is_empty()) {
                Some(value) => {
                    tracing::debug!(source = source.name(), "credential resolved");
                    self.resolved = Some(value.clone());
                    return Some(value);
                }
                None => continue,
            }
        }

        None
    }
}

impl Default for CredentialProbe {
    fn default() -> Self {
        Self::new(default_sources())
    }
}

impl std::fmt::Debug for CredentialProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProbe")
            .field("sources", &self.sources.len())
            .field("attempted", &self.attempted)
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        value: Option<String>,
        calls: Arc<AtomicUsize>,
    }

    impl CountingSource {
        fn new(value: Option<&str>) -> Self {
            Self {
                value: value.map(ToString::to_string),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    impl CredentialSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn load(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value.clone()
        }
    }

    #[test]
    fn test_env_source() {
        std::env::set_var("PALAVER_TEST_CRED_ENV", "sk-test");
        let source = EnvSource::new("PALAVER_TEST_CRED_ENV");
        assert_eq!(source.load().as_deref(), Some("sk-test"));
        std::env::remove_var("PALAVER_TEST_CRED_ENV");

        let missing = EnvSource::new("PALAVER_TEST_CRED_ENV_MISSING");
        assert_eq!(missing.load(), None);
    }

    #[test]
    fn test_file_source_trims_and_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_key");

        std::fs::write(&path, "sk-file\n").unwrap();
        let source = FileSource::new(&path);
        assert_eq!(source.load().as_deref(), Some("sk-file"));

        std::fs::write(&path, "   \n").unwrap();
        assert_eq!(source.load(), None);

        let absent = FileSource::new(dir.path().join("nope"));
        assert_eq!(absent.load(), None);
    }

    #[test]
    fn test_probe_takes_first_truthy_in_order() {
        let sources: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(CountingSource::new(None)),
            Box::new(CountingSource::new(Some("second"))),
            Box::new(CountingSource::new(Some("third"))),
        ];
        let mut probe = CredentialProbe::new(sources);
        assert_eq!(probe.probe().as_deref(), Some("second"));
    }

    #[test]
    fn test_probe_skips_whitespace_values() {
        let sources: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(CountingSource::new(Some("   "))),
            Box::new(CountingSource::new(Some("real"))),
        ];
        let mut probe = CredentialProbe::new(sources);
        assert_eq!(probe.probe().as_deref(), Some("real"));
    }

    #[test]
    fn test_probe_never_reprobes_attempted_sources() {
        let empty = CountingSource::new(None);
        let calls = empty.counter();
        let mut probe = CredentialProbe::new(vec![Box::new(empty)]);

        assert_eq!(probe.probe(), None);
        assert_eq!(probe.probe(), None);

        // One attempt total despite two probes.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_probe_retains_resolved_value() {
        let found = CountingSource::new(Some("sk-keep"));
        let calls = found.counter();
        let mut probe = CredentialProbe::new(vec![Box::new(found)]);

        assert_eq!(probe.probe().as_deref(), Some("sk-keep"));
        assert_eq!(probe.probe().as_deref(), Some("sk-keep"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
