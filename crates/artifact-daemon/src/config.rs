//! Daemon configuration from command-line arguments and environment.

use artifact_core::document::DocumentIdError;
use artifact_core::{ArtifactKind, DocumentId};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Environment variable naming the store directory.
pub const STORE_PATH_ENV: &str = "ARTIFACT_STORE_PATH";
/// Environment variable overriding the debounce quiet period.
pub const QUIET_PERIOD_ENV: &str = "ARTIFACT_QUIET_PERIOD_MS";

/// Raw values as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    pub store: Option<String>,
    pub quiet_period_ms: Option<u64>,
    pub document: Option<String>,
    pub kind: ArtifactKind,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding version history files
    pub store_path: PathBuf,
    /// Debounce quiet period for local edits
    pub quiet_period: Duration,
    /// Document to open
    pub document_id: DocumentId,
    pub kind: ArtifactKind,
}

impl Config {
    /// Resolve configuration from args, falling back to process environment.
    pub fn resolve(args: ConfigArgs) -> Result<Self, ConfigError> {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    ///
    /// Command-line values win over environment values.
    pub fn resolve_with(
        args: ConfigArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let store = args
            .store
            .or_else(|| env(STORE_PATH_ENV))
            .ok_or(ConfigError::MissingStorePath)?;
        let store_path = expand_tilde(&store);

        let quiet_period_ms = match args.quiet_period_ms {
            Some(ms) => ms,
            None => match env(QUIET_PERIOD_ENV) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidQuietPeriod(raw))?,
                None => artifact_core::gate::DEFAULT_QUIET_PERIOD.as_millis() as u64,
            },
        };

        let document_id = match args.document {
            Some(raw) => raw.parse()?,
            None => {
                let id = DocumentId::generate();
                info!("Generated document ID: {}", id);
                id
            }
        };

        Ok(Self {
            store_path,
            quiet_period: Duration::from_millis(quiet_period_ms),
            document_id,
            kind: args.kind,
        })
    }
}

/// Expand ~ or ~/ prefix to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No store path: pass --store or set ARTIFACT_STORE_PATH")]
    MissingStorePath,

    #[error("ARTIFACT_QUIET_PERIOD_MS is not a number of milliseconds: {0}")]
    InvalidQuietPeriod(String),

    #[error("Invalid document ID: {0}")]
    InvalidDocumentId(#[from] DocumentIdError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_store_path() {
        let err = Config::resolve_with(ConfigArgs::default(), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingStorePath));
    }

    #[test]
    fn test_env_fallbacks() {
        let config = Config::resolve_with(
            ConfigArgs::default(),
            env(&[(STORE_PATH_ENV, "/tmp/artifacts"), (QUIET_PERIOD_ENV, "750")]),
        )
        .unwrap();

        assert_eq!(config.store_path, PathBuf::from("/tmp/artifacts"));
        assert_eq!(config.quiet_period, Duration::from_millis(750));
    }

    #[test]
    fn test_args_override_env() {
        let args = ConfigArgs {
            store: Some("/srv/store".into()),
            quiet_period_ms: Some(100),
            ..Default::default()
        };
        let config =
            Config::resolve_with(args, env(&[(STORE_PATH_ENV, "/tmp/ignored"), (QUIET_PERIOD_ENV, "9")]))
                .unwrap();

        assert_eq!(config.store_path, PathBuf::from("/srv/store"));
        assert_eq!(config.quiet_period, Duration::from_millis(100));
    }

    #[test]
    fn test_default_quiet_period() {
        let config = Config::resolve_with(ConfigArgs::default(), env(&[(STORE_PATH_ENV, "/x")])).unwrap();
        assert_eq!(config.quiet_period, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_quiet_period() {
        let err = Config::resolve_with(
            ConfigArgs::default(),
            env(&[(STORE_PATH_ENV, "/x"), (QUIET_PERIOD_ENV, "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQuietPeriod(raw) if raw == "soon"));
    }

    #[test]
    fn test_document_id_parsed() {
        let id = DocumentId::generate();
        let args = ConfigArgs {
            store: Some("/x".into()),
            document: Some(id.to_string()),
            ..Default::default()
        };
        assert_eq!(Config::resolve_with(args, env(&[])).unwrap().document_id, id);

        let args = ConfigArgs {
            store: Some("/x".into()),
            document: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(
            Config::resolve_with(args, env(&[])),
            Err(ConfigError::InvalidDocumentId(_))
        ));
    }

    #[test]
    fn test_expand_tilde_passthrough() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
