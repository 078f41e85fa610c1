//! Server settings loaded via OrthoConfig.
//!
//! Every value can come from a `CIVIC_*` environment variable or the
//! matching command-line flag. Accessors apply defaults and validate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::domain::DEFAULT_CLUSTER_THRESHOLD;
use crate::outbound::firestore::FirestoreConfig;
use crate::outbound::gemini::GeminiConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_RESUBSCRIBE_SECS: u64 = 5;
const DEFAULT_SESSION_KEY_PATH: &str = "/var/run/secrets/session_key";

/// Which report store backs the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStoreKind {
    /// Process memory; contents vanish on restart.
    Memory,
    Firestore,
}

/// Errors raised while interpreting [`CivicSettings`].
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("{name} is required when {reason}")]
    Missing {
        name: &'static str,
        reason: &'static str,
    },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid URL in {name}: {source}")]
    Url {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Runtime configuration for the civic backend.
///
/// The session toggles are read from the environment only; a bare boolean
/// flag would otherwise always reach the merge as `false`.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CIVIC")]
pub struct CivicSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Report store backend: `memory` or `firestore`.
    pub report_store: Option<String>,
    pub firestore_project: Option<String>,
    pub firestore_api_key: Option<String>,
    pub firestore_database: Option<String>,
    /// Seconds between Firestore snapshot polls.
    pub firestore_poll_secs: Option<u64>,
    /// Gemini API key. The assistant is disabled when unset.
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    /// Model used for every assistant call.
    pub gemini_model: Option<String>,
    pub gemini_timeout_secs: Option<u64>,
    /// Directory holding one JSON document per citizen. Profiles are kept
    /// in memory when unset.
    pub profile_dir: Option<String>,
    /// Points credited to a newly created citizen profile.
    pub welcome_points: Option<i64>,
    /// Default proximity threshold for clustering, in degrees.
    pub cluster_threshold: Option<f64>,
    /// Seconds to wait before resubscribing after the report feed stops.
    pub resubscribe_delay_secs: Option<u64>,
    pub session_key_file: Option<PathBuf>,
    /// Whether session cookies are marked `Secure`.
    #[ortho_config(default = true, skip_cli)]
    pub cookie_secure: bool,
    /// Allow a generated session key when the key file is unreadable.
    #[ortho_config(default = false, skip_cli)]
    pub allow_ephemeral_session_key: bool,
    /// Origins allowed to open the report feed. The environment form is
    /// comma-separated.
    #[serde(default, deserialize_with = "one_or_many")]
    pub ws_origins: Option<Vec<String>>,
}

impl Default for CivicSettings {
    fn default() -> Self {
        Self {
            bind_addr: None,
            report_store: None,
            firestore_project: None,
            firestore_api_key: None,
            firestore_database: None,
            firestore_poll_secs: None,
            gemini_api_key: None,
            gemini_base_url: None,
            gemini_model: None,
            gemini_timeout_secs: None,
            profile_dir: None,
            welcome_points: None,
            cluster_threshold: None,
            resubscribe_delay_secs: None,
            session_key_file: None,
            cookie_secure: true,
            allow_ephemeral_session_key: false,
            ws_origins: None,
        }
    }
}

/// A lone value without commas arrives as a plain string.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Values {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<Values>::deserialize(deserializer)?.map(|values| match values {
        Values::One(value) => vec![value],
        Values::Many(values) => values,
    }))
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

impl CivicSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = non_blank(self.bind_addr.as_ref()).unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::Invalid {
            name: "CIVIC_BIND_ADDR",
            value: raw.to_owned(),
            expected: "host:port",
        })
    }

    pub fn report_store(&self) -> Result<ReportStoreKind, SettingsError> {
        match non_blank(self.report_store.as_ref()) {
            None => Ok(ReportStoreKind::Memory),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "memory" => Ok(ReportStoreKind::Memory),
                "firestore" => Ok(ReportStoreKind::Firestore),
                _ => Err(SettingsError::Invalid {
                    name: "CIVIC_REPORT_STORE",
                    value: raw.to_owned(),
                    expected: "memory|firestore",
                }),
            },
        }
    }

    /// Firestore connection settings. Requires a project id.
    pub fn firestore_config(&self) -> Result<FirestoreConfig, SettingsError> {
        let project = non_blank(self.firestore_project.as_ref()).ok_or(SettingsError::Missing {
            name: "CIVIC_FIRESTORE_PROJECT",
            reason: "the firestore report store is selected",
        })?;
        let mut config = FirestoreConfig::new(project).map_err(|source| SettingsError::Url {
            name: "firestore base url",
            source,
        })?;
        config.api_key = non_blank(self.firestore_api_key.as_ref()).map(str::to_owned);
        if let Some(database) = non_blank(self.firestore_database.as_ref()) {
            config.database = database.to_owned();
        }
        if let Some(secs) = self.firestore_poll_secs {
            config.poll_interval = positive_secs("CIVIC_FIRESTORE_POLL_SECS", secs)?;
        }
        Ok(config)
    }

    /// Gemini settings, or `None` when no API key is configured.
    pub fn gemini_config(&self) -> Result<Option<GeminiConfig>, SettingsError> {
        let Some(api_key) = non_blank(self.gemini_api_key.as_ref()) else {
            return Ok(None);
        };
        let mut config = GeminiConfig::new(api_key).map_err(|source| SettingsError::Url {
            name: "gemini base url",
            source,
        })?;
        if let Some(raw) = non_blank(self.gemini_base_url.as_ref()) {
            config.base_url = Url::parse(raw).map_err(|source| SettingsError::Url {
                name: "CIVIC_GEMINI_BASE_URL",
                source,
            })?;
        }
        if let Some(model) = non_blank(self.gemini_model.as_ref()) {
            config.vision_model = model.to_owned();
            config.transcription_model = model.to_owned();
            config.chat_model = model.to_owned();
        }
        if let Some(secs) = self.gemini_timeout_secs {
            config.timeout = positive_secs("CIVIC_GEMINI_TIMEOUT_SECS", secs)?;
        }
        Ok(Some(config))
    }

    pub fn profile_dir(&self) -> Option<Utf8PathBuf> {
        non_blank(self.profile_dir.as_ref()).map(Utf8PathBuf::from)
    }

    pub fn welcome_points(&self) -> Result<i64, SettingsError> {
        match self.welcome_points {
            None => Ok(0),
            Some(points) if points >= 0 => Ok(points),
            Some(points) => Err(SettingsError::Invalid {
                name: "CIVIC_WELCOME_POINTS",
                value: points.to_string(),
                expected: "a non-negative integer",
            }),
        }
    }

    pub fn cluster_threshold(&self) -> Result<f64, SettingsError> {
        match self.cluster_threshold {
            None => Ok(DEFAULT_CLUSTER_THRESHOLD),
            Some(threshold) if threshold.is_finite() && threshold > 0.0 => Ok(threshold),
            Some(threshold) => Err(SettingsError::Invalid {
                name: "CIVIC_CLUSTER_THRESHOLD",
                value: threshold.to_string(),
                expected: "a positive number of degrees",
            }),
        }
    }

    pub fn resubscribe_delay(&self) -> Duration {
        Duration::from_secs(
            self.resubscribe_delay_secs
                .unwrap_or(DEFAULT_RESUBSCRIBE_SECS),
        )
    }

    pub fn session_key_file(&self) -> PathBuf {
        self.session_key_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_KEY_PATH))
    }

    pub fn ws_origins(&self) -> Vec<String> {
        self.ws_origins
            .iter()
            .flatten()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, SettingsError> {
    if secs == 0 {
        return Err(SettingsError::Invalid {
            name,
            value: secs.to_string(),
            expected: "a positive number of seconds",
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    //! Settings parsing against the process environment.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 9] = [
        "CIVIC_BIND_ADDR",
        "CIVIC_REPORT_STORE",
        "CIVIC_FIRESTORE_PROJECT",
        "CIVIC_GEMINI_API_KEY",
        "CIVIC_WELCOME_POINTS",
        "CIVIC_CLUSTER_THRESHOLD",
        "CIVIC_WS_ORIGINS",
        "CIVIC_ALLOW_EPHEMERAL_SESSION_KEY",
        "CIVIC_COOKIE_SECURE",
    ];

    fn load() -> CivicSettings {
        CivicSettings::load_from_iter([OsString::from("civic-backend")])
            .expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared());

        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("socket address")
        );
        assert_eq!(
            settings.report_store().expect("store kind"),
            ReportStoreKind::Memory
        );
        assert!(settings.gemini_config().expect("gemini").is_none());
        assert_eq!(settings.welcome_points().expect("points"), 0);
        assert_eq!(
            settings.cluster_threshold().expect("threshold"),
            DEFAULT_CLUSTER_THRESHOLD
        );
        assert!(settings.cookie_secure);
        assert!(!settings.allow_ephemeral_session_key);
        assert!(settings.ws_origins().is_empty());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        vars.extend([
            ("CIVIC_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            ("CIVIC_REPORT_STORE", Some("Firestore".to_owned())),
            ("CIVIC_FIRESTORE_PROJECT", Some("civic-pulse".to_owned())),
            ("CIVIC_GEMINI_API_KEY", Some("secret".to_owned())),
            ("CIVIC_WELCOME_POINTS", Some("100".to_owned())),
            (
                "CIVIC_WS_ORIGINS",
                Some("https://civic.example, https://ops.civic.example".to_owned()),
            ),
            ("CIVIC_ALLOW_EPHEMERAL_SESSION_KEY", Some("true".to_owned())),
            ("CIVIC_COOKIE_SECURE", Some("false".to_owned())),
        ]);
        let _guard = lock_env(vars);

        let settings = load();
        assert_eq!(
            settings.bind_addr().expect("address").port(),
            9000
        );
        assert_eq!(
            settings.report_store().expect("store kind"),
            ReportStoreKind::Firestore
        );
        assert_eq!(
            settings.firestore_config().expect("firestore").project_id,
            "civic-pulse"
        );
        let gemini = settings.gemini_config().expect("gemini").expect("enabled");
        assert_eq!(gemini.api_key, "secret");
        assert_eq!(settings.welcome_points().expect("points"), 100);
        assert_eq!(
            settings.ws_origins(),
            vec!["https://civic.example", "https://ops.civic.example"]
        );
        assert!(settings.allow_ephemeral_session_key);
        assert!(!settings.cookie_secure);
    }

    #[rstest]
    fn a_single_origin_needs_no_comma() {
        let mut vars = cleared();
        vars.push(("CIVIC_WS_ORIGINS", Some("https://civic.example".to_owned())));
        let _guard = lock_env(vars);

        assert_eq!(load().ws_origins(), vec!["https://civic.example"]);
    }

    #[rstest]
    fn command_line_flags_leave_session_toggles_alone() {
        let mut vars = cleared();
        vars.push(("CIVIC_ALLOW_EPHEMERAL_SESSION_KEY", Some("true".to_owned())));
        let _guard = lock_env(vars);

        let settings = CivicSettings::load_from_iter([
            OsString::from("civic-backend"),
            OsString::from("--bind-addr"),
            OsString::from("127.0.0.1:9100"),
        ])
        .expect("config should load");

        assert_eq!(settings.bind_addr().expect("address").port(), 9100);
        assert!(settings.cookie_secure);
        assert!(settings.allow_ephemeral_session_key);
    }

    #[rstest]
    fn firestore_requires_a_project() {
        let settings = CivicSettings {
            report_store: Some("firestore".to_owned()),
            ..CivicSettings::default()
        };
        assert!(matches!(
            settings.firestore_config(),
            Err(SettingsError::Missing { name: "CIVIC_FIRESTORE_PROJECT", .. })
        ));
    }

    #[rstest]
    #[case(CivicSettings { report_store: Some("postgres".into()), ..CivicSettings::default() })]
    #[case(CivicSettings { bind_addr: Some("port 80".into()), ..CivicSettings::default() })]
    #[case(CivicSettings { welcome_points: Some(-5), ..CivicSettings::default() })]
    #[case(CivicSettings { cluster_threshold: Some(0.0), ..CivicSettings::default() })]
    #[case(CivicSettings { firestore_project: Some("p".into()), firestore_poll_secs: Some(0), ..CivicSettings::default() })]
    fn invalid_values_are_rejected(#[case] settings: CivicSettings) {
        let outcomes = [
            settings.report_store().err(),
            settings.bind_addr().err(),
            settings.welcome_points().err(),
            settings.cluster_threshold().err(),
            settings.firestore_config().err(),
        ];
        assert!(
            outcomes
                .iter()
                .flatten()
                .any(|error| matches!(error, SettingsError::Invalid { .. })),
            "expected an invalid-value error"
        );
    }
}
