use std::fs;
use std::path::PathBuf;

use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::graph::GRAPH_BASE;

pub const DEFAULT_SCOPES: [&str; 2] = ["User.Read", "Mail.Read"];
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;
pub const DEFAULT_FOLDER: &str = "Inbox";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Everything one report run needs. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub folder_path: String,
    pub lookback_days: u32,
    pub keyword: Option<String>,
    pub scopes: Vec<String>,
    pub output_path: PathBuf,
    pub timezone: Tz,
    pub graph_base: String,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    folder_path: Option<String>,
    lookback_days: Option<u32>,
    keyword: Option<String>,
    scopes: Option<Vec<String>>,
    output_path: Option<PathBuf>,
    timezone: Option<String>,
    graph_base: Option<String>,
}

impl RunConfigBuilder {
    pub fn folder_path(mut self, path: impl Into<String>) -> Self {
        self.folder_path = Some(path.into());
        self
    }

    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = Some(days);
        self
    }

    pub fn keyword(mut self, keyword: Option<impl Into<String>>) -> Self {
        self.keyword = keyword.map(Into::into);
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// IANA name, e.g. `Europe/Berlin`.
    pub fn timezone(mut self, name: impl Into<String>) -> Self {
        self.timezone = Some(name.into());
        self
    }

    pub fn graph_base(mut self, base: impl Into<String>) -> Self {
        self.graph_base = Some(base.into());
        self
    }

    pub fn build(self) -> Result<RunConfig> {
        let keyword = validate_keyword(self.keyword.as_deref())?;

        let timezone = match self.timezone.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_TIMEZONE,
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| Error::config(format!("unknown timezone '{name}'")))?,
        };

        let output_path = self
            .output_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::config("output path is required"))?;

        let scopes = self
            .scopes
            .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(ToString::to_string).collect());
        if scopes.is_empty() {
            return Err(Error::config("at least one permission scope is required"));
        }

        Ok(RunConfig {
            folder_path: self.folder_path.unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            lookback_days: self.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
            keyword,
            scopes,
            output_path,
            timezone,
            graph_base: self.graph_base.unwrap_or_else(|| GRAPH_BASE.to_string()),
        })
    }
}

/// Only a single keyword is supported; blank means no filter.
pub fn validate_keyword(raw: Option<&str>) -> Result<Option<String>> {
    let Some(keyword) = raw.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    if keyword.contains(',') {
        return Err(Error::config(
            "only one keyword allowed; remove commas (example: --keywords invoice)",
        ));
    }
    Ok(Some(keyword.to_string()))
}

/// Identity of the registered public client application.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    pub tenant: String,
}

impl AuthConfig {
    pub fn new(client_id: Option<&str>, tenant: Option<&str>) -> Result<Self> {
        let client_id = client_id
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::config("CLIENT_ID missing. Set it in .env or pass --client-id"))?;
        let tenant = tenant
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("common");
        Ok(Self {
            client_id: client_id.to_string(),
            tenant: tenant.to_string(),
        })
    }

    pub fn authority(&self) -> String {
        format!("https://login.microsoftonline.com/{}", self.tenant)
    }
}

/// Per-user state directory, created on first use.
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| Error::config("no config dir available"))?
        .join(env!("CARGO_PKG_NAME"));
    fs::create_dir_all(&dir)
        .map_err(|e| Error::config(format!("cannot create {}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RunConfigBuilder {
        RunConfig::builder().output_path("report.csv")
    }

    #[test]
    fn test_defaults() {
        let cfg = base().build().unwrap();
        assert_eq!(cfg.folder_path, "Inbox");
        assert_eq!(cfg.lookback_days, 7);
        assert!(cfg.keyword.is_none());
        assert_eq!(cfg.scopes, vec!["User.Read", "Mail.Read"]);
        assert_eq!(cfg.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(cfg.graph_base, GRAPH_BASE);
    }

    #[test]
    fn test_keyword_with_comma_is_rejected() {
        let err = base().keyword(Some("invoice,refund")).build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("only one keyword"));
    }

    #[test]
    fn test_blank_keyword_means_none() {
        assert!(base().keyword(Some("   ")).build().unwrap().keyword.is_none());
        assert_eq!(
            base().keyword(Some(" invoice ")).build().unwrap().keyword.as_deref(),
            Some("invoice")
        );
    }

    #[test]
    fn test_timezone_is_validated() {
        let cfg = base().timezone("Europe/Berlin").build().unwrap();
        assert_eq!(cfg.timezone, chrono_tz::Europe::Berlin);
        assert!(matches!(base().timezone("Mars/Olympus").build(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_output_path_required() {
        assert!(matches!(RunConfig::builder().build(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_empty_scopes_rejected() {
        let none: [&str; 0] = [];
        assert!(matches!(base().scopes(none).build(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_client_id_required() {
        assert!(matches!(AuthConfig::new(None, None), Err(Error::Config { .. })));
        assert!(matches!(AuthConfig::new(Some(" "), None), Err(Error::Config { .. })));
        let auth = AuthConfig::new(Some("abc"), None).unwrap();
        assert_eq!(auth.authority(), "https://login.microsoftonline.com/common");
    }
}
