//! Signed-in user, their tenant, and how both survive a restart.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub tenant_id: String,
    #[serde(default)]
    pub role: String,
}

/// Brand colours, as CSS colour strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#3B82F6".to_string(),
            secondary: "#64748B".to_string(),
            accent: "#10B981".to_string(),
            background: "#F8FAFC".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Tenant {
    /// The tenant's theme, or the default palette.
    pub fn effective_theme(&self) -> Theme {
        self.theme.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub tenant: Tenant,
    pub token: String,
}

/// Anything holding named style properties, e.g. a document root.
pub trait ThemeSurface {
    fn set_property(&mut self, name: &str, value: &str);
    fn remove_property(&mut self, name: &str);
}

const THEME_PROPERTIES: [&str; 9] = [
    "--primary",
    "--secondary",
    "--accent",
    "--background",
    "--primary-foreground",
    "--secondary-foreground",
    "--accent-foreground",
    "--sidebar-primary",
    "--sidebar-accent",
];

const FOREGROUND: &str = "#ffffff";

pub fn apply_theme(surface: &mut dyn ThemeSurface, theme: &Theme) {
    surface.set_property("--primary", &theme.primary);
    surface.set_property("--secondary", &theme.secondary);
    surface.set_property("--accent", &theme.accent);
    surface.set_property("--background", &theme.background);
    surface.set_property("--primary-foreground", FOREGROUND);
    surface.set_property("--secondary-foreground", FOREGROUND);
    surface.set_property("--accent-foreground", FOREGROUND);
    surface.set_property("--sidebar-primary", &theme.primary);
    surface.set_property("--sidebar-accent", &theme.accent);
}

/// Remove every property `apply_theme` sets.
pub fn reset_theme(surface: &mut dyn ThemeSurface) {
    for name in THEME_PROPERTIES {
        surface.remove_property(name);
    }
}

/// Where a session lives between runs.
///
/// Load once at start-up, save after every login or tenant update, clear on
/// logout.
pub trait SessionStore {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&mut self, session: &Session) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Session persisted as one JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!("no session at {}", self.path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&text).map_err(|e| {
            PipelineError::Session(format!("{}: {e}", self.path.display()))
        })?;
        Ok(Some(session))
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        info!("saved session for {} to {}", session.user.email, self.path.display());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(self.session.clone())
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        self.session = Some(session.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.session = None;
        Ok(())
    }
}

/// Replace the tenant in a stored session and persist it.
pub fn update_tenant(store: &mut dyn SessionStore, tenant: Tenant) -> Result<Session> {
    let mut session = store
        .load()?
        .ok_or_else(|| PipelineError::Session("not signed in".to_string()))?;
    session.tenant = tenant;
    store.save(&session)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct StyleMap(BTreeMap<String, String>);

    impl ThemeSurface for StyleMap {
        fn set_property(&mut self, name: &str, value: &str) {
            self.0.insert(name.to_string(), value.to_string());
        }
        fn remove_property(&mut self, name: &str) {
            self.0.remove(name);
        }
    }

    fn session() -> Session {
        Session {
            user: User {
                id: "1".to_string(),
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                tenant_id: "t1".to_string(),
                role: "admin".to_string(),
            },
            tenant: Tenant {
                id: "t1".to_string(),
                name: "Padaria Central".to_string(),
                logo: String::new(),
                theme: None,
                settings: BTreeMap::new(),
            },
            token: "tok".to_string(),
        }
    }

    #[test]
    fn test_apply_and_reset_theme() {
        let mut style = StyleMap::default();
        style.set_property("--font", "serif");
        let theme = Theme {
            primary: "#111111".to_string(),
            ..Theme::default()
        };
        apply_theme(&mut style, &theme);
        assert_eq!(style.0["--primary"], "#111111");
        assert_eq!(style.0["--sidebar-primary"], "#111111");
        assert_eq!(style.0["--sidebar-accent"], "#10B981");
        assert_eq!(style.0["--accent-foreground"], "#ffffff");
        assert_eq!(style.0.len(), 10);

        reset_theme(&mut style);
        assert_eq!(style.0.len(), 1);
        assert!(style.0.contains_key("--font"));
    }

    #[test]
    fn test_effective_theme_defaults() {
        let tenant = session().tenant;
        assert_eq!(tenant.effective_theme().background, "#F8FAFC");
    }

    #[test]
    fn test_tenant_json_shape() {
        let json = r##"{"id":"t1","name":"X","theme":{"primary":"#000"}}"##;
        let tenant: Tenant = serde_json::from_str(json).unwrap();
        let theme = tenant.effective_theme();
        assert_eq!(theme.primary, "#000");
        assert_eq!(theme.secondary, "#64748B");
    }

    #[test]
    fn test_file_store_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = FileSessionStore::new(tmp.path().join("state/session.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, PipelineError::Session(_)));
    }

    #[test]
    fn test_update_tenant() {
        let mut store = MemorySessionStore::default();
        assert!(update_tenant(&mut store, session().tenant).is_err());

        store.save(&session()).unwrap();
        let mut tenant = session().tenant;
        tenant.name = "Padaria Nova".to_string();
        let updated = update_tenant(&mut store, tenant).unwrap();
        assert_eq!(updated.tenant.name, "Padaria Nova");
        assert_eq!(store.load().unwrap().unwrap().tenant.name, "Padaria Nova");
    }
}
