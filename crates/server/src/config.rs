use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tracing::warn;

const DEFAULT_SESSION_SECRET: &str = "dev-session-secret";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub email_api_url: String,
    pub email_api_key_env: String,
    pub email_from: String,
    pub operator_email: String,
    pub site_name: String,
    pub admin_email: String,
    pub admin_password: String,
    pub session_secret: String,
    pub session_ttl_seconds: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/site.db".into(),
            email_api_url: "https://api.resend.com/emails".into(),
            email_api_key_env: "RESEND_API_KEY".into(),
            email_from: "Dennic Engineering <onboarding@resend.dev>".into(),
            operator_email: "your-email@example.com".into(),
            site_name: "Dennic Engineering".into(),
            admin_email: "admin@example.com".into(),
            admin_password: String::new(),
            session_secret: DEFAULT_SESSION_SECRET.into(),
            session_ttl_seconds: 8 * 3600,
        }
    }
}

impl Settings {
    pub fn warn_on_weak_defaults(&self) {
        if self.admin_password.is_empty() {
            warn!("admin password is not configured; admin sign-in is disabled");
        }
        if self.session_secret == DEFAULT_SESSION_SECRET {
            warn!("session secret is the development default; set APP__SESSION_SECRET");
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

/// Defaults, then `file` (flat keys), then environment. Later layers win.
pub fn load_settings_from(file: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match raw.parse::<toml::Table>() {
            Ok(table) => apply_file(&mut settings, &table),
            Err(error) => warn!(path = %file.display(), %error, "ignoring unparsable settings file"),
        }
    }

    let overrides: [(&[&str], &mut String); 10] = [
        (&["SERVER_BIND", "APP__BIND_ADDR"], &mut settings.server_bind),
        (&["DATABASE_URL", "APP__DATABASE_URL"], &mut settings.database_url),
        (&["APP__EMAIL_API_URL"], &mut settings.email_api_url),
        (&["APP__EMAIL_API_KEY_ENV"], &mut settings.email_api_key_env),
        (&["APP__EMAIL_FROM"], &mut settings.email_from),
        (&["OPERATOR_EMAIL", "APP__OPERATOR_EMAIL"], &mut settings.operator_email),
        (&["APP__SITE_NAME"], &mut settings.site_name),
        (&["ADMIN_EMAIL", "APP__ADMIN_EMAIL"], &mut settings.admin_email),
        (&["ADMIN_PASSWORD", "APP__ADMIN_PASSWORD"], &mut settings.admin_password),
        (&["SESSION_SECRET", "APP__SESSION_SECRET"], &mut settings.session_secret),
    ];
    for (keys, slot) in overrides {
        for key in keys.iter().copied() {
            if let Some(v) = env(key) {
                *slot = v;
            }
        }
    }

    if let Some(v) = env("APP__SESSION_TTL_SECONDS") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.session_ttl_seconds = parsed;
        }
    }

    settings
}

fn apply_file(settings: &mut Settings, table: &toml::Table) {
    let text = |key: &str| table.get(key).and_then(|v| v.as_str()).map(str::to_string);

    if let Some(v) = text("bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = text("database_url") {
        settings.database_url = v;
    }
    if let Some(v) = text("email_api_url") {
        settings.email_api_url = v;
    }
    if let Some(v) = text("email_api_key_env") {
        settings.email_api_key_env = v;
    }
    if let Some(v) = text("email_from") {
        settings.email_from = v;
    }
    if let Some(v) = text("operator_email") {
        settings.operator_email = v;
    }
    if let Some(v) = text("site_name") {
        settings.site_name = v;
    }
    if let Some(v) = text("admin_email") {
        settings.admin_email = v;
    }
    if let Some(v) = text("admin_password") {
        settings.admin_password = v;
    }
    if let Some(v) = text("session_secret") {
        settings.session_secret = v;
    }
    match table.get("session_ttl_seconds") {
        Some(toml::Value::Integer(ttl)) => settings.session_ttl_seconds = *ttl,
        Some(toml::Value::String(ttl)) => {
            if let Ok(parsed) = ttl.parse::<i64>() {
                settings.session_ttl_seconds = parsed;
            }
        }
        _ => {}
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        if is_windows_drive_path(path) {
            return format!("sqlite:{}", path.replace('\\', "/"));
        }
        return raw_database_url.to_string();
    }

    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    if is_windows_drive_path(&path) {
        return format!("sqlite:{path}");
    }
    format!("sqlite://{path}")
}

fn is_windows_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
