//! # Configuration
//!
//! A string key/value store with `app.set()` / `app.get()` access. Keys are
//! dotted (`http.port`, `auth.jwt.secret`). Hooks see an immutable
//! [`ConfigSnapshot`] taken when the call starts.
//!
//! Environment variables can be layered on with [`AppConfig::load_env`]:
//!
//! ```bash
//! export SHAKTI__CASES__MAX_UPLOAD_ROWS=500   # → cases.max_upload_rows
//! ```

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copies every variable starting with `prefix` into the store,
    /// `PREFIX__A__B_C` becoming `a.b_c`. Returns how many were applied.
    pub fn load_env(&mut self, prefix: &str) -> usize {
        self.load_vars(prefix, std::env::vars())
    }

    fn load_vars<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = 0;
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };
            let normalized = stripped
                .trim_start_matches('_')
                .to_lowercase()
                .replace("__", ".");
            if normalized.is_empty() {
                continue;
            }
            self.set(normalized, value);
            applied += 1;
        }
        applied
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_vars_map_to_dotted_keys() {
        let mut cfg = AppConfig::new();
        let applied = cfg.load_vars(
            "SHAKTI",
            vec![
                ("SHAKTI__HTTP__PORT".to_string(), "4000".to_string()),
                ("SHAKTI__CASES__MAX_UPLOAD_ROWS".to_string(), "50".to_string()),
                ("OTHER__HTTP__PORT".to_string(), "1".to_string()),
            ],
        );
        assert_eq!(applied, 2);
        assert_eq!(cfg.get("http.port"), Some("4000"));
        assert_eq!(cfg.snapshot().get_usize("cases.max_upload_rows"), Some(50));
    }

    #[test]
    fn bools_accept_common_spellings() {
        let mut cfg = AppConfig::new();
        cfg.set("a", "yes");
        cfg.set("b", "0");
        cfg.set("c", "maybe");
        let snap = cfg.snapshot();
        assert_eq!(snap.get_bool("a"), Some(true));
        assert_eq!(snap.get_bool("b"), Some(false));
        assert_eq!(snap.get_bool("c"), None);
        assert!(cfg.has("c"));
    }
}
