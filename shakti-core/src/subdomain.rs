//! Subdomain rules: extracting the tenant label from a request host and
//! validating labels chosen for new tenants.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MIN_LEN: usize = 3;
pub const MAX_LEN: usize = 63;

/// Labels that can never belong to a tenant.
pub const RESERVED: &[&str] = &[
    "www", "api", "admin", "app", "mail", "ftp", "localhost", "dashboard", "superadmin", "support",
    "help", "blog", "status", "static", "cdn",
];

const WEBCONTAINER_SUFFIX: &str = ".local-credentialless.webcontainer-api.io";

static WEBCONTAINER_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9]+)(?:-[a-z0-9]+)?--\d+--[a-z0-9]+\.local-credentialless\.webcontainer-api\.io$")
        .expect("static pattern")
});

static LEADING_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z0-9]+)").expect("static pattern"));

static LABEL_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").expect("static pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubdomainError {
    #[error("Subdomain is required")]
    Required,
    #[error("Subdomain must be at least 3 characters long")]
    TooShort,
    #[error("Subdomain must be less than 63 characters")]
    TooLong,
    #[error("Subdomain can only contain lowercase letters, numbers, and hyphens (cannot start or end with hyphen)")]
    InvalidFormat,
    #[error("This subdomain is reserved and cannot be used")]
    Reserved,
}

fn hostname(host: &str) -> String {
    host.trim()
        .split(':')
        .next()
        .unwrap_or_default()
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// The tenant label of a host, if it has one.
///
/// * `acme.localhost:5173` → `acme`
/// * `acme.example.com` → `acme`
/// * `example.com`, `localhost` → none
/// * WebContainer preview hosts use the leading token of the first label.
pub fn extract_subdomain(host: &str) -> Option<String> {
    let host = hostname(host);
    let parts: Vec<&str> = host.split('.').collect();

    if host.contains("localhost") {
        if parts.len() >= 2 && parts[1] == "localhost" {
            return non_empty(parts[0]);
        }
        return None;
    }

    if host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }

    if host.ends_with(WEBCONTAINER_SUFFIX) {
        if let Some(c) = WEBCONTAINER_HOST.captures(&host) {
            return c.get(1).and_then(|m| non_empty(m.as_str()));
        }
        return LEADING_LABEL
            .captures(&host)
            .and_then(|c| c.get(1))
            .and_then(|m| non_empty(m.as_str()));
    }

    if host.contains("webcontainer") {
        return None;
    }

    if parts.len() > 2 {
        return non_empty(parts[0]);
    }

    None
}

/// Registrable domain of a host: `localhost` and `127.0.0.1` as-is,
/// otherwise the last two labels.
pub fn extract_domain(host: &str) -> String {
    let host = hostname(host);
    if host == "localhost" || host == "127.0.0.1" {
        return host;
    }
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() <= 2 {
        return host;
    }
    parts[parts.len() - 2..].join(".")
}

pub fn is_main_domain(host: &str) -> bool {
    matches!(extract_subdomain(host).as_deref(), None | Some("www"))
}

/// The identifier to resolve a tenant by, `None` on the main domain.
pub fn tenant_identifier(host: &str) -> Option<String> {
    extract_subdomain(host).filter(|s| s != "www")
}

pub fn is_reserved(label: &str) -> bool {
    RESERVED.contains(&label.trim().to_ascii_lowercase().as_str())
}

pub fn validate_subdomain(label: &str) -> Result<(), SubdomainError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(SubdomainError::Required);
    }
    if label.len() < MIN_LEN {
        return Err(SubdomainError::TooShort);
    }
    if label.len() > MAX_LEN {
        return Err(SubdomainError::TooLong);
    }
    if !LABEL_FORMAT.is_match(label) {
        return Err(SubdomainError::InvalidFormat);
    }
    if is_reserved(label) {
        return Err(SubdomainError::Reserved);
    }
    Ok(())
}

/// Best-effort normalization of user input into a label.
pub fn sanitize_subdomain(input: &str) -> String {
    let lowered = input.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let mut out = out.trim_matches('-').to_string();
    out.truncate(MAX_LEN);
    out
}

/// Alternatives for a taken label, skipping anything `is_taken` reports or
/// that is reserved. At most five.
pub fn suggest_subdomains<F>(base: &str, is_taken: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let base = sanitize_subdomain(base);
    let numbered = (1..=5).map(|n| format!("{base}{n}"));
    let suffixed = ["inc", "co"].into_iter().map(|s| format!("{base}-{s}"));

    numbered
        .chain(suffixed)
        .filter(|c| validate_subdomain(c).is_ok() && !is_taken(c))
        .take(5)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_hosts() {
        assert_eq!(extract_subdomain("acme.localhost:5173").as_deref(), Some("acme"));
        assert_eq!(extract_subdomain("localhost:3000"), None);
        assert_eq!(extract_subdomain("127.0.0.1:3000"), None);
    }

    #[test]
    fn public_hosts() {
        assert_eq!(extract_subdomain("Acme.Shakti.io").as_deref(), Some("acme"));
        assert_eq!(extract_subdomain("shakti.io"), None);
        assert!(is_main_domain("www.shakti.io"));
        assert!(is_main_domain("shakti.io"));
        assert!(!is_main_domain("acme.shakti.io"));
        assert_eq!(tenant_identifier("www.shakti.io"), None);
        assert_eq!(extract_domain("acme.shakti.io:443"), "shakti.io");
        assert_eq!(extract_domain("localhost:8080"), "localhost");
    }

    #[test]
    fn webcontainer_hosts() {
        let host = "acme-x1y2--5173--96435430.local-credentialless.webcontainer-api.io";
        assert_eq!(extract_subdomain(host).as_deref(), Some("acme"));
        assert_eq!(extract_subdomain("preview.webcontainer.io"), None);
    }

    #[test]
    fn validation_messages() {
        assert_eq!(validate_subdomain(""), Err(SubdomainError::Required));
        assert_eq!(validate_subdomain("ab"), Err(SubdomainError::TooShort));
        assert_eq!(validate_subdomain(&"a".repeat(64)), Err(SubdomainError::TooLong));
        assert_eq!(validate_subdomain("-acme"), Err(SubdomainError::InvalidFormat));
        assert_eq!(validate_subdomain("Acme"), Err(SubdomainError::InvalidFormat));
        assert_eq!(validate_subdomain("admin"), Err(SubdomainError::Reserved));
        assert_eq!(
            SubdomainError::TooShort.to_string(),
            "Subdomain must be at least 3 characters long"
        );
        assert!(validate_subdomain("acme-finance").is_ok());
    }

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(sanitize_subdomain("  Acme  Finance!! "), "acmefinance");
        assert_eq!(sanitize_subdomain("--acme--loans--"), "acme-loans");
        assert_eq!(sanitize_subdomain(&"x".repeat(80)).len(), MAX_LEN);
    }

    #[test]
    fn suggestions_skip_taken() {
        let taken = ["acme1", "acme2"];
        let s = suggest_subdomains("acme", |c| taken.contains(&c));
        assert_eq!(s, vec!["acme3", "acme4", "acme5", "acme-inc", "acme-co"]);
    }
}
