//! Subdomain extraction from the `Host` header.

use std::net::IpAddr;

/// Leading labels that never name a brand.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin"];

/// Extract the brand subdomain from a request host.
///
/// The port is stripped and the host lower-cased. When `base_domain` is
/// configured, only hosts of the form `<label>.<base_domain>` carry a
/// subdomain. Without it, a host carries a subdomain when it has more than two
/// labels (`acme.model2design.com`) or two labels ending in `localhost`
/// (`acme.localhost`). IP literals and reserved labels yield `None`.
///
/// # Example
///
/// ```rust
/// # use model2design_core::extract_subdomain;
/// assert_eq!(extract_subdomain("Acme.Model2Design.com:8000", None).as_deref(), Some("acme"));
/// assert_eq!(extract_subdomain("www.model2design.com", None), None);
/// assert_eq!(extract_subdomain("model2design.com", None), None);
/// ```
#[must_use]
pub fn extract_subdomain(host: &str, base_domain: Option<&str>) -> Option<String> {
    let host = strip_port(host.trim()).to_ascii_lowercase();
    let host = host.trim_end_matches('.');
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let candidate = match base_domain.map(|d| d.trim().trim_matches('.').to_ascii_lowercase()) {
        Some(base) if !base.is_empty() => {
            let prefix = host.strip_suffix(base.as_str())?.strip_suffix('.')?;
            // Only the label directly left of the base domain counts.
            prefix.rsplit('.').next()?
        }
        _ => {
            let labels: Vec<&str> = host.split('.').collect();
            let has_subdomain = labels.len() > 2
                || (labels.len() == 2 && labels.last().is_some_and(|l| *l == "localhost"));
            if !has_subdomain {
                return None;
            }
            labels.first().copied()?
        }
    };

    if candidate.is_empty() || RESERVED_SUBDOMAINS.contains(&candidate) {
        return None;
    }
    Some(candidate.to_owned())
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, with or without a port.
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    // A bare IPv6 literal has several colons and no port.
    if host.matches(':').count() > 1 {
        return host;
    }
    host.split(':').next().unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_from_three_labels() {
        assert_eq!(extract_subdomain("acme.model2design.com", None).as_deref(), Some("acme"));
        assert_eq!(
            extract_subdomain("ACME.model2design.com:443", None).as_deref(),
            Some("acme")
        );
    }

    #[test]
    fn test_localhost_subdomain() {
        assert_eq!(extract_subdomain("acme.localhost:8000", None).as_deref(), Some("acme"));
        assert_eq!(extract_subdomain("localhost:8000", None), None);
    }

    #[test]
    fn test_apex_and_reserved() {
        assert_eq!(extract_subdomain("model2design.com", None), None);
        assert_eq!(extract_subdomain("www.model2design.com", None), None);
        assert_eq!(extract_subdomain("api.model2design.com", None), None);
        assert_eq!(extract_subdomain("admin.localhost", None), None);
    }

    #[test]
    fn test_ip_literals() {
        assert_eq!(extract_subdomain("127.0.0.1:3000", None), None);
        assert_eq!(extract_subdomain("10.0.0.12", None), None);
        assert_eq!(extract_subdomain("[::1]:3000", None), None);
        assert_eq!(extract_subdomain("::1", None), None);
    }

    #[test]
    fn test_configured_base_domain() {
        let base = Some("shop.example.co.uk");
        assert_eq!(
            extract_subdomain("acme.shop.example.co.uk", base).as_deref(),
            Some("acme")
        );
        assert_eq!(
            extract_subdomain("x.acme.shop.example.co.uk", base).as_deref(),
            Some("acme")
        );
        assert_eq!(extract_subdomain("shop.example.co.uk", base), None);
        assert_eq!(extract_subdomain("acme.other.com", base), None);
        assert_eq!(extract_subdomain("www.shop.example.co.uk", base), None);
    }
}
