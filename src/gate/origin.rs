/// The origin allow-list for the proxy endpoints.
///
/// Localhost and loopback origins are always allowed so local development
/// works without configuration; everything else must match one of the
/// configured production host patterns.
#[derive(Clone, Debug, Default)]
pub struct OriginPolicy {
    patterns: Vec<String>,
}

impl OriginPolicy {
    /// Creates a new `OriginPolicy`.
    ///
    /// # Arguments
    ///
    /// * `patterns` - Substring patterns for allowed production hosts.
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Checks whether a declared origin (or referrer) is allowed.
    ///
    /// # Arguments
    ///
    /// * `origin` - The `Origin` or `Referer` header value, if present.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        let Some(origin) = origin else {
            return false;
        };

        if origin.contains("localhost")
            || origin.contains("127.0.0.1")
            || origin.contains("[::1]")
        {
            return true;
        }

        self.patterns.iter().any(|p| origin.contains(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OriginPolicy {
        OriginPolicy::new(vec!["crisper-recipes.example.app".to_string()])
    }

    #[test]
    fn localhost_always_allowed() {
        let policy = policy();
        assert!(policy.is_allowed(Some("http://localhost:5173")));
        assert!(policy.is_allowed(Some("http://127.0.0.1:3000")));
        assert!(policy.is_allowed(Some("http://[::1]:3000")));
    }

    #[test]
    fn configured_host_allowed() {
        assert!(policy().is_allowed(Some("https://crisper-recipes.example.app")));
    }

    #[test]
    fn unknown_origin_rejected() {
        assert!(!policy().is_allowed(Some("https://evil.example.com")));
    }

    #[test]
    fn missing_origin_rejected() {
        assert!(!policy().is_allowed(None));
    }

    #[test]
    fn empty_policy_still_allows_loopback() {
        let policy = OriginPolicy::default();
        assert!(policy.is_allowed(Some("http://localhost:5173")));
        assert!(!policy.is_allowed(Some("https://anything.example.com")));
    }
}
