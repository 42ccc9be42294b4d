//! Paths the CSRF gate lets through untouched.

use http::Method;
use std::sync::Arc;

type Matcher = dyn Fn(&Method, &str) -> bool + Send + Sync;

/// A named predicate over (method, path).
#[derive(Clone)]
pub struct ExemptionRule {
    name: String,
    matcher: Arc<Matcher>,
}

impl std::fmt::Debug for ExemptionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExemptionRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ExemptionRule {
    pub fn path_prefix(name: &str, prefix: &str) -> Self {
        let prefix = prefix.to_string();
        Self::predicate(name, move |_, path| path.starts_with(&prefix))
    }

    pub fn exact_path(name: &str, exact: &str) -> Self {
        let exact = exact.to_string();
        Self::predicate(name, move |_, path| path == exact)
    }

    pub fn predicate<F>(name: &str, matcher: F) -> Self
    where
        F: Fn(&Method, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            matcher: Arc::new(matcher),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, method: &Method, path: &str) -> bool {
        (self.matcher)(method, path)
    }
}

/// Ordered list of exemption rules; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct ExemptionPolicy {
    rules: Vec<ExemptionRule>,
}

impl ExemptionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Webhooks (signature-verified elsewhere), the post-login token
    /// endpoint, and the login/register endpoints that run before any session
    /// exists.
    pub fn storefront_default() -> Self {
        Self::new()
            .with(ExemptionRule::path_prefix("webhooks", "/api/webhooks/"))
            .with(ExemptionRule::exact_path(
                "csrf-token-init",
                "/api/csrf-token-init",
            ))
            .with(ExemptionRule::exact_path("login", "/api/auth/login"))
            .with(ExemptionRule::exact_path("register", "/api/auth/register"))
    }

    pub fn with(mut self, rule: ExemptionRule) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: ExemptionRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[ExemptionRule] {
        &self.rules
    }

    /// Name of the first rule matching the request, if any.
    pub fn matching(&self, method: &Method, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(ExemptionRule::name)
    }

    pub fn is_exempt(&self, method: &Method, path: &str) -> bool {
        self.matching(method, path).is_some()
    }
}
