//! Central configuration for the storefront-session crate

use std::sync::LazyLock;

/// Deployment environment, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl AppEnv {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn cookie_security(self) -> CookieSecurity {
        match self {
            Self::Production => CookieSecurity::Strict,
            Self::Development | Self::Test => CookieSecurity::Relaxed,
        }
    }
}

/// Cookie attributes that depend on the deployment.
///
/// Production cookies are `Secure; SameSite=Strict`, everything else is
/// `SameSite=Lax` over plain HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieSecurity {
    Strict,
    Relaxed,
}

impl CookieSecurity {
    pub(crate) fn same_site(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Relaxed => "Lax",
        }
    }

    pub(crate) fn secure(self) -> bool {
        matches!(self, Self::Strict)
    }
}

pub static APP_ENV: LazyLock<AppEnv> = LazyLock::new(|| {
    std::env::var("APP_ENV")
        .map(|v| AppEnv::parse(&v))
        .unwrap_or(AppEnv::Development)
});
