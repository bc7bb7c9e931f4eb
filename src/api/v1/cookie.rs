use std::fmt;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::None => "None",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("SameSite must be None, Lax, or Strict, got: {0}")]
pub struct UnknownSameSite(String);

impl std::str::FromStr for SameSite {
    type Err = UnknownSameSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(SameSite::None),
            "Lax" => Ok(SameSite::Lax),
            "Strict" => Ok(SameSite::Strict),
            other => Err(UnknownSameSite(other.to_string())),
        }
    }
}

// Session cookies on purpose: no Max-Age while a credential is live. The
// token's signed expiry bounds its real lifetime, not the cookie's.

pub fn access_token_cookie(token: &str, settings: &CookieSettings) -> String {
    build(ACCESS_TOKEN_COOKIE, token, settings, None)
}

pub fn refresh_token_cookie(token: &str, settings: &CookieSettings) -> String {
    build(REFRESH_TOKEN_COOKIE, token, settings, None)
}

/// Overwrite with an immediately-expiring cookie (logout).
pub fn expire_access_token_cookie(settings: &CookieSettings) -> String {
    build(ACCESS_TOKEN_COOKIE, "", settings, Some(0))
}

pub fn expire_refresh_token_cookie(settings: &CookieSettings) -> String {
    build(REFRESH_TOKEN_COOKIE, "", settings, Some(0))
}

fn build(name: &str, value: &str, settings: &CookieSettings, max_age: Option<u64>) -> String {
    let mut parts = vec![format!("{}={}", name, value), "Path=/".to_string()];
    if let Some(age) = max_age {
        parts.push(format!("Max-Age={}", age));
    }
    if settings.http_only {
        parts.push("HttpOnly".to_string());
    }
    if settings.secure {
        parts.push("Secure".to_string());
    }
    parts.push(format!("SameSite={}", settings.same_site));
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings {
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
        }
    }

    #[test]
    fn live_cookie_has_the_hardening_attributes() {
        let cookie = access_token_cookie("tok123", &settings());
        assert_eq!(
            cookie,
            "access_token=tok123; Path=/; HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn attributes_follow_the_settings() {
        let cookie = refresh_token_cookie(
            "tok456",
            &CookieSettings {
                http_only: false,
                secure: false,
                same_site: SameSite::Strict,
            },
        );
        assert_eq!(cookie, "refresh_token=tok456; Path=/; SameSite=Strict");
    }

    #[test]
    fn expiring_cookie_is_blank_with_zero_max_age() {
        let cookie = expire_access_token_cookie(&settings());
        assert!(cookie.starts_with("access_token=; "));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn same_site_parses_only_the_three_policies() {
        assert_eq!("Lax".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert_eq!("None".parse::<SameSite>().unwrap(), SameSite::None);
        assert_eq!("Strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert!("lax".parse::<SameSite>().is_err());
    }
}
