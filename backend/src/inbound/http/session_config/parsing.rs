//! Reads session toggles under the debug/release policy.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SAMESITE_ENV, SessionConfigError};

const FLAG_VALUES: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_VALUES: &str = "Strict|Lax|None";

/// Environment access that knows how strict to be.
///
/// Debug builds log the problem and continue with a fallback; release builds
/// return it as an error.
pub(super) struct ModePolicy<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<'a, E: Env> ModePolicy<'a, E> {
    pub(super) const fn new(env: &'a E, mode: BuildMode) -> Self {
        Self { env, mode }
    }

    pub(super) const fn mode(&self) -> BuildMode {
        self.mode
    }

    pub(super) fn string(&self, name: &str) -> Option<String> {
        self.env.string(name)
    }

    pub(super) fn tolerate<T>(
        &self,
        fallback: T,
        problem: SessionConfigError,
    ) -> Result<T, SessionConfigError> {
        if self.mode.is_debug() {
            warn!(problem = %problem, "session setting ignored in debug build");
            Ok(fallback)
        } else {
            Err(problem)
        }
    }

    pub(super) fn flag(&self, name: &'static str, default: bool) -> Result<bool, SessionConfigError> {
        let Some(raw) = self.string(name) else {
            return self.tolerate(default, SessionConfigError::MissingEnv { name });
        };
        match parse_flag(&raw) {
            Some(flag) => Ok(flag),
            None => self.tolerate(
                default,
                SessionConfigError::InvalidEnv {
                    name,
                    value: raw,
                    expected: FLAG_VALUES,
                },
            ),
        }
    }

    /// `Lax` in debug and `Strict` in release when unset or unreadable.
    pub(super) fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let default = if self.mode.is_debug() {
            SameSite::Lax
        } else {
            SameSite::Strict
        };
        let Some(raw) = self.string(SAMESITE_ENV) else {
            return self.tolerate(default, SessionConfigError::MissingEnv { name: SAMESITE_ENV });
        };
        match raw.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if cookie_secure => Ok(SameSite::None),
            "none" => self.tolerate(SameSite::None, SessionConfigError::InsecureSameSiteNone),
            _ => self.tolerate(
                default,
                SessionConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value: raw,
                    expected: SAMESITE_VALUES,
                },
            ),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
