//! Secret references for values in `config.toml`.
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the value of `$VAR_NAME`
//! - anything else: used as-is

use thiserror::Error;

/// A secret reference could not be resolved.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    /// `pass` could not be run or exited with an error.
    #[error("`pass show {path}` failed: {reason}")]
    Pass { path: String, reason: String },

    /// `pass` succeeded but printed nothing.
    #[error("`pass show {path}` produced no output")]
    PassEmpty { path: String },

    /// The referenced environment variable is unset.
    #[error("environment variable `{var}` is not set")]
    EnvMissing { var: String },
}

/// A parsed config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// Password-store entry.
    Pass(&'a str),
    /// Environment variable.
    Env(&'a str),
    /// Literal value.
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    /// Parses a value, recognizing the `pass::` and `env::` prefixes.
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Returns true for literal values, which must not be echoed back.
    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    /// Resolves the reference to its value.
    pub fn resolve(&self) -> Result<String, SecretError> {
        match *self {
            Self::Pass(path) => resolve_pass(path),
            Self::Env(var) => std::env::var(var).map_err(|_| SecretError::EnvMissing {
                var: var.to_string(),
            }),
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Parses and resolves `value` in one step.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    SecretRef::parse(value).resolve()
}

fn resolve_pass(path: &str) -> Result<String, SecretError> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| SecretError::Pass {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SecretError::Pass {
            path: path.to_string(),
            reason: format!("exit {}: {}", output.status, stderr.trim()),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| SecretError::PassEmpty {
            path: path.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prefixes() {
        assert_eq!(SecretRef::parse("pass::tianapi/key"), SecretRef::Pass("tianapi/key"));
        assert_eq!(SecretRef::parse("env::TIAN_KEY"), SecretRef::Env("TIAN_KEY"));
        assert_eq!(SecretRef::parse("abc123"), SecretRef::Plain("abc123"));
        assert!(SecretRef::parse("abc123").is_plain());
        assert!(!SecretRef::parse("env::X").is_plain());
    }

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("0123456789abcdef").unwrap(), "0123456789abcdef");
        assert_eq!(resolve("").unwrap(), "");
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_TIANHOLIDAY_TEST_SECRET", "from-env");
        }
        assert_eq!(resolve("env::_TIANHOLIDAY_TEST_SECRET").unwrap(), "from-env");
        unsafe {
            std::env::remove_var("_TIANHOLIDAY_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let err = resolve("env::_TIANHOLIDAY_NONEXISTENT_VAR_12345").unwrap_err();
        assert_eq!(
            err,
            SecretError::EnvMissing {
                var: "_TIANHOLIDAY_NONEXISTENT_VAR_12345".to_string()
            }
        );
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn pass_prefix_missing_entry_errors() {
        // Fails whether or not `pass` is installed.
        assert!(resolve("pass::nonexistent/tianholiday/entry/12345").is_err());
    }
}
