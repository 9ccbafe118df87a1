//! Environment variable readers.
//!
//! Thin wrappers over `std::env` that turn the usual lookup-parse-default
//! dance into single calls returning [`crate::Result`].

use crate::{Result, ToolingError};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Read a variable, distinguishing "unset" from "set but not UTF-8".
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var_os(key) {
        None => Ok(None),
        Some(raw) => raw
            .into_string()
            .map(Some)
            .map_err(|_| ToolingError::General(format!("{} is set but is not valid UTF-8", key))),
    }
}

/// Read a variable, substituting `default` when it is unset.
pub fn get_env_or(key: &str, default: impl Into<String>) -> Result<String> {
    Ok(get_env(key)?.unwrap_or_else(|| default.into()))
}

/// Read a variable and parse it into any `FromStr` type.
///
/// An unset variable is `Ok(None)`; a set-but-unparseable one is an error
/// naming the variable and the offending value.
pub fn get_env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    get_env(key)?
        .map(|raw| {
            raw.parse::<T>().map_err(|e| {
                ToolingError::General(format!("{}={:?} does not parse: {}", key, raw, e))
            })
        })
        .transpose()
}

/// Read and parse a variable, substituting `default` when it is unset.
pub fn get_env_parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(get_env_parse(key)?.unwrap_or(default))
}

/// Read a variable as a boolean switch.
///
/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitively and
/// ignoring surrounding whitespace; anything else is an error.
pub fn get_env_bool(key: &str) -> Result<Option<bool>> {
    let Some(raw) = get_env(key)? else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        other => Err(ToolingError::General(format!(
            "{} expects a boolean switch, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sets a variable for the duration of one test body.
    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(key: &'static str, value: &str) -> Self {
            env::set_var(key, value);
            Self(key)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            env::remove_var(self.0);
        }
    }

    #[test]
    fn unset_variable_is_none() {
        assert_eq!(get_env("DATALAB_ENV_TEST_UNSET").unwrap(), None);
        let parsed: Option<u32> = get_env_parse("DATALAB_ENV_TEST_UNSET").unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn defaults_apply_only_when_unset() {
        assert_eq!(get_env_or("DATALAB_ENV_TEST_UNSET", "fallback").unwrap(), "fallback");

        let _guard = EnvVar::set("DATALAB_ENV_TEST_SET", "present");
        assert_eq!(get_env_or("DATALAB_ENV_TEST_SET", "fallback").unwrap(), "present");
    }

    #[test]
    fn parse_round_trip_and_failure() {
        let _guard = EnvVar::set("DATALAB_ENV_TEST_PORT", "8000");
        assert_eq!(get_env_parse_or("DATALAB_ENV_TEST_PORT", 0u16).unwrap(), 8000);

        let _guard = EnvVar::set("DATALAB_ENV_TEST_RATIO", "six tenths");
        let result: Result<Option<f64>> = get_env_parse("DATALAB_ENV_TEST_RATIO");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("DATALAB_ENV_TEST_RATIO"));
        assert!(message.contains("six tenths"));
    }

    #[test]
    fn parse_default_when_unset() {
        assert_eq!(get_env_parse_or("DATALAB_ENV_TEST_UNSET", 42i32).unwrap(), 42);
    }

    #[test]
    fn bool_switch_spellings() {
        for (spelling, expected) in [
            ("1", true),
            ("on", true),
            ("YES", true),
            (" true ", true),
            ("0", false),
            ("off", false),
            ("No", false),
            ("false", false),
        ] {
            let _guard = EnvVar::set("DATALAB_ENV_TEST_FLAG", spelling);
            assert_eq!(
                get_env_bool("DATALAB_ENV_TEST_FLAG").unwrap(),
                Some(expected),
                "spelling {:?}",
                spelling
            );
        }
    }

    #[test]
    fn bool_rejects_other_values() {
        let _guard = EnvVar::set("DATALAB_ENV_TEST_FLAG_BAD", "enabled-ish");
        assert!(get_env_bool("DATALAB_ENV_TEST_FLAG_BAD").is_err());
    }
}
