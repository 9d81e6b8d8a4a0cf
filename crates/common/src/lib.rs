//! Shared runtime helpers used by the workspace binaries and services.

pub mod types;
pub mod utils;

#[cfg(test)]
mod tests {
    use super::types::LogFormat;

    #[test]
    fn log_format_parses_known_values() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("pretty".parse::<LogFormat>().is_err());
    }
}
