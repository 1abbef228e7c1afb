use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Environment variable holding a filter directive that overrides `-v` flags
pub const LOG_ENV: &str = "WORDFALL_LOG";

/// Default directive for a `-v` count. Zero keeps only warnings.
pub fn directive_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "wordfall=warn",
        1 => "wordfall=info",
        2 => "wordfall=debug",
        _ => "wordfall=trace",
    }
}

/// Install the global subscriber, writing to stderr
pub fn init(verbosity: u8) -> Result<(), SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(directive_for(verbosity)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(directive_for(0), "wordfall=warn");
        assert_eq!(directive_for(2), "wordfall=debug");
        assert_eq!(directive_for(9), "wordfall=trace");
    }

    #[test]
    fn test_directives_parse() {
        for v in 0..4 {
            assert!(directive_for(v).parse::<EnvFilter>().is_ok());
        }
    }
}
