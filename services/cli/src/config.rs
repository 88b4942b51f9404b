use std::env;

/// Environment-driven settings for the command-line front end.
#[derive(Debug, Clone)]
pub(crate) struct CliConfig {
    pub(crate) log_level: String,
}

impl CliConfig {
    pub(crate) fn load() -> Self {
        dotenvy::dotenv().ok();

        let log_level = env::var("CANOPY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        Self { log_level }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn defaults_to_info_level() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::remove_var("CANOPY_LOG_LEVEL");
        assert_eq!(CliConfig::load().log_level, "info");
    }

    #[test]
    fn honors_explicit_level() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        env::set_var("CANOPY_LOG_LEVEL", "debug");
        assert_eq!(CliConfig::load().log_level, "debug");
        env::remove_var("CANOPY_LOG_LEVEL");
    }
}
