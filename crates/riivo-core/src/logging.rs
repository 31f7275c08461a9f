use crate::config::CoreConfig;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging(cfg: &CoreConfig) {
    let fallback = cfg.logging.filter.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
