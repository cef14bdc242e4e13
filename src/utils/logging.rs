use tracing_subscriber::EnvFilter;

pub fn init_logging() {
    // Init logging using tracing subscriber with ENV and some backup default
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();
}
