use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global fmt subscriber. `RUST_LOG` wins when set, else `coffee_payer=info`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("coffee_payer=info"));

        // A subscriber may already be set (e.g. by a test harness)
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_does_not_panic() {
        super::init_tracing();
        super::init_tracing();
    }
}
