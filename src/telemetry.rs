use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    if config.json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .try_init()?;
    }

    tracing::debug!(json = config.json, "listflow telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span around a single action-button click
pub fn create_click_span(
    record_id: &str,
    action: &str,
    assignee: Option<&str>,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "action_click",
        record.id = record_id,
        action = action,
        assignee = assignee,
        correlation.id = correlation_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_unique() {
        let a = generate_correlation_id();
        let b = generate_correlation_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
