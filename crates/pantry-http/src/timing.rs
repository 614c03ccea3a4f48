//! `Server-Timing` response header.

use std::fmt::Write as _;
use std::time::Duration;

use http::HeaderValue;

/// Response header carrying per-step durations.
pub const SERVER_TIMING: &str = "server-timing";

#[derive(Debug, Clone)]
struct Metric {
    name: &'static str,
    description: Option<String>,
    duration: Duration,
}

/// Durations of the pipeline steps of one request.
#[derive(Debug, Clone, Default)]
pub struct ServerTiming {
    metrics: Vec<Metric>,
}

impl ServerTiming {
    /// Create an empty timing record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how long step `name` took.
    pub fn record(&mut self, name: &'static str, description: Option<&str>, duration: Duration) {
        self.metrics.push(Metric {
            name,
            description: description.map(str::to_owned),
            duration,
        });
    }

    /// Names of the recorded steps, in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.metrics.iter().map(|m| m.name)
    }

    /// Render as a header value, e.g. `session;dur=0.12, database;desc="update webhook";dur=3.40`.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        if self.metrics.is_empty() {
            return None;
        }

        let mut out = String::new();
        for (i, m) in self.metrics.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(m.name);
            if let Some(desc) = &m.description {
                let desc = desc.replace(['"', '\\'], "");
                let _ = write!(out, ";desc=\"{desc}\"");
            }
            let _ = write!(out, ";dur={:.2}", m.duration.as_secs_f64() * 1000.0);
        }

        HeaderValue::from_str(&out).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_nothing_when_empty() {
        assert!(ServerTiming::new().header_value().is_none());
    }

    #[test]
    fn test_should_render_metrics_in_order() {
        let mut timing = ServerTiming::new();
        timing.record("session", None, Duration::from_micros(120));
        timing.record("database", Some("update \"webhook\""), Duration::from_millis(3));

        let value = timing.header_value().unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "session;dur=0.12, database;desc=\"update webhook\";dur=3.00"
        );
        assert_eq!(timing.names().collect::<Vec<_>>(), vec!["session", "database"]);
    }
}
