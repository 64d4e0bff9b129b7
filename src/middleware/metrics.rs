use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::{Middleware, Next};
use crate::context::Context;
use crate::error::Error;

/// Middleware for collecting Prometheus-compatible metrics
///
/// All counters use atomic operations for thread-safe updates without locks.
///
/// Metrics collected:
/// - Total request count and requests currently in flight
/// - Average latency (request processing time)
/// - Responses by status class (2xx, 3xx, 4xx, 5xx)
/// - Requests that ended with an error from the chain
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    in_flight: AtomicUsize,
    total_latency_ns: AtomicU64,
    status_classes: [AtomicUsize; 5],
    errors: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            status_classes: Default::default(),
            errors: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses whose status falls in `class` (1 for 1xx through 5 for 5xx).
    pub fn status_class_count(&self, class: u16) -> usize {
        match class {
            1..=5 => self.status_classes[usize::from(class - 1)].load(Ordering::Relaxed),
            _ => 0,
        }
    }

    /// Requests whose chain returned an error
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Render the counters in the Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        if self.write_prometheus(&mut out).is_err() {
            out.clear();
        }
        out
    }

    /// Write the counters in the Prometheus text exposition format to `out`.
    pub fn write_prometheus(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "# HELP brrtmux_requests_total Total requests dispatched")?;
        writeln!(out, "# TYPE brrtmux_requests_total counter")?;
        writeln!(out, "brrtmux_requests_total {}", self.request_count())?;
        writeln!(out, "# HELP brrtmux_requests_in_flight Requests currently in the chain")?;
        writeln!(out, "# TYPE brrtmux_requests_in_flight gauge")?;
        writeln!(out, "brrtmux_requests_in_flight {}", self.in_flight())?;
        writeln!(out, "# HELP brrtmux_responses_total Responses by status class")?;
        writeln!(out, "# TYPE brrtmux_responses_total counter")?;
        for class in 1..=5u16 {
            writeln!(
                out,
                "brrtmux_responses_total{{class=\"{class}xx\"}} {}",
                self.status_class_count(class)
            )?;
        }
        writeln!(out, "# HELP brrtmux_request_errors_total Requests that ended in an error")?;
        writeln!(out, "# TYPE brrtmux_request_errors_total counter")?;
        writeln!(out, "brrtmux_request_errors_total {}", self.error_count())?;
        writeln!(out, "# HELP brrtmux_request_latency_seconds Average request latency")?;
        writeln!(out, "# TYPE brrtmux_request_latency_seconds gauge")?;
        writeln!(
            out,
            "brrtmux_request_latency_seconds {:.6}",
            self.average_latency().as_secs_f64()
        )
    }
}

impl Middleware for MetricsMiddleware {
    fn invoke(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();

        let result = next.run(ctx);

        let latency = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(latency, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        if result.is_err() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        } else {
            // an uncommitted status is what the dispatcher commits on finish
            let class = ctx.status().as_u16() / 100;
            if (1..=5).contains(&class) {
                self.status_classes[usize::from(class - 1)].fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}
