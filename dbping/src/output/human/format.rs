use std::time::Duration;

pub(crate) fn format_secs(d: Duration) -> String {
    format!("{:.2}", d.as_secs_f64())
}

/// Whole seconds, rounded to nearest.
pub(crate) fn format_elapsed(d: Duration) -> String {
    format!("{}", d.as_secs_f64().round() as u64)
}

pub(crate) fn format_sla(sla: Option<f64>) -> String {
    match sla {
        Some(pct) if pct.is_finite() => format!("{pct:.2}%"),
        _ => "n/a".to_string(),
    }
}

pub(crate) fn format_latency_triplet(
    min: Option<Duration>,
    avg: Option<Duration>,
    max: Option<Duration>,
) -> String {
    let one = |d: Option<Duration>| {
        d.map_or_else(|| "-".to_string(), |d| format!("{:.3}", d.as_secs_f64()))
    };
    format!("{}/{}/{} s", one(min), one(avg), one(max))
}
