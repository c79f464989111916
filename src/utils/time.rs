use std::time::Duration;

/// Render a duration the way the target binary's flag parser accepts it,
/// e.g. `7s`, `500ms`, `2.5s`.
pub fn flag_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d.subsec_nanos() == 0 {
        return format!("{}s", d.as_secs());
    }
    if d.as_secs() == 0 {
        if d.subsec_nanos() % 1_000_000 == 0 {
            return format!("{}ms", d.subsec_millis());
        }
        if d.subsec_nanos() % 1_000 == 0 {
            return format!("{}us", d.subsec_micros());
        }
        return format!("{}ns", d.subsec_nanos());
    }
    format!("{}s", d.as_secs_f64())
}
