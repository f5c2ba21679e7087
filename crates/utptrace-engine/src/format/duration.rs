/// Format milliseconds for the timeline: "722ms", "1.5s", "12s", "2.3m", "4.0h", "12d"
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{}ms", ms);
    }

    // (unit, milliseconds per unit, rounded value that rolls over to the next unit)
    const UNITS: [(&str, f64, Option<f64>); 4] = [
        ("s", 1_000.0, Some(60.0)),
        ("m", 60_000.0, Some(60.0)),
        ("h", 3_600_000.0, Some(24.0)),
        ("d", 86_400_000.0, None),
    ];

    let mut formatted = String::new();
    for (unit, scale, limit) in UNITS {
        let value = ms as f64 / scale;
        let tenths = (value * 10.0).round() / 10.0;
        let (rounded, decimals) = if tenths < 10.0 {
            (tenths, 1)
        } else {
            (value.round(), 0)
        };
        formatted = format!("{:.*}{}", decimals, rounded, unit);
        if limit.is_none_or(|limit| rounded < limit) {
            break;
        }
    }
    formatted
}
