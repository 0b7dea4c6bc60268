//! `[h:]mm:ss:mmm` rendering and parsing of timeline positions.

/// Render milliseconds as `mm:ss:mmm`, prefixed with hours when non-zero
pub fn format_time(ms: u64) -> String {
    let millis = ms % 1000;
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / 60_000) % 60;
    let hours = ms / 3_600_000;
    if hours > 0 {
        format!("{}:{:02}:{:02}:{:03}", hours, minutes, seconds, millis)
    } else {
        format!("{:02}:{:02}:{:03}", minutes, seconds, millis)
    }
}

/// Parse either a plain millisecond count or colon-separated groups where the
/// last group is milliseconds and earlier groups are seconds, minutes, hours.
/// Full-width colons are accepted.
pub fn parse_time(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let groups: Vec<&str> = input.split(|c: char| c == ':' || c == '：').map(str::trim).collect();
    if groups.len() > 4 {
        return None;
    }

    let mut groups = groups.into_iter().rev();
    let mut total: u64 = groups.next()?.parse().ok()?;
    let mut unit: u64 = 1000;
    for group in groups {
        let value: u64 = group.parse().ok()?;
        total = total.checked_add(value.checked_mul(unit)?)?;
        unit *= 60;
    }
    Some(total)
}
