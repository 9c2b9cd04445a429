use chrono::{DateTime, FixedOffset, Utc};

pub fn human_duration_secs(total_secs: i64) -> String {
    if total_secs < 60 {
        format!("{}s", total_secs)
    } else if total_secs < 3600 {
        format!("{}m{}s", total_secs / 60, total_secs % 60)
    } else if total_secs < 86400 {
        format!("{}h{}m", total_secs / 3600, (total_secs % 3600) / 60)
    } else {
        let days = total_secs / 86400;
        let hours = (total_secs % 86400) / 3600;
        format!("{}d{}h", days, hours)
    }
}

/// Parses a stack creation timestamp.
///
/// The backend prints times as `2024-05-01 12:00:00.5 +0000 UTC`; RFC 3339 is
/// accepted as well.
pub fn parse_created(created: &str) -> Option<DateTime<FixedOffset>> {
    let created = created.trim();
    if created.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(created) {
        return Some(dt);
    }

    // Drop the trailing zone abbreviation, keep date, time and offset.
    let head: Vec<&str> = created.split_whitespace().take(3).collect();
    DateTime::parse_from_str(&head.join(" "), "%Y-%m-%d %H:%M:%S%.f %z").ok()
}

pub fn created_age(created: &str) -> String {
    created_age_at(created, Utc::now())
}

pub fn created_age_at(created: &str, now: DateTime<Utc>) -> String {
    match parse_created(created) {
        Some(dt) => human_duration_secs((now - dt.to_utc()).num_seconds().max(0)),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-02T13:30:00Z")
            .unwrap()
            .to_utc()
    }

    #[test]
    fn durations_pick_two_units() {
        assert_eq!(human_duration_secs(42), "42s");
        assert_eq!(human_duration_secs(125), "2m5s");
        assert_eq!(human_duration_secs(7260), "2h1m");
        assert_eq!(human_duration_secs(90000), "1d1h");
    }

    #[test]
    fn backend_timestamps_parse() {
        assert_eq!(
            created_age_at("2024-05-01 12:00:00.123456789 +0000 UTC", now()),
            "1d1h"
        );
        assert_eq!(created_age_at("2024-05-02 13:00:00 +0000 UTC", now()), "30m0s");
    }

    #[test]
    fn rfc3339_timestamps_parse() {
        assert_eq!(created_age_at("2024-05-02T13:29:00Z", now()), "1m0s");
    }

    #[test]
    fn garbage_yields_empty_age() {
        assert_eq!(created_age_at("", now()), "");
        assert_eq!(created_age_at("yesterday", now()), "");
        assert!(parse_created("yesterday").is_none());
    }
}
