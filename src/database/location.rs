use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::Ulid;

/// A venue events are held at or broadcast from. The timezone is an IANA
/// identifier and is what gives meaning to naive wall-clock times submitted
/// for events at this location.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct Location {
    pub id: Ulid,
    pub name: String,
    pub address: String,
    pub timezone: String,
}

impl Location {
    pub fn tz(&self) -> Result<Tz, chrono_tz::ParseError> {
        self.timezone.parse()
    }

    /// Interprets a naive local wall-clock time at this location as a UTC
    /// instant. Returns `None` for times that are ambiguous or nonexistent
    /// under DST transitions, or when the stored timezone is invalid.
    pub fn resolve_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        let tz = self.tz().ok()?;
        tz.from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

pub fn validate_timezone(timezone: &str) -> bool {
    timezone.parse::<Tz>().is_ok()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn location(timezone: &str) -> Location {
        Location {
            timezone: timezone.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("America/Los_Angeles"));
        assert!(validate_timezone("UTC"));
        assert!(!validate_timezone("Mars/Olympus_Mons"));
    }

    #[test]
    fn test_resolve_local() {
        let naive = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let resolved = location("America/Los_Angeles").resolve_local(naive).unwrap();
        // PST is UTC-8 in January.
        assert_eq!(resolved, Utc.with_ymd_and_hms(2026, 1, 15, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_nonexistent_local_time() {
        // 02:30 on the spring-forward date does not exist in Los Angeles.
        let naive = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap().and_hms_opt(2, 30, 0).unwrap();
        assert_eq!(location("America/Los_Angeles").resolve_local(naive), None);
    }

    #[test]
    fn test_resolve_with_invalid_timezone() {
        let naive = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap().and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(location("not-a-zone").resolve_local(naive), None);
    }
}
