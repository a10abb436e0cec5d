use chrono::{DateTime, Duration, Utc};

use super::Ulid;

/// An event: a scheduled talk or broadcast with all the metadata needed to
/// publish it.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct Event {
    /// The unique identifier for the event.
    pub id: Ulid,
    pub title: String,
    /// URL-safe identifier, unique across live events and all retired slugs.
    pub slug: Option<String>,
    /// The stored workflow status. The user-visible lifecycle stage is
    /// derived, see [`Event::lifecycle`].
    pub status: EventStatus,
    pub start_time: DateTime<Utc>,
    /// When the recording was moved to the archive. Unset while the event
    /// has not ended.
    pub archive_time: Option<DateTime<Utc>>,
    pub description: String,
    pub call_info: String,
    pub additional_links: String,
    pub category_id: Ulid,
    pub location_id: Option<Ulid>,
    pub template_id: Option<Ulid>,
    /// Whether the event is visible to the public or internal-only.
    pub public: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "event_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    /// Requested but not yet scheduled by a producer.
    #[default]
    Initiated,
    Scheduled,
}

/// The user-visible lifecycle stage, computed from the clock, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Initiated,
    Upcoming,
    Live,
    Archiving,
    Archived,
}

/// Classifies an event into its lifecycle stage at `now`.
///
/// For a fixed event this is monotonic in `now`: the stage only ever moves
/// forward (upcoming → live → archiving → archived), and archived is
/// terminal. Initiated events stay initiated regardless of the clock; they
/// only leave that stage when the stored status changes.
pub fn classify(
    now: DateTime<Utc>,
    status: EventStatus,
    start_time: DateTime<Utc>,
    archive_time: Option<DateTime<Utc>>,
    live_margin: Duration,
) -> Lifecycle {
    if status == EventStatus::Initiated {
        return Lifecycle::Initiated;
    }

    if let Some(archive_time) = archive_time {
        if archive_time <= now && start_time <= now {
            return Lifecycle::Archived;
        }
        if start_time <= now {
            return Lifecycle::Archiving;
        }
    }

    if start_time - now > live_margin {
        Lifecycle::Upcoming
    } else {
        Lifecycle::Live
    }
}

impl Event {
    pub fn lifecycle(&self, now: DateTime<Utc>, live_margin: Duration) -> Lifecycle {
        classify(now, self.status, self.start_time, self.archive_time, live_margin)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, h, m, 0).unwrap()
    }

    const MARGIN_MINS: i64 = 15;

    fn margin() -> Duration {
        Duration::minutes(MARGIN_MINS)
    }

    #[test]
    fn test_upcoming_then_live() {
        let start = at(15, 0);

        // One hour out: upcoming. Five minutes in: live.
        assert_eq!(
            classify(at(14, 0), EventStatus::Scheduled, start, None, margin()),
            Lifecycle::Upcoming
        );
        assert_eq!(
            classify(at(15, 5), EventStatus::Scheduled, start, None, margin()),
            Lifecycle::Live
        );
    }

    #[test]
    fn test_live_margin_boundary() {
        let start = at(15, 0);

        assert_eq!(
            classify(at(14, 44), EventStatus::Scheduled, start, None, margin()),
            Lifecycle::Upcoming
        );
        assert_eq!(
            classify(at(14, 45), EventStatus::Scheduled, start, None, margin()),
            Lifecycle::Live
        );
    }

    #[test]
    fn test_archiving_then_archived() {
        let start = at(10, 0);
        let archive = Some(at(16, 0));

        assert_eq!(
            classify(at(12, 0), EventStatus::Scheduled, start, archive, margin()),
            Lifecycle::Archiving
        );
        assert_eq!(
            classify(at(16, 0), EventStatus::Scheduled, start, archive, margin()),
            Lifecycle::Archived
        );
        assert_eq!(
            classify(at(23, 59), EventStatus::Scheduled, start, archive, margin()),
            Lifecycle::Archived
        );
    }

    #[test]
    fn test_initiated_ignores_the_clock() {
        // A request whose proposed start has long passed is still just a
        // request until a producer schedules it.
        let start = at(1, 0);
        assert_eq!(
            classify(at(23, 0), EventStatus::Initiated, start, None, margin()),
            Lifecycle::Initiated
        );
    }

    #[test]
    fn test_monotonic_over_a_day() {
        let start = at(12, 0);
        let archive = Some(at(14, 0));

        let mut last = Lifecycle::Initiated;
        for minutes in (0..24 * 60).step_by(5) {
            let now = at(0, 0) + Duration::minutes(minutes as i64);
            let stage = classify(now, EventStatus::Scheduled, start, archive, margin());
            assert!(
                rank(stage) >= rank(last),
                "lifecycle regressed from {:?} to {:?} at {}",
                last,
                stage,
                now
            );
            last = stage;
        }
        assert_eq!(last, Lifecycle::Archived);
    }

    fn rank(stage: Lifecycle) -> u8 {
        match stage {
            Lifecycle::Initiated => 0,
            Lifecycle::Upcoming => 1,
            Lifecycle::Live => 2,
            Lifecycle::Archiving => 3,
            Lifecycle::Archived => 4,
        }
    }
}
