use chrono::{DateTime, Utc};

use super::Ulid;

/// A speaker or presenter associated with events.
#[derive(Debug, Clone, Default, sqlx::FromRow, serde::Serialize)]
pub struct Participant {
    /// The unique identifier for the participant.
    pub id: Ulid,
    /// The display name of the participant.
    pub name: String,
    /// URL-safe identifier, derived from the name on first save.
    pub slug: Option<String>,
    /// Contact email.
    pub email: String,
    pub department: String,
    pub team: String,
    pub irc: String,
    pub topic_url: String,
    pub blog_url: String,
    pub twitter: String,
    /// The role the participant plays in their events.
    pub role: ParticipantRole,
    /// Legal clearance state of the participant's likeness/recording.
    pub cleared: Clearance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "participant_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ParticipantRole {
    EventCoordinator,
    PrincipalPresenter,
    #[default]
    Presenter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::Type, serde::Serialize, serde::Deserialize)]
#[sqlx(type_name = "clearance_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Clearance {
    Yes,
    #[default]
    No,
    FinalCut,
}
