use bitmask_enum::bitmask;

use super::Ulid;

/// A staff group. Groups grant capabilities; a user's effective capability
/// set is the union of the capabilities of every group they belong to.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Group {
    /// The unique identifier for the group.
    pub id: Ulid,
    /// The name of the group.
    pub name: String,
    /// The capabilities granted by this group.
    pub capabilities: Capability,
}

#[bitmask(i64)]
pub enum Capability {
    /// Can do anything
    Admin,
    /// Can list, look up and edit users
    ChangeUser,
    /// Can edit groups
    ChangeGroup,
    /// Can create groups
    AddGroup,
    /// Can list, search and edit participants
    ChangeParticipant,
    /// Can create participants
    AddParticipant,
    /// Can view dashboards, search and edit events
    ChangeEvent,
    /// Can submit event requests and use the autocompleters
    AddEvent,
    /// Can list and create categories
    ChangeCategory,
}

const CAPABILITY_NAMES: &[(Capability, &str)] = &[
    (Capability::Admin, "admin"),
    (Capability::ChangeUser, "change_user"),
    (Capability::ChangeGroup, "change_group"),
    (Capability::AddGroup, "add_group"),
    (Capability::ChangeParticipant, "change_participant"),
    (Capability::AddParticipant, "add_participant"),
    (Capability::ChangeEvent, "change_event"),
    (Capability::AddEvent, "add_event"),
    (Capability::ChangeCategory, "change_category"),
];

impl sqlx::Decode<'_, sqlx::Postgres> for Capability {
    fn decode(value: sqlx::postgres::PgValueRef<'_>) -> Result<Self, Box<dyn std::error::Error + 'static + Send + Sync>> {
        <i64 as sqlx::Decode<sqlx::Postgres>>::decode(value).map(Self::from)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for Capability {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i64 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.bits(), buf)
    }
}

impl sqlx::Type<sqlx::Postgres> for Capability {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i64 as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::none()
    }
}

impl Capability {
    /// Checks if the current capability set grants the given capability.
    /// Admin always grants; otherwise every requested bit must be present.
    pub fn has_capability(&self, other: Self) -> bool {
        (*self & Self::Admin == Self::Admin) || (*self & other == other)
    }

    /// Union with another capability set.
    pub fn merge(&self, other: Self) -> Self {
        *self | other
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CAPABILITY_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(cap, _)| *cap)
    }

    pub fn names(&self) -> Vec<&'static str> {
        CAPABILITY_NAMES
            .iter()
            .filter(|(cap, _)| *self & *cap == *cap)
            .map(|(_, n)| *n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_grants_everything() {
        let caps = Capability::Admin;
        assert!(caps.has_capability(Capability::ChangeEvent));
        assert!(caps.has_capability(Capability::AddParticipant | Capability::ChangeUser));
    }

    #[test]
    fn test_union_across_groups() {
        let producers = Capability::ChangeEvent | Capability::AddEvent;
        let editors = Capability::ChangeParticipant;

        let effective = Capability::none().merge(producers).merge(editors);
        assert!(effective.has_capability(Capability::AddEvent));
        assert!(effective.has_capability(Capability::ChangeParticipant));
        assert!(!effective.has_capability(Capability::ChangeUser));
    }

    #[test]
    fn test_name_round_trip() {
        for (cap, name) in CAPABILITY_NAMES {
            assert_eq!(Capability::from_name(name), Some(*cap));
        }
        assert_eq!(Capability::from_name("launch_rockets"), None);
        assert_eq!(
            (Capability::ChangeEvent | Capability::AddEvent).names(),
            vec!["change_event", "add_event"]
        );
    }
}
