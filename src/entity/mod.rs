pub mod attendance;
pub mod pipeline;
pub mod schema;

use uuid::Uuid;

/// The fixed set of manageable record types. Attendance is handled by
/// its own composite-key routine in [`attendance`], not by the generic
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Policy,
    Committee,
    Event,
    News,
    Personnel,
    Meeting,
    Motion,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Policy,
        EntityKind::Committee,
        EntityKind::Event,
        EntityKind::News,
        EntityKind::Personnel,
        EntityKind::Meeting,
        EntityKind::Motion,
    ];

    /// Parse the path segment used under /admin
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "policies" => Some(EntityKind::Policy),
            "committees" => Some(EntityKind::Committee),
            "events" => Some(EntityKind::Event),
            "news" => Some(EntityKind::News),
            "personnel" => Some(EntityKind::Personnel),
            "meetings" => Some(EntityKind::Meeting),
            "motions" => Some(EntityKind::Motion),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Policy => "policies",
            EntityKind::Committee => "committees",
            EntityKind::Event => "events",
            EntityKind::News => "news",
            EntityKind::Personnel => "personnel",
            EntityKind::Meeting => "meetings",
            EntityKind::Motion => "motions",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Policy => "policy",
            EntityKind::Committee => "committee",
            EntityKind::Event => "event",
            EntityKind::News => "news item",
            EntityKind::Personnel => "personnel record",
            EntityKind::Meeting => "meeting",
            EntityKind::Motion => "motion",
        }
    }

    /// Path of the server-rendered list view, revalidated after each
    /// successful mutation
    pub fn list_path(&self) -> String {
        format!("/admin/{}", self.table())
    }

    /// Where a create should land when the entity has a natural
    /// continue-editing screen. A new meeting goes straight to
    /// attendance entry.
    pub fn follow_up_path(&self, id: Uuid) -> Option<String> {
        match self {
            EntityKind::Meeting => Some(format!("/admin/meetings/{}/attendance", id)),
            _ => None,
        }
    }
}
