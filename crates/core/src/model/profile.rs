use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::LearnerId;

/// Per-learner profile settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerProfile {
    id: Uuid,
    learner_id: LearnerId,
    display_name: Option<String>,
    email_notifications: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LearnerProfile {
    /// Rehydrate a profile from a persisted row.
    #[must_use]
    pub fn from_persisted(
        id: Uuid,
        learner_id: LearnerId,
        display_name: Option<String>,
        email_notifications: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            learner_id,
            display_name,
            email_notifications,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn email_notifications(&self) -> bool {
        self.email_notifications
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Mutable subset of a profile, applied as a partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub display_name: Option<Option<String>>,
    pub email_notifications: Option<bool>,
}

impl ProfilePatch {
    /// True when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email_notifications.is_none()
    }
}
