use academy_core::model::LearnerId;

/// Explicit handle to the signed-in learner.
///
/// Injected into services instead of ambient global state: every consumer
/// is constructible without a current user and stays inert (no remote
/// reads or writes) until one is supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    learner: Option<LearnerId>,
}

impl AuthContext {
    /// A context with no signed-in learner.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { learner: None }
    }

    /// A context for the given learner.
    #[must_use]
    pub fn for_learner(learner: LearnerId) -> Self {
        Self {
            learner: Some(learner),
        }
    }

    #[must_use]
    pub fn learner(&self) -> Option<LearnerId> {
        self.learner
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.learner.is_some()
    }
}
