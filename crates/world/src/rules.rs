use crate::types::EntityId;

/// A scripted condition → effect pair evaluated every turn.
///
/// Room condition semantics: when `require_room_flag` is set, the target's
/// room must carry that flag. When it is absent the rule only fires outside
/// cold rooms, the hard-coded "melts unless kept cold" behavior world
/// authors rely on.
#[derive(Debug, Clone)]
pub struct TransformRule {
    pub id: String,
    pub entity: EntityId,
    pub require_state: Option<String>,
    pub require_room_flag: Option<String>,
    pub min_turns: u64,
    pub new_state: Option<String>,
    /// Template entity to copy name/description/props/verbs from. The
    /// transformed entity keeps its identifier and location.
    pub replace_with: Option<EntityId>,
    pub message: String,
}

impl TransformRule {
    pub fn new(id: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity: EntityId::new(entity),
            require_state: None,
            require_room_flag: None,
            min_turns: 0,
            new_state: None,
            replace_with: None,
            message: String::new(),
        }
    }
}
