use api_types::item::ItemId;

/// Draft-edit state for the single item open for editing.
///
/// The session is process-local and independent of the ledger. Opening a
/// different item discards any unsaved draft without committing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        id: ItemId,
        draft: String,
    },
}

impl EditSession {
    pub fn start(&mut self, id: ItemId, draft: String) {
        *self = Self::Editing { id, draft };
    }

    pub fn reset(&mut self) {
        *self = Self::Idle;
    }

    /// Replaces the draft text; `false` when no session is open.
    pub fn set_draft(&mut self, new_draft: String) -> bool {
        match self {
            Self::Editing { draft, .. } => {
                *draft = new_draft;
                true
            }
            Self::Idle => false,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }

    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            Self::Editing { id, .. } => Some(id),
            Self::Idle => None,
        }
    }

    pub fn snapshot(&self) -> Option<(ItemId, String)> {
        match self {
            Self::Editing { id, draft } => Some((id.clone(), draft.clone())),
            Self::Idle => None,
        }
    }
}
