use crate::meals::{ItemId, LoggedItem, MealItemDraft};

/// Copy of a day view taken right before an optimistic change.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(Vec<LoggedItem>);

impl Snapshot {
    pub fn capture(items: &[LoggedItem]) -> Self {
        Self(items.to_vec())
    }

    pub fn items(&self) -> &[LoggedItem] {
        &self.0
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<LoggedItem> {
        &mut self.0
    }
}

/// Hands out `optimistic-<n>` ids, unique for the lifetime of the generator.
#[derive(Debug)]
pub struct PlaceholderIds {
    next: u64,
}

impl Default for PlaceholderIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl PlaceholderIds {
    pub fn next_id(&mut self) -> ItemId {
        let id = ItemId::Pending(self.next);
        self.next += 1;
        id
    }
}

/// Appends a placeholder built from `draft`.
pub fn apply_optimistic_create(
    items: &[LoggedItem],
    draft: &MealItemDraft,
    id: ItemId,
) -> (Vec<LoggedItem>, Snapshot) {
    let snapshot = Snapshot::capture(items);
    let mut view = items.to_vec();
    view.push(draft.clone().into_item(id, None));
    (view, snapshot)
}

/// Removes the item with `id`; an unknown id leaves the view unchanged.
pub fn apply_optimistic_delete(items: &[LoggedItem], id: &ItemId) -> (Vec<LoggedItem>, Snapshot) {
    let snapshot = Snapshot::capture(items);
    let view = items.iter().filter(|item| &item.id != id).cloned().collect();
    (view, snapshot)
}

pub fn rollback(snapshot: &Snapshot) -> Vec<LoggedItem> {
    snapshot.0.clone()
}
