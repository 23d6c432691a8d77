//! Optimistic mutations over the cached day views.
//!
//! Each date with mutations in flight owns a ledger: the view as it was when
//! the first of them started (`base`) plus one delta per mutation. The
//! visible view is always `base` with the live deltas replayed on top, so a
//! failed mutation only drops its own delta and never undoes a sibling that
//! already succeeded. Once nothing is in flight the ledger is folded into the
//! cache and released.
//!
//! A listing fetched while a create is in flight may or may not contain that
//! create already, so it is held back and applied once no create is pending.

use std::collections::HashMap;
use std::sync::Arc;

use time::Date;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::meals::services::clamp_quantity;
use crate::meals::{ItemId, LoggedItem, MealItemDraft, MealStore};
use crate::nutrition::{aggregate_range, week_range, RangeSummary};
use crate::reconcile::cache::{CachedValue, QueryCache, QueryKey};
use crate::reconcile::debounce::{QuantityEditSession, QuantityUpdate};
use crate::reconcile::optimistic::{
    apply_optimistic_create, apply_optimistic_delete, rollback, PlaceholderIds, Snapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Applying,
    Confirmed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationKind {
    /// Placeholder until confirmed, then the stored item.
    Insert(LoggedItem),
    Remove(ItemId),
}

#[derive(Debug, Clone)]
pub struct Mutation {
    pub id: MutationId,
    pub kind: MutationKind,
    pub state: MutationState,
}

#[derive(Debug)]
struct Ledger {
    base: Snapshot,
    ops: Vec<Mutation>,
    deferred: Option<Vec<LoggedItem>>,
}

impl Ledger {
    fn view(&self) -> Vec<LoggedItem> {
        let mut view = rollback(&self.base);
        for op in &self.ops {
            match &op.kind {
                MutationKind::Insert(item) => {
                    if !view.iter().any(|existing| existing.id == item.id) {
                        view.push(item.clone());
                    }
                }
                MutationKind::Remove(id) => view.retain(|existing| &existing.id != id),
            }
        }
        view
    }

    fn in_flight(&self) -> bool {
        self.ops.iter().any(|op| op.state == MutationState::Applying)
    }

    fn creates_in_flight(&self) -> bool {
        self.ops.iter().any(|op| {
            op.state == MutationState::Applying && matches!(op.kind, MutationKind::Insert(_))
        })
    }

    /// Takes `fetched` as the new base, dropping confirmed deltas it already reflects.
    fn rebase(&mut self, fetched: Vec<LoggedItem>) {
        self.ops.retain(|op| match (&op.state, &op.kind) {
            (MutationState::Confirmed, MutationKind::Insert(item)) => {
                !fetched.iter().any(|f| f.id == item.id)
            }
            (MutationState::Confirmed, MutationKind::Remove(id)) => {
                fetched.iter().any(|f| &f.id == id)
            }
            _ => true,
        });
        self.base = Snapshot::capture(&fetched);
    }
}

enum Outcome {
    Confirmed(Option<LoggedItem>),
    Failed,
}

fn stored_id(id: &ItemId) -> Result<Uuid, AppError> {
    id.stored().ok_or_else(|| {
        AppError::validation("invalid_params", format!("item {id} has not been stored yet"))
    })
}

pub struct Reconciler {
    store: Arc<dyn MealStore>,
    placeholders: PlaceholderIds,
    next_mutation: u64,
    ledgers: HashMap<Date, Ledger>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn MealStore>) -> Self {
        Self {
            store,
            placeholders: PlaceholderIds::default(),
            next_mutation: 1,
            ledgers: HashMap::new(),
        }
    }

    /// What the user currently sees for `date`.
    pub fn visible(&self, cache: &QueryCache, date: Date) -> Vec<LoggedItem> {
        match self.ledgers.get(&date) {
            Some(ledger) => ledger.view(),
            None => cache.day_items(date).map(<[_]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn pending_mutations(&self, date: Date) -> &[Mutation] {
        self.ledgers
            .get(&date)
            .map(|ledger| ledger.ops.as_slice())
            .unwrap_or_default()
    }

    /// Whether a rollback base is held for `date`.
    pub fn has_snapshot(&self, date: Date) -> bool {
        self.ledgers.contains_key(&date)
    }

    fn track(&mut self, date: Date, snapshot: Snapshot, kind: MutationKind) -> MutationId {
        let id = MutationId(self.next_mutation);
        self.next_mutation += 1;

        let ledger = self.ledgers.entry(date).or_insert_with(|| Ledger {
            base: snapshot,
            ops: Vec::new(),
            deferred: None,
        });
        ledger.ops.push(Mutation {
            id,
            kind,
            state: MutationState::Applying,
        });
        id
    }

    /// Shows a placeholder for `draft` right away. Settle with [`Self::settle_create`].
    pub fn begin_create(
        &mut self,
        cache: &mut QueryCache,
        draft: &MealItemDraft,
    ) -> (MutationId, ItemId) {
        let date = draft.date;
        let placeholder = self.placeholders.next_id();
        let current = self.visible(cache, date);
        let (view, snapshot) = apply_optimistic_create(&current, draft, placeholder.clone());

        let item = draft.clone().into_item(placeholder.clone(), None);
        let mutation = self.track(date, snapshot, MutationKind::Insert(item));
        cache.set_day_items(date, view);

        debug!(?mutation, %date, id = %placeholder, "optimistic create");
        (mutation, placeholder)
    }

    /// Hides `id` right away. Settle with [`Self::settle_delete`].
    pub fn begin_delete(
        &mut self,
        cache: &mut QueryCache,
        date: Date,
        id: &ItemId,
    ) -> Result<MutationId, AppError> {
        stored_id(id)?;
        let current = self.visible(cache, date);
        let (view, snapshot) = apply_optimistic_delete(&current, id);

        let mutation = self.track(date, snapshot, MutationKind::Remove(id.clone()));
        cache.set_day_items(date, view);
        cache.invalidate_date(date);

        debug!(?mutation, %date, %id, "optimistic delete");
        Ok(mutation)
    }

    fn settle(&mut self, cache: &mut QueryCache, mutation: MutationId, outcome: Outcome) {
        let found = self
            .ledgers
            .iter()
            .find(|(_, ledger)| ledger.ops.iter().any(|op| op.id == mutation))
            .map(|(date, _)| *date);
        let Some(date) = found else {
            warn!(?mutation, "settle for unknown mutation ignored");
            return;
        };
        let Some(ledger) = self.ledgers.get_mut(&date) else {
            return;
        };
        let Some(pos) = ledger.ops.iter().position(|op| op.id == mutation) else {
            return;
        };

        let state = match outcome {
            Outcome::Confirmed(stored) => {
                let op = &mut ledger.ops[pos];
                if let Some(item) = stored {
                    op.kind = MutationKind::Insert(item);
                }
                op.state = MutationState::Confirmed;
                MutationState::Confirmed
            }
            Outcome::Failed => {
                ledger.ops.remove(pos);
                MutationState::RolledBack
            }
        };

        if !ledger.creates_in_flight() {
            if let Some(fetched) = ledger.deferred.take() {
                ledger.rebase(fetched);
            }
        }

        let view = ledger.view();
        let released = !ledger.in_flight();
        if released {
            self.ledgers.remove(&date);
        }
        cache.set_day_items(date, view);
        cache.invalidate_date(date);

        debug!(?mutation, %date, ?state, released, "mutation settled");
    }

    /// On success the stored item takes the placeholder's place; on failure
    /// the placeholder disappears. The outcome is passed back unchanged.
    pub fn settle_create(
        &mut self,
        cache: &mut QueryCache,
        mutation: MutationId,
        outcome: Result<LoggedItem, AppError>,
    ) -> Result<LoggedItem, AppError> {
        match outcome {
            Ok(item) => {
                self.settle(cache, mutation, Outcome::Confirmed(Some(item.clone())));
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, ?mutation, "create failed, rolling back");
                self.settle(cache, mutation, Outcome::Failed);
                Err(e)
            }
        }
    }

    /// On failure the item reappears.
    pub fn settle_delete(
        &mut self,
        cache: &mut QueryCache,
        mutation: MutationId,
        outcome: Result<(), AppError>,
    ) -> Result<(), AppError> {
        match outcome {
            Ok(()) => {
                self.settle(cache, mutation, Outcome::Confirmed(None));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, ?mutation, "delete failed, rolling back");
                self.settle(cache, mutation, Outcome::Failed);
                Err(e)
            }
        }
    }

    /// Installs an authoritative listing for `date`.
    ///
    /// With mutations in flight the listing becomes the new base; confirmed
    /// deltas it already reflects are dropped, the rest are replayed on top.
    /// While a create is pending the listing is kept aside until it settles
    /// and the current view is returned unchanged.
    pub fn apply_fetched(
        &mut self,
        cache: &mut QueryCache,
        date: Date,
        fetched: Vec<LoggedItem>,
    ) -> Vec<LoggedItem> {
        let Some(ledger) = self.ledgers.get_mut(&date) else {
            cache.set_day_items(date, fetched.clone());
            return fetched;
        };

        if ledger.creates_in_flight() {
            ledger.deferred = Some(fetched);
            debug!(%date, "listing deferred until pending creates settle");
            return ledger.view();
        }
        ledger.rebase(fetched);

        let view = ledger.view();
        debug!(%date, pending = ledger.ops.len(), "rebased on fetched items");
        cache.set_day_items(date, view.clone());
        view
    }

    /// Patches the quantity of `id` in the visible view without touching the store.
    ///
    /// Returns the updated item, or `None` when `id` is not visible on `date`.
    pub fn set_local_quantity(
        &mut self,
        cache: &mut QueryCache,
        date: Date,
        id: &ItemId,
        quantity: f64,
    ) -> Result<Option<LoggedItem>, AppError> {
        let quantity = clamp_quantity(quantity)?;

        if let Some(ledger) = self.ledgers.get_mut(&date) {
            let deferred = ledger.deferred.iter_mut().flatten();
            for item in ledger.base.items_mut().iter_mut().chain(deferred) {
                if &item.id == id {
                    item.quantity = quantity;
                }
            }
            for op in ledger.ops.iter_mut() {
                if let MutationKind::Insert(item) = &mut op.kind {
                    if &item.id == id {
                        item.quantity = quantity;
                    }
                }
            }
        }

        let mut view = self.visible(cache, date);
        let mut updated = None;
        for item in view.iter_mut().filter(|item| &item.id == id) {
            item.quantity = quantity;
            updated = Some(item.clone());
        }
        if updated.is_some() {
            cache.set_day_items(date, view);
        }
        Ok(updated)
    }

    /// Local edit plus a (re)scheduled outbound update through `session`.
    pub fn edit_quantity(
        &mut self,
        cache: &mut QueryCache,
        session: &mut QuantityEditSession,
        quantity: f64,
    ) -> Result<Option<LoggedItem>, AppError> {
        let id = ItemId::Stored(session.item_id());
        let updated = self.set_local_quantity(cache, session.date(), &id, quantity)?;
        if let Some(item) = &updated {
            session.edit(item.quantity);
        }
        Ok(updated)
    }

    /// Sends a settled quantity edit; the stored value replaces the local one.
    pub async fn send_quantity(
        &mut self,
        cache: &mut QueryCache,
        update: QuantityUpdate,
    ) -> Result<LoggedItem, AppError> {
        let outcome = self.store.update_quantity(update.id, update.quantity).await;
        let result = match outcome {
            Ok(item) => {
                self.set_local_quantity(cache, update.date, &item.id, item.quantity)?;
                Ok(item)
            }
            Err(e) => {
                warn!(error = %e, id = %update.id, "quantity update failed");
                Err(e)
            }
        };
        cache.invalidate_date(update.date);
        result
    }

    pub async fn refresh(
        &mut self,
        cache: &mut QueryCache,
        date: Date,
    ) -> Result<Vec<LoggedItem>, AppError> {
        let fetched = self.store.list(date).await?;
        Ok(self.apply_fetched(cache, date, fetched))
    }

    pub async fn refresh_range(
        &self,
        cache: &mut QueryCache,
        from: Date,
        to: Date,
    ) -> Result<RangeSummary, AppError> {
        let rows = self.store.list_range(from, to).await?;
        let summary = aggregate_range(&rows, from, to)?;
        cache.set(QueryKey::Range { from, to }, CachedValue::Summary(summary.clone()));
        Ok(summary)
    }

    /// Calories for the Monday to Sunday week around `date`.
    pub async fn refresh_week(
        &self,
        cache: &mut QueryCache,
        date: Date,
    ) -> Result<RangeSummary, AppError> {
        let (from, to) = week_range(date);
        self.refresh_range(cache, from, to).await
    }

    /// Optimistic create driven end to end, followed by a refresh of the day.
    pub async fn create(
        &mut self,
        cache: &mut QueryCache,
        draft: MealItemDraft,
    ) -> Result<LoggedItem, AppError> {
        let (mutation, _) = self.begin_create(cache, &draft);
        let outcome = self.store.insert(&draft).await;
        let item = self.settle_create(cache, mutation, outcome)?;

        if let Err(e) = self.refresh(cache, draft.date).await {
            warn!(error = %e, date = %draft.date, "refresh after create failed");
        }
        Ok(item)
    }

    /// Optimistic delete driven end to end, followed by a refresh of the day.
    pub async fn delete(
        &mut self,
        cache: &mut QueryCache,
        date: Date,
        id: ItemId,
    ) -> Result<(), AppError> {
        let uuid = stored_id(&id)?;
        let mutation = self.begin_delete(cache, date, &id)?;
        let outcome = self.store.delete(uuid).await;
        self.settle_delete(cache, mutation, outcome)?;

        if let Err(e) = self.refresh(cache, date).await {
            warn!(error = %e, %date, "refresh after delete failed");
        }
        Ok(())
    }
}
