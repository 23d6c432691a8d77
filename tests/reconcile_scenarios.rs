use std::sync::Arc;

use foodie::meals::{ItemId, LoggedItem, MealItemDraft, MealSlot, MealStore, MemoryMealStore};
use foodie::reconcile::{QueryCache, QueryKey, Reconciler};
use time::macros::date;
use time::Date;

const DAY: Date = date!(2024 - 01 - 02);

fn draft(name: &str, kcal: f64, quantity: f64, unit: &str) -> MealItemDraft {
    MealItemDraft {
        date: DAY,
        meal_slot: MealSlot::Breakfast,
        product_name: name.into(),
        product_brand: None,
        energy_kcal_per_100: kcal,
        proteins_per_100: 0.0,
        fat_per_100: 0.0,
        carbs_per_100: 0.0,
        quantity,
        quantity_unit: unit.into(),
    }
}

async fn day_with_a_and_b() -> (Arc<MemoryMealStore>, Reconciler, QueryCache, Vec<LoggedItem>) {
    let store = Arc::new(MemoryMealStore::new());
    store.insert(&draft("A", 200.0, 150.0, "g")).await.unwrap();
    store.insert(&draft("B", 80.0, 2.0, "piece")).await.unwrap();

    let mut reconciler = Reconciler::new(store.clone());
    let mut cache = QueryCache::new();
    let before = reconciler.refresh(&mut cache, DAY).await.unwrap();
    (store, reconciler, cache, before)
}

#[tokio::test]
async fn rejected_create_leaves_the_day_as_it_was() {
    let (store, mut reconciler, mut cache, before) = day_with_a_and_b().await;
    assert_eq!(cache.day_summary(DAY).unwrap().total_energy_kcal, 380);

    store.set_unavailable(true);
    let err = reconciler
        .create(&mut cache, draft("X", 100.0, 50.0, "g"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "db_insert_failed");
    assert_eq!(cache.day_items(DAY).unwrap(), before.as_slice());
    assert_eq!(cache.day_summary(DAY).unwrap().total_energy_kcal, 380);
    assert!(!reconciler.has_snapshot(DAY));
}

#[tokio::test]
async fn confirmed_delete_leaves_only_the_other_item() {
    let (_, mut reconciler, mut cache, before) = day_with_a_and_b().await;
    let (a, b) = (before[0].clone(), before[1].clone());

    reconciler.delete(&mut cache, DAY, a.id.clone()).await.unwrap();
    assert_eq!(cache.day_items(DAY).unwrap(), &[b.clone()]);

    let again = reconciler.refresh(&mut cache, DAY).await.unwrap();
    assert_eq!(again, vec![b]);
    assert_eq!(cache.day_summary(DAY).unwrap().total_energy_kcal, 80);
}

#[tokio::test]
async fn failed_delete_brings_the_item_back() {
    let (_, mut reconciler, mut cache, before) = day_with_a_and_b().await;
    let ghost = ItemId::Stored(uuid::Uuid::new_v4());

    let mutation = reconciler.begin_delete(&mut cache, DAY, &before[0].id).unwrap();
    assert_eq!(cache.day_items(DAY).unwrap().len(), 1);

    reconciler
        .settle_delete(&mut cache, mutation, Err(foodie::AppError::NotFound))
        .unwrap_err();
    assert_eq!(cache.day_items(DAY).unwrap(), before.as_slice());

    let err = reconciler.delete(&mut cache, DAY, ghost).await.unwrap_err();
    assert!(matches!(err, foodie::AppError::NotFound));
    assert_eq!(cache.day_items(DAY).unwrap(), before.as_slice());
}

#[tokio::test]
async fn successful_create_replaces_the_placeholder_and_refreshes_ranges() {
    let (_, mut reconciler, mut cache, _) = day_with_a_and_b().await;
    let (from, to) = (date!(2024 - 01 - 01), date!(2024 - 01 - 03));

    let summary = reconciler.refresh_range(&mut cache, from, to).await.unwrap();
    let calories: Vec<i64> = summary.days.iter().map(|d| d.calories).collect();
    assert_eq!(calories, [0, 380, 0]);

    let stored = reconciler
        .create(&mut cache, draft("X", 100.0, 50.0, "g"))
        .await
        .unwrap();
    assert!(!stored.id.is_pending());

    let view = cache.day_items(DAY).unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(view[2].id, stored.id);
    assert!(cache.is_stale(&QueryKey::Range { from, to }));

    let summary = reconciler.refresh_range(&mut cache, from, to).await.unwrap();
    assert_eq!(summary.days[1].calories, 430);
    assert_eq!(cache.range_summary(from, to), Some(&summary));
}
