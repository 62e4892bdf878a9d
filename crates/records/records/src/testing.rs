use medverify_core::{Confidence, NewAnalysisRecord, Verdict, VerdictOutcome};

use crate::error::RecordError;
use crate::query::HistoryQuery;
use crate::store::RecordStore;

fn new_record(owner: &str, name: &str, verdict: Verdict, score: f64) -> NewAnalysisRecord {
    NewAnalysisRecord::new(
        owner,
        name,
        format!("http://images.test/{name}"),
        VerdictOutcome::new(
            verdict,
            Confidence::clamped(score),
            format!("{verdict} at {score}"),
        ),
    )
}

/// Run the full record store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// Owners are namespaced by `tag` so the suite can share a database with
/// other runs.
///
/// # Errors
///
/// Returns an error if the backend fails an operation outright; behavioural
/// mismatches panic through `assert!`.
pub async fn run_record_store_conformance_tests(
    store: &dyn RecordStore,
    tag: &str,
) -> Result<(), RecordError> {
    test_insert_assigns_identity(store, tag).await?;
    test_empty_history(store, tag).await?;
    test_list_newest_first(store, tag).await?;
    test_list_filters_and_pages(store, tag).await?;
    test_owner_isolation(store, tag).await?;
    test_delete_owned(store, tag).await?;
    test_delete_forbidden(store, tag).await?;
    test_delete_missing(store, tag).await?;
    test_counts(store, tag).await?;
    Ok(())
}

async fn test_insert_assigns_identity(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-insert");
    let new = new_record(&owner, "a.png", Verdict::Fake, 93.0);
    let inserted = store.insert(new.clone()).await?;

    assert!(!inserted.id.is_empty(), "insert should assign an id");
    assert_eq!(inserted.owner_id, owner);
    assert_eq!(inserted.verdict, Verdict::Fake);
    assert_eq!(inserted.outcome(), new.outcome, "outcome must be stored whole");

    let fetched = store.get(&inserted.id).await?;
    assert_eq!(fetched.as_ref(), Some(&inserted));

    let second = store.insert(new).await?;
    assert_ne!(second.id, inserted.id, "each insert gets a fresh id");
    Ok(())
}

async fn test_empty_history(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-nobody");
    let records = store.list_by_owner(&owner, &HistoryQuery::default()).await?;
    assert!(records.is_empty(), "empty history should be an empty list");
    Ok(())
}

async fn test_list_newest_first(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-order");
    let mut ids = Vec::new();
    for i in 0..3 {
        let rec = store
            .insert(new_record(&owner, &format!("{i}.png"), Verdict::Authentic, 85.0))
            .await?;
        ids.push(rec.id);
        // Distinct timestamps even on coarse clocks.
        tick().await;
    }

    let records = store.list_by_owner(&owner, &HistoryQuery::default()).await?;
    let listed: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(listed, expected, "history should be newest first");

    for pair in records.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
    Ok(())
}

async fn test_list_filters_and_pages(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-filter");
    for (i, verdict) in [Verdict::Fake, Verdict::Authentic, Verdict::Fake, Verdict::Fake]
        .into_iter()
        .enumerate()
    {
        store
            .insert(new_record(&owner, &format!("{i}.jpg"), verdict, 90.0))
            .await?;
        tick().await;
    }

    let fakes = store
        .list_by_owner(
            &owner,
            &HistoryQuery {
                verdict: Some(Verdict::Fake),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(fakes.len(), 3);
    assert!(fakes.iter().all(|r| r.verdict == Verdict::Fake));

    let page = store
        .list_by_owner(
            &owner,
            &HistoryQuery {
                limit: Some(2),
                offset: Some(1),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].image_name, "2.jpg");
    assert_eq!(page[1].image_name, "1.jpg");
    Ok(())
}

async fn test_owner_isolation(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let alice = format!("{tag}-alice");
    let bob = format!("{tag}-bob");
    store
        .insert(new_record(&alice, "alice.png", Verdict::Authentic, 99.0))
        .await?;

    let bobs = store.list_by_owner(&bob, &HistoryQuery::default()).await?;
    assert!(bobs.is_empty(), "records must not leak across owners");
    Ok(())
}

async fn test_delete_owned(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-delete");
    let rec = store
        .insert(new_record(&owner, "gone.png", Verdict::Uncertain, 60.0))
        .await?;

    store.delete(&rec.id, &owner).await?;
    assert!(store.get(&rec.id).await?.is_none(), "delete is permanent");
    Ok(())
}

async fn test_delete_forbidden(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-owner");
    let intruder = format!("{tag}-intruder");
    let rec = store
        .insert(new_record(&owner, "mine.png", Verdict::Fake, 88.0))
        .await?;

    let result = store.delete(&rec.id, &intruder).await;
    assert!(
        matches!(result, Err(RecordError::Forbidden(_))),
        "mismatched owner must be forbidden, got {result:?}"
    );
    assert!(
        store.get(&rec.id).await?.is_some(),
        "forbidden delete must leave the record in place"
    );
    Ok(())
}

async fn test_delete_missing(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-missing");
    let result = store
        .delete("00000000-0000-0000-0000-000000000000", &owner)
        .await;
    assert!(
        matches!(result, Err(RecordError::NotFound(_))),
        "missing record must be not-found, got {result:?}"
    );
    Ok(())
}

async fn test_counts(store: &dyn RecordStore, tag: &str) -> Result<(), RecordError> {
    let owner = format!("{tag}-counts");
    for verdict in [Verdict::Authentic, Verdict::Fake, Verdict::Fake] {
        store
            .insert(new_record(&owner, "c.png", verdict, 81.0))
            .await?;
    }
    let counts = store.count_by_verdict(&owner).await?;
    assert_eq!(counts.authentic, 1);
    assert_eq!(counts.fake, 2);
    assert_eq!(counts.uncertain, 0);
    assert_eq!(counts.total(), 3);
    Ok(())
}

/// Let the clock advance between inserts so ordering by time is observable.
async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
}
