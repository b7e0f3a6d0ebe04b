use std::future::Future;

use chrono::{Duration, Utc};
use expensa_application::ReportRepository;
use expensa_domain::{
    ExpenseItem, ExpenseReport, ItemDetails, ReportId, ReportStatus, UserId,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresReportRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres report tests: {error}");
    }

    Some(pool)
}

async fn insert_user(pool: &PgPool) -> UserId {
    let user_id = UserId::new();
    let insert = sqlx::query(
        r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, 'hash')
            "#,
    )
    .bind(user_id.as_uuid())
    .bind(format!("{user_id}@example.com"))
    .execute(pool)
    .await;

    assert!(insert.is_ok());
    user_id
}

fn draft(owner_id: UserId, title: &str) -> ExpenseReport {
    match ExpenseReport::draft(owner_id, title, Utc::now()) {
        Ok(report) => report,
        Err(error) => panic!("invalid report fixture: {error}"),
    }
}

fn details(amount_ht: f64) -> ItemDetails {
    match ItemDetails::new("Train ticket", "2024-03-02", amount_ht, 0.1) {
        Ok(details) => details,
        Err(error) => panic!("invalid item fixture: {error}"),
    }
}

#[tokio::test]
async fn transitions_only_apply_from_expected_status() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresReportRepository::new(pool.clone());
    let owner_id = insert_user(&pool).await;
    let report = draft(owner_id, "Paris");
    assert!(repository.create_report(&report).await.is_ok());

    let first = repository
        .transition_status(report.id(), ReportStatus::Draft, ReportStatus::Submitted)
        .await;
    let second = repository
        .transition_status(report.id(), ReportStatus::Draft, ReportStatus::Submitted)
        .await;
    assert!(matches!(first, Ok(true)));
    assert!(matches!(second, Ok(false)));

    let access = repository.find_report_access(report.id()).await;
    assert!(matches!(
        access,
        Ok(Some(access)) if access.status == ReportStatus::Submitted && access.owner_id == owner_id
    ));

    let missing = repository
        .transition_status(ReportId::new(), ReportStatus::Draft, ReportStatus::Submitted)
        .await;
    assert!(matches!(missing, Ok(false)));
}

#[tokio::test]
async fn item_writes_require_a_draft_parent() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresReportRepository::new(pool.clone());
    let owner_id = insert_user(&pool).await;
    let report = draft(owner_id, "Berlin");
    assert!(repository.create_report(&report).await.is_ok());

    let item = ExpenseItem::new(report.id(), details(50.0), Utc::now());
    assert!(matches!(repository.add_item(&item).await, Ok(true)));

    let updated = repository.update_item(item.id(), &details(60.0)).await;
    assert!(matches!(
        updated,
        Ok(Some(ref updated)) if updated.amounts().amount_ttc() == 66.0
    ));
    assert!(matches!(
        repository.set_receipt(item.id(), "owner/receipts/item-1.pdf").await,
        Ok(Some(ref replaced)) if replaced.previous_path.is_none()
    ));
    assert!(matches!(
        repository.set_receipt(item.id(), "owner/receipts/item.pdf").await,
        Ok(Some(ref replaced))
            if replaced.previous_path.as_deref() == Some("owner/receipts/item-1.pdf")
    ));

    assert!(matches!(
        repository
            .transition_status(report.id(), ReportStatus::Draft, ReportStatus::Submitted)
            .await,
        Ok(true)
    ));

    let late_item = ExpenseItem::new(report.id(), details(1.0), Utc::now());
    assert!(matches!(repository.add_item(&late_item).await, Ok(false)));
    assert!(matches!(
        repository.update_item(item.id(), &details(70.0)).await,
        Ok(None)
    ));
    assert!(matches!(
        repository.set_receipt(item.id(), "other.pdf").await,
        Ok(None)
    ));
    assert!(matches!(
        repository.delete_draft_report(report.id()).await,
        Ok(false)
    ));

    let stored = repository.find_report(report.id()).await;
    assert!(matches!(
        stored,
        Ok(Some(ref stored))
            if stored.items.len() == 1
                && stored.items[0].receipt_path() == Some("owner/receipts/item.pdf")
                && stored.items[0].amounts().amount_ht() == 60.0
    ));
}

#[tokio::test]
async fn listings_follow_expected_order_and_filters() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresReportRepository::new(pool.clone());
    let owner_id = insert_user(&pool).await;
    let now = Utc::now();
    let older = match ExpenseReport::draft(owner_id, "Older", now - Duration::minutes(5)) {
        Ok(report) => report,
        Err(error) => panic!("invalid report fixture: {error}"),
    };
    let newer = draft(owner_id, "Newer");
    assert!(repository.create_report(&older).await.is_ok());
    assert!(repository.create_report(&newer).await.is_ok());
    assert!(matches!(
        repository
            .transition_status(older.id(), ReportStatus::Draft, ReportStatus::Submitted)
            .await,
        Ok(true)
    ));

    let own = repository.list_reports_for_owner(owner_id).await;
    assert!(matches!(
        own,
        Ok(ref own)
            if own.len() == 2
                && own[0].report.id() == newer.id()
                && own[1].report.id() == older.id()
    ));

    let reviewable = match repository.list_reviewable_reports().await {
        Ok(reviewable) => reviewable,
        Err(error) => panic!("failed to list reviewable reports: {error}"),
    };
    assert!(
        reviewable
            .iter()
            .any(|overview| overview.details.report.id() == older.id()
                && overview.owner_email == format!("{owner_id}@example.com"))
    );
    assert!(
        reviewable
            .iter()
            .all(|overview| overview.details.report.status() != ReportStatus::Draft)
    );

    assert!(matches!(
        repository.delete_draft_report(newer.id()).await,
        Ok(true)
    ));
    assert!(matches!(repository.find_report(newer.id()).await, Ok(None)));
}

/// Runs `write` while another connection holds an uncommitted submit of the
/// report, then commits the submit and returns what the write produced.
async fn submit_concurrently<T, F>(pool: &PgPool, report_id: ReportId, write: F) -> T
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let mut submit = match pool.begin().await {
        Ok(transaction) => transaction,
        Err(error) => panic!("failed to open submitting transaction: {error}"),
    };
    let submitted = sqlx::query(
        r#"
        UPDATE expense_reports
        SET status = 'submitted'
        WHERE id = $1 AND status = 'draft'
        "#,
    )
    .bind(report_id.as_uuid())
    .execute(&mut *submit)
    .await;
    assert!(matches!(submitted, Ok(ref result) if result.rows_affected() == 1));

    let write = tokio::spawn(write);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    if let Err(error) = submit.commit().await {
        panic!("failed to commit submit: {error}");
    }

    match write.await {
        Ok(outcome) => outcome,
        Err(error) => panic!("item write task failed: {error}"),
    }
}

#[tokio::test]
async fn item_writes_wait_for_a_concurrent_submit() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresReportRepository::new(pool.clone());
    let owner_id = insert_user(&pool).await;

    let report = draft(owner_id, "Madrid");
    assert!(repository.create_report(&report).await.is_ok());
    let item = ExpenseItem::new(report.id(), details(50.0), Utc::now());
    assert!(matches!(repository.add_item(&item).await, Ok(true)));

    let updating = repository.clone();
    let item_id = item.id();
    let updated = submit_concurrently(&pool, report.id(), async move {
        updating.update_item(item_id, &details(999.0)).await
    })
    .await;
    assert!(matches!(updated, Ok(None)));

    let stored = repository.find_item(item.id()).await;
    assert!(matches!(
        stored,
        Ok(Some(ref stored)) if stored.amounts().amount_ht() == 50.0
    ));

    let report = draft(owner_id, "Rome");
    assert!(repository.create_report(&report).await.is_ok());
    let inserting = repository.clone();
    let late_item = ExpenseItem::new(report.id(), details(12.0), Utc::now());
    let late_item_id = late_item.id();
    let inserted = submit_concurrently(&pool, report.id(), async move {
        inserting.add_item(&late_item).await
    })
    .await;
    assert!(matches!(inserted, Ok(false)));
    assert!(matches!(repository.find_item(late_item_id).await, Ok(None)));

    let report = draft(owner_id, "Lisbon");
    assert!(repository.create_report(&report).await.is_ok());
    let item = ExpenseItem::new(report.id(), details(30.0), Utc::now());
    assert!(matches!(repository.add_item(&item).await, Ok(true)));
    let attaching = repository.clone();
    let item_id = item.id();
    let attached = submit_concurrently(&pool, report.id(), async move {
        attaching.set_receipt(item_id, "owner/receipts/late.pdf").await
    })
    .await;
    assert!(matches!(attached, Ok(None)));
    assert!(matches!(
        repository.find_item(item.id()).await,
        Ok(Some(ref stored)) if stored.receipt_path().is_none()
    ));
}
