mod utils;

use chrono::Duration;
use rstest::rstest;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracker_repo::error::RepoError;
use tracker_repo::lifecycle::{Clock, Deletion};
use tracker_repo::reversal_repo::{NewReversal, TransactionReversal};
use utils::generator::NewTransactionGenerator;
use utils::test_user::TestUser;
use utils::RepoType;
use uuid::Uuid;

fn constraint_of(result: Result<TransactionReversal, RepoError>) -> String {
    match result {
        Err(e) => e
            .constraint_name()
            .unwrap_or_else(|| panic!("expected a constraint violation, got {:?}", e))
            .to_owned(),
        Ok(r) => panic!("expected a constraint violation, got {:?}", r),
    }
}

#[rstest]
#[ignore = "needs a PostgreSQL database"]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_create_and_get_reversals(#[case] repo_type: RepoType) {
    let clock = utils::manual_clock();
    let repos = utils::build_repos(repo_type, clock.clone()).await;
    let user = TestUser::new(&repos.users).await;
    let mut generator = NewTransactionGenerator::default();
    let transaction = repos
        .transactions
        .create_transaction(user.id, generator.generate())
        .await
        .unwrap();

    let first = NewReversal::new(
        transaction.id,
        Decimal::from_str("3.50").unwrap(),
        "Partial refund".to_owned(),
        transaction.transaction_date + Duration::hours(1),
    );
    let created = repos
        .reversals
        .create_reversal(user.id, first.clone())
        .await
        .unwrap();
    assert_eq!(created.transaction_id, transaction.id);
    assert_eq!(created.amount, first.amount);
    assert_eq!(created.description, first.description);
    assert_eq!(created.transaction_date, first.transaction_date);
    assert_eq!(created.created_by, user.id);
    assert_eq!(created.created_at, clock.now());
    assert_eq!(created.deleted, Deletion::Active);
    assert_eq!(repos.reversals.get_reversal(created.id).await.unwrap(), created);

    let mut earlier = first.clone();
    earlier.transaction_date = transaction.transaction_date;
    let earlier = repos
        .reversals
        .create_reversal(user.id, earlier)
        .await
        .unwrap();

    let reversals = repos.reversals.get_reversals(transaction.id).await.unwrap();
    assert_eq!(reversals, vec![earlier, created]);

    let result = repos.reversals.get_reversal(Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound { .. })));

    user.delete().await;
}

#[rstest]
#[ignore = "needs a PostgreSQL database"]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_reversal_rules(#[case] repo_type: RepoType) {
    let clock = utils::manual_clock();
    let repos = utils::build_repos(repo_type, clock.clone()).await;
    let user = TestUser::new(&repos.users).await;
    let mut generator = NewTransactionGenerator::default();
    let transaction = repos
        .transactions
        .create_transaction(user.id, generator.generate())
        .await
        .unwrap();

    let result = repos
        .reversals
        .create_reversal(user.id, generator.generate_reversal(Uuid::new_v4()))
        .await;
    assert_eq!(
        constraint_of(result),
        "transaction_reversals_transaction_id_fkey"
    );

    let result = repos
        .reversals
        .create_reversal(Uuid::new_v4(), generator.generate_reversal(transaction.id))
        .await;
    assert_eq!(constraint_of(result), "transaction_reversals_created_by_fkey");

    let mut negative = generator.generate_reversal(transaction.id);
    negative.amount = Decimal::from_str("-1").unwrap();
    let result = repos.reversals.create_reversal(user.id, negative).await;
    assert_eq!(constraint_of(result), "non_negative_amount");

    let mut future = generator.generate_reversal(transaction.id);
    future.transaction_date = clock.now() + Duration::seconds(1);
    let result = repos.reversals.create_reversal(user.id, future).await;
    assert_eq!(constraint_of(result), "transaction_date_not_future");

    let mut too_precise = generator.generate_reversal(transaction.id);
    too_precise.amount = Decimal::from_str("1.234").unwrap();
    let result = repos.reversals.create_reversal(user.id, too_precise).await;
    assert_eq!(constraint_of(result), "amount_precision");

    let new_reversal = generator.generate_reversal(transaction.id);
    repos
        .reversals
        .create_reversal(user.id, new_reversal.clone())
        .await
        .unwrap();
    let result = repos.reversals.create_reversal(user.id, new_reversal).await;
    match result {
        Err(RepoError::UniquenessViolation(constraint)) => {
            assert_eq!(constraint, "unique_reversal")
        }
        other => panic!("expected uniqueness violation, got {:?}", other),
    }

    user.delete().await;
}

#[rstest]
#[ignore = "needs a PostgreSQL database"]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_update_reversal(#[case] repo_type: RepoType) {
    let clock = utils::manual_clock();
    let repos = utils::build_repos(repo_type, clock.clone()).await;
    let user = TestUser::new(&repos.users).await;
    let mut generator = NewTransactionGenerator::default();
    let transaction = repos
        .transactions
        .create_transaction(user.id, generator.generate())
        .await
        .unwrap();
    let created = repos
        .reversals
        .create_reversal(user.id, generator.generate_reversal(transaction.id))
        .await
        .unwrap();

    clock.advance(Duration::days(1));
    let replacement = generator.generate_reversal(transaction.id);
    let updated = repos
        .reversals
        .update_reversal(created.id, replacement.clone())
        .await
        .unwrap();
    assert_eq!(updated.amount, replacement.amount);
    assert_eq!(updated.description, replacement.description);
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.updated_at, clock.now());
    assert_eq!(repos.reversals.get_reversal(created.id).await.unwrap(), updated);

    let result = repos
        .reversals
        .update_reversal(created.id, generator.generate_reversal(Uuid::new_v4()))
        .await;
    assert_eq!(
        constraint_of(result),
        "transaction_reversals_transaction_id_fkey"
    );

    let result = repos
        .reversals
        .update_reversal(Uuid::new_v4(), replacement)
        .await;
    assert!(matches!(result, Err(RepoError::NotFound { .. })));

    user.delete().await;
}

#[rstest]
#[ignore = "needs a PostgreSQL database"]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_soft_delete_reversal(#[case] repo_type: RepoType) {
    let clock = utils::manual_clock();
    let repos = utils::build_repos(repo_type, clock.clone()).await;
    let user = TestUser::new(&repos.users).await;
    let mut generator = NewTransactionGenerator::default();
    let transaction = repos
        .transactions
        .create_transaction(user.id, generator.generate())
        .await
        .unwrap();
    let reversal = repos
        .reversals
        .create_reversal(user.id, generator.generate_reversal(transaction.id))
        .await
        .unwrap();

    clock.advance(Duration::seconds(5));
    let deleted = repos
        .reversals
        .soft_delete_reversal(reversal.id)
        .await
        .unwrap();
    assert_eq!(deleted.deleted, Deletion::Deleted(clock.now()));

    let result = repos.reversals.get_reversal(reversal.id).await;
    assert!(matches!(result, Err(RepoError::NotFound { .. })));
    assert!(repos
        .reversals
        .get_reversals(transaction.id)
        .await
        .unwrap()
        .is_empty());
    let result = repos.reversals.soft_delete_reversal(reversal.id).await;
    assert!(matches!(result, Err(RepoError::NotFound { .. })));

    repos.reversals.delete_reversal(reversal.id).await.unwrap();
    let result = repos.reversals.delete_reversal(reversal.id).await;
    assert!(matches!(result, Err(RepoError::NotFound { .. })));

    // The reversed transaction is untouched.
    repos
        .transactions
        .get_transaction(transaction.id)
        .await
        .unwrap();

    user.delete().await;
}

#[rstest]
#[ignore = "needs a PostgreSQL database"]
#[case::sqlx(RepoType::SQLx)]
#[case::mem(RepoType::Mem)]
#[actix_rt::test]
async fn test_reversal_date_stored_at_microseconds(#[case] repo_type: RepoType) {
    let clock = utils::manual_clock();
    let repos = utils::build_repos(repo_type, clock.clone()).await;
    let user = TestUser::new(&repos.users).await;
    let mut generator = NewTransactionGenerator::default();
    let transaction = repos
        .transactions
        .create_transaction(user.id, generator.generate())
        .await
        .unwrap();
    let now = clock.now();

    let mut new_reversal = generator.generate_reversal(transaction.id);
    new_reversal.transaction_date = now + Duration::nanoseconds(250);
    let reversal = repos
        .reversals
        .create_reversal(user.id, new_reversal.clone())
        .await
        .unwrap();
    assert_eq!(reversal.transaction_date, now);
    assert_eq!(repos.reversals.get_reversal(reversal.id).await.unwrap(), reversal);

    new_reversal.transaction_date = now + Duration::nanoseconds(750);
    let result = repos.reversals.create_reversal(user.id, new_reversal.clone()).await;
    assert_eq!(constraint_of(result), "unique_reversal");

    new_reversal.transaction_date = now - Duration::hours(1) + Duration::nanoseconds(10);
    let updated = repos
        .reversals
        .update_reversal(reversal.id, new_reversal)
        .await
        .unwrap();
    assert_eq!(updated.transaction_date, now - Duration::hours(1));

    user.delete().await;
}
