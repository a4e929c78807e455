mod common;

use common::{setup, user_ids, Ban, Order, User};
use repokit_core::{
    QueryParameters, RepoError, Repository, Rule, SoftDeletesRepository, SqliteRepository,
};

#[test]
fn scopes_split_active_and_archived_rows() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    assert_eq!(user_ids(&repo.all().unwrap()), vec![1, 2, 3, 4]);
    assert_eq!(
        user_ids(&repo.with_trashed(None).unwrap()),
        vec![1, 2, 3, 4, 5]
    );
    assert_eq!(user_ids(&repo.only_trashed(None).unwrap()), vec![5]);

    let expensive = QueryParameters::builder()
        .filter("price", Rule::gte(200))
        .build();
    assert_eq!(
        user_ids(&repo.with_trashed(Some(&expensive)).unwrap()),
        vec![3, 5]
    );
}

#[test]
fn trashed_lookups_by_criteria_and_id() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    let ali = QueryParameters::builder()
        .filter("name", Rule::like("ali"))
        .build();
    assert!(repo.find_by(Some(&ali)).unwrap().is_none());
    assert_eq!(repo.find_with_trashed_by(Some(&ali)).unwrap().unwrap().id, 5);
    assert_eq!(repo.find_only_trashed_by_or_fail(Some(&ali)).unwrap().id, 5);

    let user = repo.find_with_trashed_by_id_or_fail(5, &[], &["id", "deleted_at"]).unwrap();
    assert!(user.deleted_at.is_some());
    assert!(repo.find_only_trashed_by_id(1, &[], &[]).unwrap().is_none());

    let err = repo.find_only_trashed_by_id_or_fail(1, &[], &[]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: Some(1), .. }));
    let err = repo
        .find_with_trashed_by_or_fail(Some(
            &QueryParameters::builder().filter("name", "Nobody").build(),
        ))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn trashed_pagination_counts_the_scope() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    let with = repo.with_trashed_paginate(None, 2, "page", Some(3)).unwrap();
    assert_eq!(with.total, 5);
    assert_eq!(with.last_page, 3);
    assert_eq!(with.items.len(), 1);

    let only = repo.only_trashed_paginate(None, 10, "page", None).unwrap();
    assert_eq!(only.total, 1);
    assert_eq!(only.current_page, 1);
}

#[test]
fn restore_flips_archived_rows_back_to_active() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    assert!(repo.restore(5).unwrap());

    assert!(user_ids(&repo.all().unwrap()).contains(&5));
    let active_named_ali = QueryParameters::builder()
        .filter("name", Rule::like("ali"))
        .build();
    assert_eq!(user_ids(&repo.get(Some(&active_named_ali)).unwrap()), vec![5]);
    assert!(repo.only_trashed(None).unwrap().is_empty());
}

#[test]
fn restore_requires_an_archived_row() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    assert!(matches!(
        repo.restore(1).unwrap_err(),
        RepoError::NotFound { id: Some(1), .. }
    ));
    assert!(repo.restore(404).unwrap_err().is_not_found());
}

#[test]
fn delete_then_restore_round_trips_visibility() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    repo.delete(2).unwrap();
    assert_eq!(user_ids(&repo.only_trashed(None).unwrap()), vec![2, 5]);

    repo.restore(2).unwrap();
    assert_eq!(user_ids(&repo.only_trashed(None).unwrap()), vec![5]);
    assert!(repo.find_by_id(2, &[], &[]).unwrap().is_some());
}

#[test]
fn force_delete_removes_rows_in_any_state() {
    let conn = setup();
    let repo = SqliteRepository::<User>::new(&conn);

    assert!(repo.force_delete(5).unwrap());
    assert!(repo.force_delete(4).unwrap());
    assert_eq!(user_ids(&repo.with_trashed(None).unwrap()), vec![1, 2, 3]);
    assert!(repo.force_delete(5).unwrap_err().is_not_found());
}

#[test]
fn archived_related_rows_are_hidden_from_relations() {
    let conn = setup();
    let orders = SqliteRepository::<Order>::new(&conn);

    assert_eq!(orders.all().unwrap().len(), 3);
    assert_eq!(orders.only_trashed(None).unwrap()[0].id, 4);

    orders.restore(4).unwrap();
    let users = SqliteRepository::<User>::new(&conn);
    let with_orders = QueryParameters::builder().exists(["orders"]).build();
    assert_eq!(
        user_ids(&users.get(Some(&with_orders)).unwrap()),
        vec![1, 2, 3]
    );
}

#[test]
fn tables_without_archive_column_are_unsupported() {
    let conn = setup();
    let repo = SqliteRepository::<Ban>::new(&conn);

    assert!(matches!(
        repo.with_trashed(None).unwrap_err(),
        RepoError::SoftDeletesUnsupported("bans")
    ));
    assert!(matches!(
        repo.restore(1).unwrap_err(),
        RepoError::SoftDeletesUnsupported("bans")
    ));
    assert!(matches!(
        repo.force_delete(1).unwrap_err(),
        RepoError::SoftDeletesUnsupported(_)
    ));
    assert_eq!(repo.all().unwrap().len(), 1);
}
