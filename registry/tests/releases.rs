use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use pretty_assertions::assert_eq;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Set,
};

use registry::entity::{package, release, requirement};
use registry::error::{DependencyError, ReleaseError};
use registry::release::{all, count, create, delete, get, update, RequirementMap};

async fn setup() -> DatabaseConnection {
    // A single pooled connection keeps every statement on the same
    // in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let db = Database::connect(options).await.expect("connect");
    Migrator::up(&db, None).await.expect("migrate");
    db
}

async fn insert_package(db: &DatabaseConnection, name: &str) -> package::Model {
    let now = Utc::now();
    package::ActiveModel {
        name: Set(name.to_owned()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert package")
}

fn requirements(entries: &[(&str, Option<&str>)]) -> RequirementMap {
    entries
        .iter()
        .map(|(name, req)| ((*name).to_owned(), req.map(str::to_owned)))
        .collect()
}

async fn requirement_rows(db: &DatabaseConnection) -> u64 {
    requirement::Entity::find().count(db).await.expect("count")
}

#[tokio::test]
async fn create_then_get_with_no_requirements() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    let created = create(&db, &foo, "1.0.0", &RequirementMap::new(), None)
        .await
        .expect("create");
    assert_eq!(created.release.version, "1.0.0");
    assert!(created.requirements.is_empty());

    let fetched = get(&db, &foo, "1.0.0").await.expect("get");
    assert_eq!(fetched.release.version, "1.0.0");
    assert!(fetched.requirements.is_empty());
}

#[tokio::test]
async fn duplicate_version_is_rejected() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    create(&db, &foo, "1.0.0", &RequirementMap::new(), None)
        .await
        .expect("first create");

    let err = create(&db, &foo, "1.0.0", &RequirementMap::new(), None)
        .await
        .expect_err("second create must fail");

    let ReleaseError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "version");
    assert_eq!(errors[0].message, "has already been published");
}

#[tokio::test]
async fn invalid_version_is_rejected_before_any_write() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    let err = create(&db, &foo, "not-a-version", &RequirementMap::new(), None)
        .await
        .expect_err("create must fail");

    let ReleaseError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors[0].message, "is invalid");
    assert_eq!(count(&db).await.expect("count"), 0);
}

#[tokio::test]
async fn prerelease_version_is_rejected() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    let err = create(&db, &foo, "1.0.0-beta.1", &RequirementMap::new(), None)
        .await
        .expect_err("create must fail");

    let ReleaseError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors[0].message, "pre-release versions are not allowed");
}

#[tokio::test]
async fn unknown_dependency_rolls_back_the_release() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    let err = create(
        &db,
        &foo,
        "1.0.0",
        &requirements(&[("missing", Some(">= 1.0.0"))]),
        None,
    )
    .await
    .expect_err("create must fail");

    let ReleaseError::Requirements(errors) = err else {
        panic!("expected requirements error, got {err:?}");
    };
    assert_eq!(
        errors,
        vec![DependencyError::UnknownPackage {
            dependency: "missing".to_owned(),
        }]
    );

    // Nothing survives the rollback, neither the release row nor any
    // requirement row.
    assert_eq!(count(&db).await.expect("count"), 0);
    assert_eq!(requirement_rows(&db).await, 0);
}

#[tokio::test]
async fn one_bad_requirement_sinks_the_whole_batch() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    insert_package(&db, "bar").await;
    insert_package(&db, "baz").await;

    let err = create(
        &db,
        &foo,
        "1.0.0",
        &requirements(&[
            ("bar", Some(">= 1.0.0")),
            ("baz", Some("not-a-semver-req")),
        ]),
        None,
    )
    .await
    .expect_err("create must fail");

    let ReleaseError::Requirements(errors) = err else {
        panic!("expected requirements error, got {err:?}");
    };
    assert_eq!(
        errors,
        vec![DependencyError::InvalidRequirement {
            dependency: "baz".to_owned(),
            requirement: "not-a-semver-req".to_owned(),
        }]
    );

    // The valid "bar" entry must not have been persisted either.
    assert_eq!(count(&db).await.expect("count"), 0);
    assert_eq!(requirement_rows(&db).await, 0);
}

#[tokio::test]
async fn absent_requirement_means_any_version() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    insert_package(&db, "bar").await;

    create(&db, &foo, "1.0.0", &requirements(&[("bar", None)]), None)
        .await
        .expect("create");

    let fetched = get(&db, &foo, "1.0.0").await.expect("get");
    assert_eq!(fetched.requirements, requirements(&[("bar", None)]));
}

#[tokio::test]
async fn update_preserves_created_at_and_refreshes_updated_at() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    insert_package(&db, "bar").await;

    let reqs = requirements(&[("bar", Some(">= 1.0.0"))]);
    let original = create(&db, &foo, "1.0.0", &reqs, None).await.expect("create");

    let updated = update(&db, &original.release, &reqs).await.expect("update");

    assert_eq!(updated.release.version, original.release.version);
    assert_eq!(updated.requirements, reqs);
    assert_eq!(updated.release.created_at, original.release.created_at);
    assert!(updated.release.updated_at >= original.release.updated_at);

    // The recreated release is what get() now sees.
    let fetched = get(&db, &foo, "1.0.0").await.expect("get");
    assert_eq!(fetched.release.created_at, original.release.created_at);
    assert_eq!(fetched.requirements, reqs);
}

#[tokio::test]
async fn update_replaces_the_requirement_set_wholesale() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    insert_package(&db, "bar").await;
    insert_package(&db, "baz").await;

    let original = create(
        &db,
        &foo,
        "1.0.0",
        &requirements(&[("bar", Some(">= 1.0.0"))]),
        None,
    )
    .await
    .expect("create");

    let swapped = requirements(&[("baz", Some("^2.0"))]);
    update(&db, &original.release, &swapped).await.expect("update");

    let fetched = get(&db, &foo, "1.0.0").await.expect("get");
    assert_eq!(fetched.requirements, swapped);
    assert_eq!(requirement_rows(&db).await, 1);
}

#[tokio::test]
async fn failed_update_leaves_the_old_release_intact() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    insert_package(&db, "bar").await;

    let reqs = requirements(&[("bar", Some(">= 1.0.0"))]);
    let original = create(&db, &foo, "1.0.0", &reqs, None).await.expect("create");

    let err = update(
        &db,
        &original.release,
        &requirements(&[("nope", Some(">= 1.0.0"))]),
    )
    .await
    .expect_err("update must fail");
    assert!(matches!(err, ReleaseError::Requirements(_)));

    // The teardown inside the failed transaction was rolled back.
    let fetched = get(&db, &foo, "1.0.0").await.expect("get");
    assert_eq!(fetched.requirements, reqs);
}

#[tokio::test]
async fn mutation_is_refused_outside_the_edit_window() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    let now = Utc::now();
    let stale = release::ActiveModel {
        package_id: Set(foo.id),
        version: Set("1.0.0".to_owned()),
        created_at: Set(now - Duration::hours(2)),
        updated_at: Set(now - Duration::hours(2)),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("insert release");

    let err = update(&db, &stale, &RequirementMap::new())
        .await
        .expect_err("update must fail");
    match err {
        ReleaseError::EditWindowExpired { field, message } => {
            assert_eq!(field, "created_at");
            assert_eq!(
                message,
                "can only modify a release up to one hour after creation"
            );
        }
        other => panic!("expected edit window error, got {other:?}"),
    }

    let err = delete(&db, &stale).await.expect_err("delete must fail");
    match err {
        ReleaseError::EditWindowExpired { field, message } => {
            assert_eq!(field, "created_at");
            assert_eq!(
                message,
                "can only delete a release up to one hour after creation"
            );
        }
        other => panic!("expected edit window error, got {other:?}"),
    }

    // The stale release itself is untouched.
    assert_eq!(count(&db).await.expect("count"), 1);
}

#[tokio::test]
async fn all_lists_releases_newest_version_first() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;

    for version in ["1.0.0", "2.0.0", "1.5.0"] {
        create(&db, &foo, version, &RequirementMap::new(), None)
            .await
            .expect("create");
    }

    let releases = all(&db, &foo).await.expect("all");
    let versions: Vec<&str> = releases.iter().map(|r| r.version.as_str()).collect();
    assert_eq!(versions, vec!["2.0.0", "1.5.0", "1.0.0"]);
}

#[tokio::test]
async fn count_spans_all_packages() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    let bar = insert_package(&db, "bar").await;

    create(&db, &foo, "1.0.0", &RequirementMap::new(), None)
        .await
        .expect("create");
    create(&db, &foo, "1.1.0", &RequirementMap::new(), None)
        .await
        .expect("create");
    create(&db, &bar, "0.1.0", &RequirementMap::new(), None)
        .await
        .expect("create");

    assert_eq!(count(&db).await.expect("count"), 3);
}

#[tokio::test]
async fn publish_get_delete_round_trip() {
    let db = setup().await;
    let foo = insert_package(&db, "foo").await;
    insert_package(&db, "bar").await;

    let reqs = requirements(&[("bar", Some(">= 1.0.0"))]);
    create(&db, &foo, "1.0.0", &reqs, None).await.expect("create");

    let fetched = get(&db, &foo, "1.0.0").await.expect("get");
    assert_eq!(fetched.requirements, reqs);

    delete(&db, &fetched.release).await.expect("delete");

    let err = get(&db, &foo, "1.0.0").await.expect_err("get must fail");
    assert!(matches!(err, ReleaseError::NotFound));
    assert_eq!(requirement_rows(&db).await, 0);
}
