use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};

use crate::entity::{package, release, requirement};
use crate::error::{FieldError, ReleaseError, ReleaseResult};
use crate::release::{validate, ReleaseWithRequirements, RequirementMap};

/// Publishes a new release of `package`. Field validation runs before
/// any transaction is opened; the release row and its requirement rows
/// are then written inside one transaction and either all commit or
/// none do.
///
/// `created_at` is only supplied by the update path, which recreates a
/// release while preserving its original creation time; fresh creates
/// pass `None`.
pub async fn create(
    db: &DatabaseConnection,
    package: &package::Model,
    version: &str,
    requirements: &RequirementMap,
    created_at: Option<DateTime<Utc>>,
) -> ReleaseResult<ReleaseWithRequirements> {
    let errors = validate::validate_create(db, package.id, version).await?;
    if !errors.is_empty() {
        return Err(ReleaseError::Validation(errors));
    }

    let txn = db.begin().await?;

    match insert_release(&txn, package.id, version, requirements, created_at).await {
        Ok(created) => {
            txn.commit().await?;
            tracing::info!(package = %package.name, version, "release published");
            Ok(created)
        }
        Err(err) => {
            rollback(txn).await;
            Err(err)
        }
    }
}

/// Replaces a release's requirement set. Modelled as full teardown and
/// rebuild in one transaction: the old requirement rows and the release
/// row are deleted, then the create path runs again with the original
/// `created_at`. The recreated release carries a fresh `updated_at` and
/// the same atomicity guarantee as a fresh create.
pub async fn update(
    db: &DatabaseConnection,
    release: &release::Model,
    requirements: &RequirementMap,
) -> ReleaseResult<ReleaseWithRequirements> {
    if !editable(release, Utc::now()) {
        return Err(ReleaseError::edit_window_expired(
            "can only modify a release up to one hour after creation",
        ));
    }

    // The version value is unchanged, so the uniqueness profile is
    // skipped; the field checks still run.
    let errors = validate::validate(&release.version);
    if !errors.is_empty() {
        return Err(ReleaseError::Validation(errors));
    }

    let txn = db.begin().await?;

    let result = async {
        delete_rows(&txn, release).await?;
        insert_release(
            &txn,
            release.package_id,
            &release.version,
            requirements,
            Some(release.created_at),
        )
        .await
    }
    .await;

    match result {
        Ok(recreated) => {
            txn.commit().await?;
            tracing::info!(release_id = release.id, version = %release.version, "release updated");
            Ok(recreated)
        }
        Err(err) => {
            rollback(txn).await;
            Err(err)
        }
    }
}

/// Removes a release and all of its requirement rows in one
/// transaction. Only permitted inside the edit window.
pub async fn delete(db: &DatabaseConnection, release: &release::Model) -> ReleaseResult<()> {
    if !editable(release, Utc::now()) {
        return Err(ReleaseError::edit_window_expired(
            "can only delete a release up to one hour after creation",
        ));
    }

    let txn = db.begin().await?;

    match delete_rows(&txn, release).await {
        Ok(()) => {
            txn.commit().await?;
            tracing::info!(release_id = release.id, version = %release.version, "release deleted");
            Ok(())
        }
        Err(err) => {
            rollback(txn).await;
            Err(err)
        }
    }
}

/// The mutability policy: a release may be changed for one hour after
/// its original creation, measured in UTC. Updates do not extend the
/// window. Pre-releases are held to the same window for now; whether
/// they should stay editable longer is an open product question.
pub fn editable(release: &release::Model, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(release.created_at) <= Duration::hours(1)
}

/// The single create path, shared by `create` and `update`. Inserts
/// the release row, then resolves and persists the requirement batch;
/// any failure leaves the caller to roll the transaction back.
async fn insert_release<C: ConnectionTrait>(
    conn: &C,
    package_id: i32,
    version: &str,
    requirements: &RequirementMap,
    created_at: Option<DateTime<Utc>>,
) -> ReleaseResult<ReleaseWithRequirements> {
    let now = Utc::now();

    let model = release::ActiveModel {
        package_id: Set(package_id),
        version: Set(version.to_owned()),
        created_at: Set(created_at.unwrap_or(now)),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = model.insert(conn).await.map_err(map_insert_error)?;

    let requirements =
        super::requirements::create_all(conn, inserted.id, requirements).await?;

    Ok(ReleaseWithRequirements {
        release: inserted,
        requirements,
    })
}

async fn delete_rows(txn: &DatabaseTransaction, release: &release::Model) -> ReleaseResult<()> {
    requirement::Entity::delete_many()
        .filter(requirement::Column::ReleaseId.eq(release.id))
        .exec(txn)
        .await?;

    release::Entity::delete_by_id(release.id).exec(txn).await?;

    Ok(())
}

/// A unique-index conflict on (package_id, version) means another
/// publish of the same version won the race after our pre-check;
/// surface it in the same shape as the validation failure.
fn map_insert_error(err: DbErr) -> ReleaseError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ReleaseError::Validation(vec![
            FieldError::new("version", "has already been published"),
        ]),
        _ => ReleaseError::Database(err),
    }
}

async fn rollback(txn: DatabaseTransaction) {
    if let Err(err) = txn.rollback().await {
        tracing::warn!(error = ?err, "transaction rollback failed");
    }
}
