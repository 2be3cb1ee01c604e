use std::cmp::Ordering;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
};
use semver::Version;

use crate::entity::{package, release, requirement};
use crate::error::{ReleaseError, ReleaseResult};
use crate::release::{ReleaseWithRequirements, RequirementMap};

/// Looks up one release of `package` by exact version and resolves its
/// requirement list against the dependency packages.
pub async fn get(
    db: &DatabaseConnection,
    package: &package::Model,
    version: &str,
) -> ReleaseResult<ReleaseWithRequirements> {
    let Some(release) = release::Entity::find()
        .filter(release::Column::PackageId.eq(package.id))
        .filter(release::Column::Version.eq(version))
        .one(db)
        .await?
    else {
        return Err(ReleaseError::NotFound);
    };

    let requirements = requirements_for(db, release.id).await?;

    Ok(ReleaseWithRequirements {
        release,
        requirements,
    })
}

/// Every release of `package`, newest version first.
pub async fn all(
    db: &DatabaseConnection,
    package: &package::Model,
) -> ReleaseResult<Vec<release::Model>> {
    let mut releases = release::Entity::find()
        .filter(release::Column::PackageId.eq(package.id))
        .all(db)
        .await?;

    releases.sort_by(|a, b| by_version_descending(&a.version, &b.version));

    Ok(releases)
}

/// Total number of release rows across all packages.
pub async fn count(db: &DatabaseConnection) -> ReleaseResult<u64> {
    Ok(release::Entity::find().count(db).await?)
}

/// Joins a release's requirement rows to their dependency packages,
/// producing the name-to-constraint mapping callers work with.
async fn requirements_for(db: &DatabaseConnection, release_id: i32) -> Result<RequirementMap, DbErr> {
    let rows = requirement::Entity::find()
        .filter(requirement::Column::ReleaseId.eq(release_id))
        .find_also_related(package::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(row, dependency)| dependency.map(|p| (p.name, row.requirement)))
        .collect())
}

/// Stored versions were validated at publish time, so both sides parse
/// in practice; anything unparsable sorts as equal rather than
/// panicking mid-listing.
fn by_version_descending(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        _ => Ordering::Equal,
    }
}
