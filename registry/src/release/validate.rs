use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use semver::{Version, VersionReq};

use crate::entity::release;
use crate::error::FieldError;

/// A requirement is valid when absent (no constraint) or when it
/// parses as a version requirement expression.
pub fn requirement_valid(requirement: Option<&str>) -> bool {
    match requirement {
        None => true,
        Some(raw) => VersionReq::parse(raw).is_ok(),
    }
}

/// Field validation shared by create and update: the version must
/// parse and must not be a pre-release.
pub fn validate(version: &str) -> Vec<FieldError> {
    match Version::parse(version) {
        Ok(parsed) if parsed.pre.is_empty() => Vec::new(),
        Ok(_) => vec![FieldError::new(
            "version",
            "pre-release versions are not allowed",
        )],
        Err(_) => vec![FieldError::new("version", "is invalid")],
    }
}

/// Create profile: `validate` plus the uniqueness pre-check against
/// existing releases of the package. The unique index on
/// (package_id, version) still backs this up at commit time.
pub async fn validate_create<C: ConnectionTrait>(
    conn: &C,
    package_id: i32,
    version: &str,
) -> Result<Vec<FieldError>, DbErr> {
    let mut errors = validate(version);

    if errors.is_empty() {
        let taken = release::Entity::find()
            .filter(release::Column::PackageId.eq(package_id))
            .filter(release::Column::Version.eq(version))
            .count(conn)
            .await?
            > 0;

        if taken {
            errors.push(FieldError::new("version", "has already been published"));
        }
    }

    Ok(errors)
}
