use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::entity::{package, requirement};
use crate::error::{DependencyError, ReleaseError, ReleaseResult};
use crate::release::RequirementMap;

/// Resolves and persists a release's whole requirement set, or reports
/// every entry that failed. Runs inside the caller's transaction:
/// a `Requirements` error means the caller must roll back, so either
/// every row lands or none does.
pub async fn create_all<C: ConnectionTrait>(
    conn: &C,
    release_id: i32,
    requirements: &RequirementMap,
) -> ReleaseResult<RequirementMap> {
    if requirements.is_empty() {
        return Ok(RequirementMap::new());
    }

    let ids = resolve_dependency_ids(conn, requirements).await?;

    let now = Utc::now();
    let mut errors = Vec::new();
    let mut rows = Vec::new();

    for (name, declared) in requirements {
        if !super::validate::requirement_valid(declared.as_deref()) {
            errors.push(DependencyError::InvalidRequirement {
                dependency: name.clone(),
                requirement: declared.clone().unwrap_or_default(),
            });
            continue;
        }

        let Some(&dependency_id) = ids.get(name.as_str()) else {
            errors.push(DependencyError::UnknownPackage {
                dependency: name.clone(),
            });
            continue;
        };

        rows.push(requirement::ActiveModel {
            release_id: Set(release_id),
            dependency_id: Set(dependency_id),
            requirement: Set(declared.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
    }

    if !errors.is_empty() {
        tracing::debug!(release_id, failed = errors.len(), "requirement batch rejected");
        return Err(ReleaseError::Requirements(errors));
    }

    requirement::Entity::insert_many(rows).exec(conn).await?;

    Ok(requirements.clone())
}

/// One bulk lookup from dependency name to package id. Unknown names
/// are simply absent from the result.
async fn resolve_dependency_ids<C: ConnectionTrait>(
    conn: &C,
    requirements: &RequirementMap,
) -> ReleaseResult<HashMap<String, i32>> {
    let names: Vec<&str> = requirements.keys().map(String::as_str).collect();

    let packages = package::Entity::find()
        .filter(package::Column::Name.is_in(names))
        .all(conn)
        .await?;

    Ok(packages.into_iter().map(|p| (p.name, p.id)).collect())
}
