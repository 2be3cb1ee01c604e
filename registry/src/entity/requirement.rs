use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// A dependency declaration belonging to one release. Rows only exist
/// as part of a release create/recreate and are bulk-deleted with it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "requirements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub release_id: i32,
    /// The required package; must exist when the row is created.
    pub dependency_id: i32,
    /// Version constraint (e.g. ">= 1.0.0"). None means any version.
    pub requirement: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::release::Entity",
        from = "Column::ReleaseId",
        to = "super::release::Column::Id"
    )]
    Release,
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::DependencyId",
        to = "super::package::Column::Id"
    )]
    Dependency,
}

impl Related<super::release::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Release.def()
    }
}

impl Related<super::package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dependency.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
