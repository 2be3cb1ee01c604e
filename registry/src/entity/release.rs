use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// One published version of a package.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "releases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owning package, immutable once created.
    pub package_id: i32,
    /// Valid non-prerelease semver, unique within the owning package.
    /// The migration also puts a unique index on (package_id, version)
    /// so concurrent publishes conflict at commit.
    pub version: String,
    /// Set at first creation and preserved across updates; the one-hour
    /// edit window is measured from this.
    pub created_at: DateTime<Utc>,
    /// Refreshed every time the release is created or recreated.
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::package::Entity",
        from = "Column::PackageId",
        to = "super::package::Column::Id"
    )]
    Package,
    #[sea_orm(has_many = "super::requirement::Entity")]
    Requirement,
}

impl Related<super::package::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Package.def()
    }
}

impl Related<super::requirement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requirement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
