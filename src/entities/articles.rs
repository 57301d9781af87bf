use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub source_id: Option<String>,

    pub source_name: String,

    pub author: Option<String>,

    pub title: String,

    pub description: String,

    /// Canonical URL, the de-duplication key for ingestion.
    #[sea_orm(unique)]
    pub url: String,

    pub url_to_image: Option<String>,

    /// ISO-8601 publication timestamp as delivered by the news API.
    pub published_at: String,

    pub content: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookmarks::Entity")]
    Bookmarks,
}

impl Related<super::bookmarks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookmarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
