use crate::entities::{articles, prelude::*};
use crate::models::article::NewArticle;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Conjunctive filter over the articles table. Every field that is present
/// narrows the result set; an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ArticleSearch {
    pub q: Option<String>,
    pub author: Option<String>,
    pub source: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ArticleSearch {
    fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(q) = &self.q {
            cond = cond.add(
                Condition::any()
                    .add(articles::Column::Title.contains(q))
                    .add(articles::Column::Description.contains(q))
                    .add(articles::Column::Content.contains(q)),
            );
        }

        if let Some(author) = &self.author {
            cond = cond.add(articles::Column::Author.contains(author));
        }

        if let Some(source) = &self.source {
            cond = cond.add(articles::Column::SourceName.contains(source));
        }

        // Inclusive bounds; ISO-8601 strings compare correctly as text.
        if let Some(from) = &self.from {
            cond = cond.add(articles::Column::PublishedAt.gte(from.as_str()));
        }

        if let Some(to) = &self.to {
            cond = cond.add(articles::Column::PublishedAt.lte(to.as_str()));
        }

        cond
    }
}

pub struct ArticleRepository {
    conn: DatabaseConnection,
}

impl ArticleRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert_batch(&self, batch: &[NewArticle]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let models = batch.iter().map(|a| articles::ActiveModel {
            source_id: Set(a.source_id.clone()),
            source_name: Set(a.source_name.clone()),
            author: Set(a.author.clone()),
            title: Set(a.title.clone()),
            description: Set(a.description.clone()),
            url: Set(a.url.clone()),
            url_to_image: Set(a.url_to_image.clone()),
            published_at: Set(a.published_at.clone()),
            content: Set(a.content.clone()),
            ..Default::default()
        });

        Articles::insert_many(models).exec(&self.conn).await?;
        Ok(())
    }

    /// Every stored URL, for ingestion-side de-duplication.
    pub async fn urls(&self) -> Result<Vec<String>> {
        let urls = Articles::find()
            .select_only()
            .column(articles::Column::Url)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;

        Ok(urls)
    }

    /// One page of matching articles, newest publication first, plus the
    /// total count under the same predicate.
    pub async fn page(
        &self,
        search: &ArticleSearch,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<articles::Model>, u64)> {
        let paginator = Articles::find()
            .filter(search.condition())
            .order_by_desc(articles::Column::PublishedAt)
            .order_by_desc(articles::Column::Id)
            .paginate(&self.conn, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok((items, total))
    }

    pub async fn get(&self, id: i32) -> Result<Option<articles::Model>> {
        let article = Articles::find_by_id(id).one(&self.conn).await?;
        Ok(article)
    }

    pub async fn sources(&self) -> Result<Vec<String>> {
        let sources = Articles::find()
            .select_only()
            .column(articles::Column::SourceName)
            .distinct()
            .order_by_asc(articles::Column::SourceName)
            .into_tuple::<String>()
            .all(&self.conn)
            .await?;

        Ok(sources)
    }

    pub async fn count(&self) -> Result<u64> {
        let count = Articles::find().count(&self.conn).await?;
        Ok(count)
    }
}
