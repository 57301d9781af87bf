pub mod ingest;
pub use ingest::{IngestError, IngestService, IngestStats};

pub mod articles;
pub use articles::{ArticleService, Pagination, QueryError};

pub mod auth;
pub use auth::{AuthError, AuthService, AuthUser};

pub mod bookmarks;
pub use bookmarks::{BookmarkError, BookmarkService};
