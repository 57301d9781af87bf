pub use super::articles::Entity as Articles;
pub use super::bookmarks::Entity as Bookmarks;
pub use super::search_history::Entity as SearchHistory;
pub use super::user_preferences::Entity as UserPreferences;
pub use super::users::Entity as Users;
