//! Application services - use cases composed from ports and domain rules.

mod blog;

pub use blog::{
    BlogConfig, BlogService, CategoryPage, Created, Guarded, MutationOutcome, PostDetail,
    ProfilePage, Repositories,
};
