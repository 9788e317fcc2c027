pub mod query;

pub use query::post_query;
