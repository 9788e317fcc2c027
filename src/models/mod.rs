pub mod domain;
pub mod envelope;
pub mod plan;
pub mod turn;

pub use domain::{EmbeddingVector, SchemaEmbedding};
pub use envelope::{ResultEnvelope, Visualization};
pub use plan::{AggregateParams, QueryFamily, QueryPlan, StatColumn};
pub use turn::{DEFAULT_HISTORY_TURNS, Role, Turn, trim_history};
