pub mod deterministic;
pub mod normalizer;
pub mod orchestrator;
pub mod router;
pub mod schema_kb;
pub mod shaper;
pub mod synthesizer;
pub mod validator;

pub use orchestrator::{answer, CancellationSignal};
