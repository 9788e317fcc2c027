pub mod error;
pub mod i18n;
pub mod locale;
pub mod sql_text;

pub use error::{PipelineError, PipelineResult};
pub use i18n::{get_locale, set_locale};
pub use locale::infer_query_locale;
