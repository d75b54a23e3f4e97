pub mod metrics;
pub mod model_client;
pub mod prompt;
pub mod providers;
pub mod response;

pub use model_client::{extract_text, Generation, ModelClient, ModelState};
pub use prompt::build_prompt;
