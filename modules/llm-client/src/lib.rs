pub mod claude;
pub mod openai;
pub mod parse;
pub mod traits;
pub mod util;

pub use claude::Claude;
pub use openai::OpenAi;
pub use parse::{parse_json, Parsed};
pub use traits::{GenPrompt, TextGenerator};
