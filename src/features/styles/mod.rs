mod catalog;
pub mod handler;

pub use catalog::{PromptCatalog, Style, StyleInfo, UnknownStyle};
pub use handler::{create_styles_router, get_prompts};
