mod archive;
pub mod client;
mod filename;
pub mod handler;
pub mod models;
mod pipeline;

pub use archive::build_zip;
pub use client::ImageGenerationClient;
pub use filename::{sanitized_stem, secure_filename};
pub use handler::{create_coloring_router, process_images};
pub use models::{GeneratedImage, ImageFormat, UploadedImage};
pub use pipeline::process_batch;
