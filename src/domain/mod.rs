pub mod error;
pub mod model;
pub mod session;

pub use error::AppError;
pub use model::{MediaKind, PostMetadata, Timings};
pub use session::Session;
