pub mod posts;

pub use posts::{MessageResponse, WriteResponse};
