pub mod json_body;

pub use json_body::JsonObject;
