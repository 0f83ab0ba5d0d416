pub mod health;
pub mod posts;

pub use health::{health_check, liveness, metrics_endpoint, readiness_check};
pub use posts::{
    create_post, delete_post, get_post, list_posts, method_not_allowed, patch_post,
    route_not_found, update_post,
};
