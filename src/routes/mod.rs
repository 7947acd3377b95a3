pub mod auth;

pub mod users;

pub mod batches;

pub mod classes;

pub mod recordings;

pub use auth::configure_auth_routes;
pub use batches::configure_batch_routes;
pub use classes::configure_class_routes;
pub use recordings::configure_recording_routes;
pub use users::configure_user_routes;
