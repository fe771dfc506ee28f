pub mod api;
pub mod request;
pub mod status;

pub use api::*;
pub use request::*;
pub use status::*;
