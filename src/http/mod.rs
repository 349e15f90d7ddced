pub mod response;
pub mod router;

pub use router::{action, PathParams, RequestContext, Router};
