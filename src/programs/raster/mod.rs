mod translate;
mod warp;

pub use translate::*;
pub use warp::*;
