mod issuer;
mod mutex;

pub use issuer::*;
pub use mutex::*;
