mod layout;
mod uid;

pub use layout::*;
pub use uid::*;
