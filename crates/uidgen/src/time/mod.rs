mod clock;
mod epoch;
mod interface;
mod julian;

pub use clock::*;
pub use epoch::*;
pub use interface::*;
pub use julian::*;
