mod issuer_pool;

pub use issuer_pool::*;
