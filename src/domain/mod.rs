mod account;
mod payment;

pub use account::*;
pub use payment::*;
