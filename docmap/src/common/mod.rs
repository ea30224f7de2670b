mod constants;
mod convertible;
mod value;

pub use constants::*;
pub use convertible::*;
pub use value::*;
