pub mod shutdown;
pub mod side_effect;
pub mod time;
pub mod types;
pub mod validations;

pub use shutdown::*;
pub use side_effect::*;
pub use time::*;
pub use types::*;
pub use validations::*;
