pub mod clock;
pub mod error;
pub mod fragment;
pub mod id;
pub mod note;

pub use clock::*;
pub use error::*;
pub use fragment::*;
pub use id::*;
pub use note::*;
