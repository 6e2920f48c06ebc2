mod artifact;
mod checkpoint;
mod decision;
mod file_modification;
mod todo;

pub use artifact::*;
pub use checkpoint::*;
pub use decision::*;
pub use file_modification::*;
pub use todo::*;
