pub mod permissions;
pub mod registry;
pub mod view;

pub use permissions::*;
pub use registry::*;
pub use view::*;
