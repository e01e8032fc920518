pub mod collection;
pub mod item;
pub mod request;
pub mod view;

pub use collection::{create, list};
pub use item::{delete, read, update};
pub use view::ProductView;
