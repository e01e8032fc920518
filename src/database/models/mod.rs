pub mod product;
pub mod profile;

pub use product::{NewProduct, Product, ProductListing, ProductPatch, ProductQuery};
pub use profile::Profile;
