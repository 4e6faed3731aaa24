pub mod pack;
pub mod product;
