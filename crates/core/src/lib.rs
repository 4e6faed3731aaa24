pub mod catalog;
pub mod config;
pub mod domain;
pub mod editor;
pub mod errors;
pub mod numeric;
pub mod pricing;

pub use catalog::{CatalogError, CatalogLookup, StaticCatalog};
pub use domain::pack::{NewPack, Pack, PackId, ProductAssociation};
pub use domain::product::{ExternalProduct, ProductId};
pub use editor::{
    validate_create, validate_update, FieldFlags, ValidatedCreate, ValidatedUpdate,
    ValidationError, ValidationFailure,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use pricing::{compute_pricing, PackPricing, PricingDisplay};
