//! Custom property definitions and catalogue
//!
//! `erm-fields` is a schema-only crate. It owns the closed catalogue of typed
//! custom-property definitions a form may assign to rows, and knows nothing
//! about the values entered against them.
//!
//! # Architecture
//!
//! - **Schema-only**: Owns definitions, not values
//! - **YAML on disk**: One `.yaml` file per definition under `definitions/`
//! - **Ordered**: Catalogue order is `(order, value)`, and is the display order
//!   for primary properties
//! - **Default seeding**: `with_defaults()` writes defaults that don't exist,
//!   preserves customizations

pub mod catalogue;
pub mod error;
pub mod types;

pub use catalogue::{Catalogue, CatalogueContext, CatalogueContextBuilder, CatalogueDefaults};
pub use error::{FieldsError, Result};
pub use types::{CustomPropertyDefinition, PropertyType, SelectOption};
