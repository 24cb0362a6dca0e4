//! Custom property editor.
//!
//! A closed catalogue of typed definitions is mapped onto editable rows.
//! Primary definitions form a fixed group; optional ones can be added,
//! renamed and deleted, with at most one row per definition. Values are
//! stored in the form under `customProperties[definition][0]`.
//!
//! The pieces, bottom-up:
//!
//! - [`entry`]: stored entries and the singleton-array storage rule
//! - [`state`]: the working list of rows and its reconciliation guard
//! - [`reducer`]: pure `(state, action) -> transition`
//! - [`validate`]: type-dependent value checks
//! - [`view`]: the grouped, render-only view model
//! - [`editor`]: all of the above bound to a [`FormState`](crate::FormState)

pub mod editor;
pub mod entry;
pub mod reducer;
pub mod state;
pub mod validate;
pub mod view;

pub use editor::CustomPropertyEditor;
pub use entry::{CustomPropertyEntry, EntryPatch, PropertyValues};
pub use reducer::{reduce, rename_targets, Action, Transition};
pub use state::{EditorState, Phase};
pub use validate::{check_type, note_without_value, DecimalFormat, PropertyValidator};
pub use view::{CustomPropertiesView, PropertyRow};
