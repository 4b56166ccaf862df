//! Page logic: list controller, entity forms and the collaborators they call.

pub mod form;
pub mod i18n;
pub mod list_controller;
pub mod notifier;

pub use form::{EntityForm, FieldValue, FormMode, SubmitOutcome};
pub use i18n::{Catalog, Translate};
pub use list_controller::{
    DeleteOutcome, ListController, ListOptions, ListState, LoadOutcome, LoadState,
};
pub use notifier::{Confirmation, Level, Notifier, RecordingNotifier};
