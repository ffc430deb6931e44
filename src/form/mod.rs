//! Submit-and-branch handling for AJAX forms.
//!
//! A form's successful controls are collected into a [`FieldMap`], posted as JSON through a [`FormTransport`],
//! and the answer is decoded into a [`SubmitOutcome`]. [`Navigation::route`] then decides between showing the
//! returned errors inline and leaving the page (redirect or reload). [`FormSubmitter`] bundles the three steps for
//! a single form; DOM access is confined to [`dom`] and [`BrowserNavigator`].

pub mod dom;
mod error;
mod fields;
mod dispatch;
mod outcome;
mod router;
mod submit;

pub use dispatch::{DEFAULT_TIMEOUT, FormTransport, HttpTransport, timeout};
pub use error::SubmitError;
pub use fields::{Control, ControlKind, FieldMap, collect_fields};
pub use outcome::SubmitOutcome;
pub use router::{BrowserNavigator, ErrorDisplay, Navigation, Navigator};
pub use submit::FormSubmitter;
