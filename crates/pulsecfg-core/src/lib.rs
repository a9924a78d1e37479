pub mod binding;
pub mod codec;
pub mod config;
pub mod document;
pub mod editor;
pub mod graph;
pub mod ids;
pub mod markup;
pub mod notice;
pub mod path;
pub mod render;
pub mod sample;
pub mod section;
pub mod view;

pub use binding::{
    BindMode, BindingEngine, BindingError, FieldBinding, FieldRole, FlushOutcome, FlushReport,
    FlushScope, FormState, FormSurface, RawValue, ValueKind,
};
pub use codec::CodecError;
pub use config::EditorConfig;
pub use document::{Document, EntityKind, EntitySlot, IntegrityError, Protocol, TagField};
pub use editor::{Confirmation, Editor, EditorError, Export};
pub use graph::{ReferenceGraph, Scope};
pub use ids::{IdSource, RandomIds, SequentialIds};
pub use markup::{Markup, MarkupError};
pub use notice::{Notice, NoticeLevel, Notices};
pub use path::{FieldPath, PathError};
pub use section::{Dirty, Section};
pub use view::{Action, ViewNode};

#[cfg(test)]
mod binding_tests;
#[cfg(test)]
mod editor_tests;
#[cfg(test)]
mod integrity_tests;
#[cfg(test)]
mod render_tests;
