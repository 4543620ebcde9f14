//! Application state management modules.

mod classes;
mod clipboard;
mod filter;
mod project;
mod row_index;
mod store;
mod tasks;

pub use classes::LabelHistory;
pub use clipboard::{Clipboard, PasteOutcome};
pub use filter::{ClassFilter, ClassSelection};
pub use project::{ProjectState, natural_cmp};
pub use row_index::{RowId, RowIndex};
pub use store::{AnnotationStore, CleanupStatus, LoadReport};
pub use tasks::{Task, TaskQueue};
