pub mod conversion;
pub mod definition;
pub mod editor;
pub mod history;
pub mod validation;
pub mod value;

pub use conversion::*;
pub use definition::*;
pub use editor::{EditorConnection, EditorNode, EditorWorkflow};
pub use history::*;
pub use validation::*;
pub use value::*;
