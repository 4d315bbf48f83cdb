pub mod cache;
pub mod error;
pub mod evaluator;
pub mod markdown;
pub mod renderer;

pub use error::{DiagnosticError, RenderError};
pub use evaluator::{CommandEvaluator, Evaluator, ExecutionError};
pub use renderer::{Fragment, RenderedDocument, Renderer, render};
