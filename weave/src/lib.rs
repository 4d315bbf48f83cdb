pub mod block;
pub mod options;
pub mod parser;

use crate::block::Block;
use crate::options::Options;

/// A parsed literate document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Blocks in source order. Ordering is significant: the renderer
    /// emits fragments in exactly this order.
    pub blocks: Vec<Block>,
    /// Render options from the frontmatter, defaults where unset.
    /// Read-only once parsing completes.
    pub options: Options,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
