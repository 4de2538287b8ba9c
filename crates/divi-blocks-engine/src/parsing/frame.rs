/// A block under construction on the parser stack.
///
/// `B` is whatever handle the parser keeps for the block: the store-backed
/// parser keeps a [`BlockId`](super::BlockId), the stock parser owns a
/// [`ParsedBlock`](super::ParsedBlock) directly. Offsets are byte offsets
/// into the document being parsed.
#[derive(Debug, Clone)]
pub struct BlockParserFrame<B> {
    pub block: B,
    /// Where the opening delimiter starts.
    pub token_start: usize,
    /// Length of the opening delimiter.
    pub token_length: usize,
    /// End of the last piece of content already attached to the block.
    pub prev_offset: usize,
    /// Start of freeform HTML that preceded the opener, if any.
    pub leading_html_start: Option<usize>,
}

impl<B> BlockParserFrame<B> {
    pub fn new(
        block: B,
        token_start: usize,
        token_length: usize,
        prev_offset: usize,
        leading_html_start: Option<usize>,
    ) -> Self {
        Self {
            block,
            token_start,
            token_length,
            prev_offset,
            leading_html_start,
        }
    }
}
