use log::warn;

use super::default_parser::ParsedBlock;

pub const PLACEHOLDER_BLOCK: &str = "divi/placeholder";

/// Clean a freshly parsed tree before it is reused as content.
///
/// Whitespace-only freeform blocks are dropped and `divi/placeholder`
/// wrappers are replaced by their children. Nesting deeper than `max_depth`
/// is left as found.
pub fn normalize_blocks(blocks: Vec<ParsedBlock>, max_depth: usize) -> Vec<ParsedBlock> {
    normalize_level(blocks, 0, max_depth)
}

fn normalize_level(blocks: Vec<ParsedBlock>, depth: usize, max_depth: usize) -> Vec<ParsedBlock> {
    blocks
        .into_iter()
        .flat_map(|block| normalize_block(block, depth, max_depth))
        .collect()
}

fn normalize_block(mut block: ParsedBlock, depth: usize, max_depth: usize) -> Vec<ParsedBlock> {
    if depth >= max_depth {
        warn!("Block nesting exceeds {max_depth} levels, not normalizing further");
        return vec![block];
    }
    if block.is_freeform() && block.inner_html.trim().is_empty() {
        return Vec::new();
    }

    let children = std::mem::take(&mut block.inner_blocks);
    if block.name() == PLACEHOLDER_BLOCK {
        return normalize_level(children, depth + 1, max_depth);
    }
    if children.is_empty() {
        return vec![block];
    }

    // Each child may expand to zero or more blocks; keep one slot per block.
    let mut expanded = children
        .into_iter()
        .map(|child| normalize_block(child, depth + 1, max_depth));
    let mut inner_content = Vec::with_capacity(block.inner_content.len());
    let mut inner_blocks = Vec::new();
    for chunk in block.inner_content.drain(..) {
        match chunk {
            Some(html) => inner_content.push(Some(html)),
            None => {
                let replacement = expanded.next().unwrap_or_default();
                inner_content.extend(replacement.iter().map(|_| None));
                inner_blocks.extend(replacement);
            }
        }
    }

    block.inner_content = inner_content;
    block.inner_blocks = inner_blocks;
    vec![block]
}
