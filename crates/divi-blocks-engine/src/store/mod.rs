//! # Block Store - Parsed Blocks by Instance
//!
//! The store keeps every block the [`BlockParser`](crate::parsing::BlockParser)
//! registers, partitioned by *instance*: one partition per top-level parse,
//! shared by re-entrant inner-content parses. Within an instance blocks are a
//! flat map keyed by [`BlockId`]; the tree only exists as `parent_id`
//! back-references, and every navigation query is a scan sorted by the
//! blocks' parse `index`.
//!
//! Besides blocks the store owns the request-scoped parse state: the layout
//! stack, the re-entrancy flags, the document-wide block index and the shared
//! [`ModuleOrder`] counters.
//!
//! ## Public API
//!
//! - Instances: [`BlockParserStore::new_instance`], [`BlockParserStore::use_instance`],
//!   [`BlockParserStore::reset_instance`], [`BlockParserStore::reset`]
//! - Blocks: [`BlockParserStore::add`], [`BlockParserStore::get`]
//! - Tree: [`BlockParserStore::get_parent`], [`BlockParserStore::get_children`],
//!   [`BlockParserStore::get_siblings`], [`BlockParserStore::get_ancestors`],
//!   [`BlockParserStore::get_ancestor`]
//! - Position: [`BlockParserStore::is_first`], [`BlockParserStore::is_last`],
//!   [`BlockParserStore::is_nested_module`]
//! - Layouts: [`BlockParserStore::set_layout`], [`BlockParserStore::reset_layout`]
//! - Global layouts: [`BlockParserStore::get_global_layout_content`]

mod global_layout;
mod module_order;

pub use global_layout::{GlobalLayoutMatch, GlobalLayoutRequest};
pub use module_order::ModuleOrder;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

use crate::host::Host;
use crate::parsing::{BlockId, BlockParserBlock, LayoutType, ParsedBlock};

/// An entry on the layout stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub id: String,
    pub kind: LayoutType,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            id: LayoutType::Default.as_str().to_string(),
            kind: LayoutType::Default,
        }
    }
}

/// Which siblings [`BlockParserStore::get_siblings`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingLocation {
    Before,
    After,
    All,
}

type Instance = HashMap<BlockId, BlockParserBlock>;

#[derive(Debug, Default)]
pub struct BlockParserStore {
    instances: BTreeMap<usize, Instance>,
    current_instance: usize,
    next_instance: usize,
    layouts: Vec<Layout>,
    rendering_inner_content: bool,
    in_global_layout: bool,
    module_order: ModuleOrder,
    block_index: u64,
}

impl BlockParserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh partition and make it current.
    pub fn new_instance(&mut self) -> usize {
        let instance = self.next_instance;
        self.next_instance += 1;
        self.instances.insert(instance, Instance::new());
        self.current_instance = instance;
        debug!("Store instance {instance} created");
        instance
    }

    /// Make `instance` current, creating the partition if needed.
    pub fn use_instance(&mut self, instance: usize) {
        self.instances.entry(instance).or_default();
        self.next_instance = self.next_instance.max(instance + 1);
        self.current_instance = instance;
    }

    pub fn current_instance(&self) -> usize {
        self.current_instance
    }

    pub fn has_instance(&self, instance: usize) -> bool {
        self.instances.contains_key(&instance)
    }

    /// Drop every block of one partition.
    pub fn reset_instance(&mut self, instance: usize) {
        if let Some(blocks) = self.instances.get_mut(&instance) {
            blocks.clear();
        }
    }

    /// Drop every partition and all request state except the block index.
    pub fn reset(&mut self) {
        self.instances.clear();
        self.current_instance = 0;
        self.next_instance = 0;
        self.layouts.clear();
        self.rendering_inner_content = false;
        self.in_global_layout = false;
    }

    fn blocks(&self) -> impl Iterator<Item = &BlockParserBlock> {
        self.instances
            .get(&self.current_instance)
            .into_iter()
            .flat_map(|blocks| blocks.values())
    }

    /// Number of blocks in the current instance.
    pub fn len(&self) -> usize {
        self.blocks().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `block` into the current instance.
    ///
    /// Nameless blocks, the root id and ids already present are ignored.
    /// Returns whether the block was inserted.
    pub fn add(&mut self, block: BlockParserBlock) -> bool {
        if block.block_name.is_none() || block.is_root() {
            return false;
        }
        let blocks = self.instances.entry(self.current_instance).or_default();
        if blocks.contains_key(&block.id) {
            return false;
        }
        blocks.insert(block.id.clone(), block);
        true
    }

    /// Insert `block`, renumbering it when its id is taken.
    ///
    /// Ids collide when order indexes were reset while an instance is reused.
    pub fn insert_unique(&mut self, mut block: BlockParserBlock) -> BlockId {
        let name = block.name().to_string();
        while self.contains(&block.id) {
            block.order_index = self.module_order.next(&name, &block.layout_type);
            block.id = BlockId::new(format!("{name}-{}", block.order_index));
        }
        let id = block.id.clone();
        self.add(block);
        id
    }

    pub fn contains(&self, id: &BlockId) -> bool {
        self.instances
            .get(&self.current_instance)
            .is_some_and(|blocks| blocks.contains_key(id))
    }

    /// Look up a block in the current instance.
    ///
    /// The root is synthesized on every call with the instance's top-level
    /// blocks as children.
    pub fn get(&self, id: &str) -> Option<Cow<'_, BlockParserBlock>> {
        if id == crate::parsing::ROOT_ID {
            let children = self
                .get_children(id)
                .into_iter()
                .map(|block| block.id.clone())
                .collect();
            return Some(Cow::Owned(BlockParserBlock::root(
                self.current_instance,
                children,
            )));
        }
        self.instances
            .get(&self.current_instance)?
            .get(id)
            .map(Cow::Borrowed)
    }

    /// Look up a block in any instance.
    pub fn get_from(&self, instance: usize, id: &str) -> Option<&BlockParserBlock> {
        self.instances.get(&instance)?.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut BlockParserBlock> {
        self.instances.get_mut(&self.current_instance)?.get_mut(id)
    }

    /// Rebuild an owned block tree from the store.
    pub fn to_parsed_block(&self, id: &str) -> Option<ParsedBlock> {
        let block = self.get(id)?;
        let inner_blocks = block
            .inner_blocks
            .iter()
            .filter_map(|child| self.to_parsed_block(child.as_str()))
            .collect();
        Some(ParsedBlock {
            block_name: block.block_name.clone(),
            attrs: block.attrs.clone(),
            inner_blocks,
            inner_html: block.inner_html.clone(),
            inner_content: block.inner_content.clone(),
        })
    }

    pub fn get_parent(&self, id: &str) -> Option<Cow<'_, BlockParserBlock>> {
        let parent_id = self.get(id)?.parent_id.clone()?;
        self.get(parent_id.as_str())
    }

    /// Blocks whose parent is `id`, in parse order.
    pub fn get_children(&self, id: &str) -> Vec<&BlockParserBlock> {
        let mut children: Vec<_> = self
            .blocks()
            .filter(|block| block.parent_id.as_ref().is_some_and(|p| p.as_str() == id))
            .collect();
        children.sort_by_key(|block| block.index);
        children
    }

    /// Blocks sharing `id`'s parent, in parse order, excluding `id` itself.
    pub fn get_siblings(&self, id: &str, location: SiblingLocation) -> Vec<&BlockParserBlock> {
        let Some(block) = self.get(id) else {
            return Vec::new();
        };
        let Some(parent_id) = block.parent_id.as_ref() else {
            return Vec::new();
        };
        let index = block.index;
        self.get_children(parent_id.as_str())
            .into_iter()
            .filter(|sibling| sibling.id.as_str() != id)
            .filter(|sibling| match location {
                SiblingLocation::Before => sibling.index < index,
                SiblingLocation::After => sibling.index > index,
                SiblingLocation::All => true,
            })
            .collect()
    }

    /// The nearest sibling before or after `id`.
    pub fn get_sibling(&self, id: &str, location: SiblingLocation) -> Option<&BlockParserBlock> {
        let siblings = self.get_siblings(id, location);
        match location {
            SiblingLocation::Before => siblings.last().copied(),
            SiblingLocation::After | SiblingLocation::All => siblings.first().copied(),
        }
    }

    /// Ancestors of `id`, nearest first, up to but excluding the root.
    pub fn get_ancestors(&self, id: &str) -> Vec<&BlockParserBlock> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let Some(block) = self.get(id) else {
            return ancestors;
        };
        let mut parent_id = block.parent_id.clone();

        while let Some(current) = parent_id {
            if current.is_root() || !seen.insert(current.clone()) {
                break;
            }
            let Some(parent) = self.get_from(self.current_instance, current.as_str()) else {
                break;
            };
            ancestors.push(parent);
            parent_id = parent.parent_id.clone();
        }
        ancestors
    }

    /// The nearest ancestor accepted by `matcher`.
    pub fn get_ancestor(
        &self,
        id: &str,
        matcher: impl Fn(&BlockParserBlock) -> bool,
    ) -> Option<&BlockParserBlock> {
        self.get_ancestors(id).into_iter().find(|block| matcher(block))
    }

    pub fn is_first(&self, id: &str, host: &dyn Host) -> bool {
        self.renderable_position(id, host, true)
    }

    pub fn is_last(&self, id: &str, host: &dyn Host) -> bool {
        self.renderable_position(id, host, false)
    }

    fn renderable_position(&self, id: &str, host: &dyn Host, first: bool) -> bool {
        if id == crate::parsing::ROOT_ID {
            return true;
        }
        let Some(block) = self.get(id) else {
            return false;
        };
        let Some(parent_id) = block.parent_id.as_ref() else {
            return true;
        };
        let mut renderable = self
            .get_children(parent_id.as_str())
            .into_iter()
            .filter(|sibling| sibling.id.as_str() == id || host.should_render(sibling));
        let picked = if first {
            renderable.next()
        } else {
            renderable.last()
        };
        picked.is_some_and(|block| block.id.as_str() == id)
    }

    /// Whether a block of the same name wraps `id`.
    pub fn is_nested_module(&self, id: &str) -> bool {
        let Some(block) = self.get(id) else {
            return false;
        };
        let name = block.name();
        self.get_ancestors(id)
            .iter()
            .any(|ancestor| ancestor.name() == name)
    }

    /// The first block, in parse order, accepted by `matcher`.
    pub fn find(&self, matcher: impl Fn(&BlockParserBlock) -> bool) -> Option<&BlockParserBlock> {
        self.get_all(matcher).into_iter().next()
    }

    /// Every block accepted by `matcher`, in parse order.
    pub fn get_all(&self, matcher: impl Fn(&BlockParserBlock) -> bool) -> Vec<&BlockParserBlock> {
        let mut found: Vec<_> = self.blocks().filter(|block| matcher(block)).collect();
        found.sort_by_key(|block| block.index);
        found
    }

    pub fn set_layout(&mut self, id: impl Into<String>, kind: LayoutType) {
        self.layouts.push(Layout {
            id: id.into(),
            kind,
        });
    }

    /// Pop the current layout, returning to the previous one or the default.
    pub fn reset_layout(&mut self) -> Layout {
        self.layouts.pop();
        self.layout()
    }

    pub fn layout(&self) -> Layout {
        self.layouts.last().cloned().unwrap_or_default()
    }

    pub fn layout_type(&self) -> LayoutType {
        self.layout().kind
    }

    pub fn is_rendering_inner_content(&self) -> bool {
        self.rendering_inner_content
    }

    /// Set the inner-content flag, returning its previous value.
    pub fn set_rendering_inner_content(&mut self, rendering: bool) -> bool {
        std::mem::replace(&mut self.rendering_inner_content, rendering)
    }

    pub fn is_in_global_layout(&self) -> bool {
        self.in_global_layout
    }

    pub fn next_block_index(&mut self) -> u64 {
        let index = self.block_index;
        self.block_index += 1;
        index
    }

    pub fn module_order(&self) -> &ModuleOrder {
        &self.module_order
    }

    pub fn module_order_mut(&mut self) -> &mut ModuleOrder {
        &mut self.module_order
    }
}
