//! # Attribute Name Resolution - Moving Group Presets Between Modules
//!
//! A group preset is authored on one module (say the Text module's title
//! font, `title.decoration.font`) and applied to another whose matching group
//! may live at a different path (`content.decoration.bodyFont`). Given an
//! attribute path from the preset, its source group names and the group
//! names available on the target, the resolver answers where that path
//! lands on the target, or `None` when it has no place there.
//!
//! Resolution order:
//!
//! 1. The host filter, which may answer outright.
//! 2. A path already under a target name stays as it is.
//! 3. A path under a source name moves under the target name with the same
//!    last segment, else the target at the same position, else the first.
//! 4. A path whose segments after the first match a target's segments after
//!    the first has its first segment replaced by the target's.
//!
//! Results are memoized per resolver instance.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::host::Host;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrNameParams {
    pub attr_name: String,
    pub source_attr_names: Vec<String>,
    pub target_attr_names: Vec<String>,
}

impl AttrNameParams {
    pub fn new(
        attr_name: impl Into<String>,
        source_attr_names: Vec<String>,
        target_attr_names: Vec<String>,
    ) -> Self {
        Self {
            attr_name: attr_name.into(),
            source_attr_names,
            target_attr_names,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Method {
    Resolve,
    PrefixMatch,
    SuffixMatch,
}

#[derive(Debug, Default)]
pub struct AttrNameResolver {
    cache: RefCell<HashMap<(Method, AttrNameParams), Option<String>>>,
}

impl AttrNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where `params.attr_name` lands among the target names.
    pub fn resolve(&self, params: &AttrNameParams, host: &dyn Host) -> Option<String> {
        if let Some(filtered) = host.filter_attr_name(params) {
            return filtered;
        }
        self.memoized(Method::Resolve, params, |params| {
            if params
                .target_attr_names
                .iter()
                .any(|target| is_under(&params.attr_name, target))
            {
                return Some(params.attr_name.clone());
            }
            self.prefix_match(params)
                .or_else(|| self.suffix_match(params))
        })
    }

    /// Move a path found under a source name to the matching target name.
    pub fn prefix_match(&self, params: &AttrNameParams) -> Option<String> {
        self.memoized(Method::PrefixMatch, params, |params| {
            let (position, source) = params
                .source_attr_names
                .iter()
                .enumerate()
                .find(|(_, source)| is_under(&params.attr_name, source))?;
            let rest = &params.attr_name[source.len()..];

            let targets = &params.target_attr_names;
            let target = targets
                .iter()
                .find(|target| last_segment(target) == last_segment(source))
                .or_else(|| targets.get(position))
                .or_else(|| targets.first())?;
            Some(format!("{target}{rest}"))
        })
    }

    /// Match everything after the first segment and swap the first segment.
    pub fn suffix_match(&self, params: &AttrNameParams) -> Option<String> {
        self.memoized(Method::SuffixMatch, params, |params| {
            let (_, attr_tail) = params.attr_name.split_once('.')?;
            params.target_attr_names.iter().find_map(|target| {
                let (target_head, target_tail) = target.split_once('.')?;
                is_under(attr_tail, target_tail).then(|| format!("{target_head}.{attr_tail}"))
            })
        })
    }

    fn memoized(
        &self,
        method: Method,
        params: &AttrNameParams,
        compute: impl FnOnce(&AttrNameParams) -> Option<String>,
    ) -> Option<String> {
        let key = (method, params.clone());
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }
        let resolved = compute(params);
        self.cache.borrow_mut().insert(key, resolved.clone());
        resolved
    }
}

/// `path` equals `prefix` or continues it with more segments.
fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
