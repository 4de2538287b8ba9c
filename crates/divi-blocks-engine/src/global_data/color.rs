use std::collections::HashSet;

use log::{trace, warn};
use serde_json::{Map, Value};

use super::{GlobalData, css_var_id};
use crate::parsing::preprocess::parse_variable;

/// How adjustments from chained color references combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// Sum every level into one `hsl(from ...)` expression.
    #[default]
    Accumulate,
    /// Wrap one `hsl(from ...)` expression per level.
    Nest,
}

impl FilterMode {
    pub fn from_nest_flag(nest: bool) -> Self {
        if nest {
            FilterMode::Nest
        } else {
            FilterMode::Accumulate
        }
    }
}

/// Relative color adjustments carried by a color reference.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorFilters {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    /// Opacity in percent.
    pub opacity: Option<f64>,
}

impl ColorFilters {
    fn from_settings(settings: &Map<String, Value>) -> Option<Self> {
        let number = |key: &str| -> Option<f64> {
            match settings.get(key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
                _ => None,
            }
        };
        let filters = Self {
            hue: number("hue").unwrap_or_default(),
            saturation: number("saturation").unwrap_or_default(),
            lightness: number("lightness").unwrap_or_default(),
            opacity: number("opacity"),
        };
        (!filters.is_identity()).then_some(filters)
    }

    fn is_identity(&self) -> bool {
        self.hue == 0.0 && self.saturation == 0.0 && self.lightness == 0.0 && self.opacity.is_none()
    }

    /// Combine with an outer level; the outer opacity wins when set.
    fn then(self, outer: ColorFilters) -> Self {
        Self {
            hue: self.hue + outer.hue,
            saturation: self.saturation + outer.saturation,
            lightness: self.lightness + outer.lightness,
            opacity: outer.opacity.or(self.opacity),
        }
    }

    fn apply(&self, base: &str) -> String {
        let opacity = self
            .opacity
            .map(|opacity| format!(" / {opacity}%"))
            .unwrap_or_default();
        format!(
            "hsl(from {base} calc(h + {}) calc(s + {}) calc(l + {}){opacity})",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// A resolved color: a literal base and the adjustments on top of it,
/// innermost first.
struct ColorChain {
    base: String,
    filters: Vec<ColorFilters>,
}

impl ColorChain {
    fn literal(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            filters: Vec::new(),
        }
    }

    fn render(self, mode: FilterMode) -> String {
        match mode {
            FilterMode::Accumulate => match self.filters.into_iter().reduce(ColorFilters::then) {
                Some(filters) => filters.apply(&self.base),
                None => self.base,
            },
            FilterMode::Nest => self
                .filters
                .iter()
                .fold(self.base, |color, filters| filters.apply(&color)),
        }
    }
}

impl GlobalData {
    /// Resolve a color value: a literal, `var(--gcid-*)` or a color token.
    pub fn resolve_color(&self, input: &str, mode: FilterMode) -> String {
        let mut processed = HashSet::new();
        self.color_chain(input, 0, &mut processed).render(mode)
    }

    fn color_chain(&self, input: &str, depth: usize, processed: &mut HashSet<String>) -> ColorChain {
        let trimmed = input.trim();

        if let Some(payload) = trimmed
            .strip_prefix("$variable(")
            .and_then(|rest| rest.strip_suffix(")$"))
        {
            let Some(variable) = parse_variable(payload) else {
                warn!("Malformed color reference, using it as is");
                return ColorChain::literal(input);
            };
            if variable.kind != "color" || variable.value.name.is_empty() {
                return ColorChain::literal(input);
            }
            let mut chain = self.global_color_chain(&variable.value.name, depth, processed);
            chain
                .filters
                .extend(ColorFilters::from_settings(&variable.value.settings));
            return chain;
        }

        match css_var_id(trimmed) {
            Some(id) if id.starts_with("gcid-") => self.global_color_chain(id, depth, processed),
            _ => ColorChain::literal(input),
        }
    }

    fn global_color_chain(
        &self,
        id: &str,
        depth: usize,
        processed: &mut HashSet<String>,
    ) -> ColorChain {
        let reference = format!("var(--{id})");
        if depth >= self.max_depth || !processed.insert(id.to_string()) {
            trace!("Stopping color resolution at {id}");
            return ColorChain::literal(reference);
        }
        match self.colors.get(id) {
            Some(color) if !color.color.is_empty() => {
                self.color_chain(&color.color, depth + 1, processed)
            }
            _ => ColorChain::literal(reference),
        }
    }
}
