//! Template types for typed variable injection.
//!
//! Placeholders in JavaScript templates are string literals such as
//! `"__LIVEBUNDLE_NAME__"`, so the template stays valid JavaScript before
//! rendering and survives minification. Rendering swaps the whole literal,
//! quotes included, for a JSON value.

use std::marker::PhantomData;

use serde::Serialize;

/// Trait for template variable sets
pub trait TemplateVars {
    fn apply(&self, content: &str) -> String;
}

/// Template with typed variable injection
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        vars.apply(self.content)
    }
}

/// Replace every quoted occurrence of `placeholder` with `value` as JSON.
///
/// Double, single and backtick quoting are all recognized since the
/// minifier may pick any of them.
pub fn replace_literal<T: Serialize + ?Sized>(content: &str, placeholder: &str, value: &T) -> String {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".into());
    ['"', '\'', '`'].into_iter().fold(content.to_string(), |acc, quote| {
        acc.replace(&format!("{quote}{placeholder}{quote}"), &json)
    })
}
