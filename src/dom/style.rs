//! Inline style access through the `style` attribute.
//!
//! The attribute is parsed on every call and written back after every change, so the
//! attribute stays the single source of truth. Only the declaration list syntax is
//! understood (`name: value; ...`); values are kept as opaque text.

use std::borrow::Cow;

use super::{DOMException, element::ElementRef};

/// Convert `backgroundColor` style names to `background-color`.
/// Names that already contain no uppercase letters are returned as they are.
fn css_property_name(name: &str) -> Cow<'_, str> {
    if !name.contains(|c: char| c.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }
    let mut res = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            res.push('-');
            res.push(c.to_ascii_lowercase());
        } else {
            res.push(c);
        }
    }
    Cow::Owned(res)
}

/// Split `style` into `(name, value)` declarations.
///
/// Semicolons inside quotes or parentheses do not end a declaration.
/// Declarations without a colon or with an empty name are dropped.
fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut res = vec![];
    let mut quote = None;
    let mut depth = 0usize;
    let mut start = 0;
    let mut push = |decl: &str| {
        if let Some((name, value)) = decl.split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                res.push((name.to_ascii_lowercase(), value.trim().to_owned()));
            }
        }
    };
    for (i, c) in style.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push(&style[start..]);
    res
}

fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl ElementRef {
    /// Every declaration of the `style` attribute in source order.
    pub fn style_properties(&self) -> Vec<(String, String)> {
        parse_declarations(&self.get_attribute("style"))
    }

    /// The value of the style property `name`.
    ///
    /// `name` may be written in CSS form (`background-color`) or in camel case
    /// (`backgroundColor`). When a property is declared twice, the last one wins.
    pub fn style_property(&self, name: &str) -> Option<String> {
        let name = css_property_name(name);
        self.style_properties()
            .into_iter()
            .rev()
            .find(|(prop, _)| prop.eq_ignore_ascii_case(&name))
            .map(|(_, value)| value)
    }

    /// Set the style property `name` to `value`, rewriting the `style` attribute.
    ///
    /// An existing declaration keeps its position; an empty `value` removes the property.
    pub fn set_style_property(&mut self, name: &str, value: &str) -> Result<(), DOMException> {
        let value = value.trim();
        if value.is_empty() {
            self.remove_style_property(name);
            return Ok(());
        }
        let name = css_property_name(name).to_ascii_lowercase();
        let mut decls = self.style_properties();
        let mut found = false;
        decls.retain_mut(|(prop, cur)| {
            if *prop != name {
                return true;
            }
            if found {
                return false;
            }
            found = true;
            *cur = value.to_owned();
            true
        });
        if !found {
            decls.push((name, value.to_owned()));
        }
        self.set_attribute("style", &serialize_declarations(&decls))
    }

    /// Remove the style property `name` and return its last value.
    ///
    /// The `style` attribute itself is removed once no declaration is left.
    pub fn remove_style_property(&mut self, name: &str) -> Option<String> {
        let name = css_property_name(name);
        let mut decls = self.style_properties();
        let mut removed = None;
        decls.retain(|(prop, value)| {
            if prop.eq_ignore_ascii_case(&name) {
                removed = Some(value.clone());
                false
            } else {
                true
            }
        });
        removed.as_ref()?;
        if decls.is_empty() {
            self.remove_attribute("style");
        } else {
            // the attribute already exists, so its name is valid
            self.set_attribute("style", &serialize_declarations(&decls))
                .ok();
        }
        removed
    }
}
