// Copyright 2026 the Sightline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated document elements.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// A simulated element.
///
/// Equality is identity: two elements with the same tag and classes are still
/// different elements. Use [`is_equal_node`](Self::is_equal_node) for the
/// structural comparison.
#[derive(Clone)]
pub struct SimElement(Rc<SimNode>);

struct SimNode {
    id: u32,
    tag: String,
    classes: Vec<String>,
}

impl SimElement {
    pub(crate) fn new(id: u32, tag: &str, classes: &[&str]) -> Self {
        Self(Rc::new(SimNode {
            id,
            tag: tag.to_string(),
            classes: classes.iter().map(|c| (*c).to_string()).collect(),
        }))
    }

    /// Creation-order id within its host.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.0.id
    }

    /// Tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    /// Returns `true` if the element carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.0.classes.iter().any(|c| c == class)
    }

    /// Structural equality: same tag and same classes.
    #[must_use]
    pub fn is_equal_node(&self, other: &Self) -> bool {
        self.0.tag == other.0.tag && self.0.classes == other.0.classes
    }

    /// Matches `.class` selectors against classes and anything else against
    /// the tag name.
    pub(crate) fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        match selector.strip_prefix('.') {
            Some(class) => self.has_class(class),
            None => self.0.tag == selector,
        }
    }
}

impl PartialEq for SimElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SimElement {}

impl fmt::Debug for SimElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}#{}", self.0.tag, self.0.id)?;
        for class in &self.0.classes {
            write!(f, ".{class}")?;
        }
        f.write_str(">")
    }
}
