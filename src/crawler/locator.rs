use std::fmt;

use scraper::{ElementRef, Html};

/// One level of a [`StructuralPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub tag: String,
    /// 1-based position among same-tag siblings, `None` when the element
    /// is the only one with its tag under its parent.
    pub ordinal: Option<usize>,
}

/// Root-anchored location of an element, stable across re-renders as long
/// as the structure above the element does not change.
///
/// Renders as an XPath expression, e.g. `/html/body/div[2]/a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructuralPath {
    steps: Vec<PathStep>,
}

impl StructuralPath {
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn to_xpath(&self) -> String {
        self.to_string()
    }

    /// Find the element this path points to in a freshly parsed document.
    pub fn resolve<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let mut current = document.tree.root();
        let mut found = None;

        for step in &self.steps {
            let index = step.ordinal.unwrap_or(1).checked_sub(1)?;
            let next = current
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == step.tag)
                .nth(index)?;
            current = *next;
            found = Some(next);
        }

        found
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step.ordinal {
                Some(n) => write!(f, "/{}[{}]", step.tag, n)?,
                None => write!(f, "/{}", step.tag)?,
            }
        }
        Ok(())
    }
}

/// Compute the structural path of an element attached to a document.
pub fn locate(node: ElementRef<'_>) -> StructuralPath {
    let mut steps = Vec::new();
    let mut child = node;

    loop {
        let tag = child.value().name();
        let Some(parent) = child.parent() else {
            steps.push(PathStep {
                tag: tag.to_string(),
                ordinal: None,
            });
            break;
        };

        let siblings: Vec<_> = parent
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == tag)
            .collect();

        let ordinal = if siblings.len() == 1 {
            None
        } else {
            siblings
                .iter()
                .position(|el| el.id() == child.id())
                .map(|i| i + 1)
        };

        steps.push(PathStep {
            tag: tag.to_string(),
            ordinal,
        });

        match ElementRef::wrap(parent) {
            Some(element) => child = element,
            None => break,
        }
    }

    steps.reverse();
    StructuralPath { steps }
}
