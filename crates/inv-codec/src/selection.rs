//! Path-like selection expressions.
//!
//! A selection is an absolute path of steps such as `/LayoutInventory/*`.
//! Each step is an element name or `*`. The first step must match the
//! document root; every further step descends one level. The steps before
//! the last one describe the wrapper elements every document of this kind
//! shares, which is what override files are built from.

use std::fmt;

use inv_types::Element;

use crate::error::{CodecError, CodecResult};

/// One step of a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// `*`: any element.
    Any,
    /// An element with exactly this name.
    Named(String),
}

impl Step {
    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => element.name() == name,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A parsed selection expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    steps: Vec<Step>,
}

impl Selection {
    /// Parse an expression like `/LayoutInventory/*`.
    pub fn parse(expr: &str) -> CodecResult<Self> {
        let invalid = |reason: &str| CodecError::InvalidSelection {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };

        let rest = expr
            .trim()
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        if rest.is_empty() {
            return Err(invalid("no steps"));
        }

        let steps = rest
            .split('/')
            .map(|raw| match raw.trim() {
                "" => Err(invalid("empty step")),
                "*" => Ok(Step::Any),
                name if name.chars().any(|c| "[]()@=\"' ".contains(c)) => {
                    Err(invalid("only element names and '*' are supported"))
                }
                name => Ok(Step::Named(name.to_string())),
            })
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Elements of `root`'s document selected by this expression, in
    /// document order.
    pub fn select<'a>(&self, root: &'a Element) -> Vec<&'a Element> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Vec::new();
        };
        if !first.matches(root) {
            return Vec::new();
        }
        rest.iter().fold(vec![root], |current, step| {
            current
                .into_iter()
                .flat_map(move |e| e.children().iter().filter(move |c| step.matches(c)))
                .collect()
        })
    }

    /// Names of the wrapper elements enclosing every selected element,
    /// outermost first.
    ///
    /// Fails when a wrapper step is `*`, since no concrete document can be
    /// built from it.
    pub fn wrapper_path(&self) -> CodecResult<Vec<&str>> {
        let wrappers = &self.steps[..self.steps.len().saturating_sub(1)];
        wrappers
            .iter()
            .map(|step| match step {
                Step::Named(name) => Ok(name.as_str()),
                Step::Any => Err(CodecError::InvalidSelection {
                    expr: self.to_string(),
                    reason: "wrapper steps must be element names".into(),
                }),
            })
            .collect()
    }

    /// An empty document consisting only of the wrapper elements.
    pub fn wrapper_document(&self) -> CodecResult<Element> {
        let path = self.wrapper_path()?;
        let (root, inner) = path.split_first().ok_or_else(|| CodecError::InvalidSelection {
            expr: self.to_string(),
            reason: "selects the document root itself".into(),
        })?;
        let innermost = inner
            .iter()
            .rev()
            .fold(None::<Element>, |child, name| {
                let mut e = Element::new(*name);
                if let Some(child) = child {
                    e.push_child(child);
                }
                Some(e)
            });
        let mut doc = Element::new(*root);
        if let Some(child) = innermost {
            doc.push_child(child);
        }
        Ok(doc)
    }

    /// Descend from `root` to the innermost wrapper element, creating any
    /// missing levels.
    pub fn wrapper_mut<'a>(&self, root: &'a mut Element) -> CodecResult<&'a mut Element> {
        let path = self.wrapper_path()?;
        let (first, inner) = path.split_first().ok_or_else(|| CodecError::InvalidSelection {
            expr: self.to_string(),
            reason: "selects the document root itself".into(),
        })?;
        if root.name() != *first {
            return Err(CodecError::RootMismatch {
                expected: first.to_string(),
                actual: root.name().to_string(),
            });
        }

        let mut current = root;
        for name in inner {
            let pos = match current.children().iter().position(|c| c.name() == *name) {
                Some(pos) => pos,
                None => {
                    current.push_child(Element::new(*name));
                    current.children().len() - 1
                }
            };
            current = &mut current.children_mut()[pos];
        }
        Ok(current)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Selection {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
