use std::{collections::BTreeMap, fmt};

///
/// ErrorTree
///
/// Route-aware error aggregate. Failures are collected under the route that
/// produced them (an entity name, then a property name) so a whole pass can
/// be reported at once instead of stopping at the first failure.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
    children: BTreeMap<String, Self>,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// Record a failure at this level.
    pub fn add(&mut self, err: impl ToString) {
        self.messages.push(err.to_string());
    }

    /// Record a failure under a child route.
    pub fn add_at(&mut self, route: impl Into<String>, err: impl ToString) {
        self.children
            .entry(route.into())
            .or_default()
            .add(err);
    }

    /// Merge another tree under a child route, skipping empty trees.
    pub fn merge_at(&mut self, route: impl Into<String>, other: Self) {
        if other.is_empty() {
            return;
        }

        let child = self.children.entry(route.into()).or_default();
        child.messages.extend(other.messages);
        for (route, sub) in other.children {
            child.merge_at(route, sub);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.values().all(Self::is_empty)
    }

    /// Total number of recorded failures across all routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    /// Flatten into `(route, message)` pairs, routes joined with `.`.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);

        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        for msg in &self.messages {
            out.push((prefix.to_string(), msg.clone()));
        }

        for (route, child) in &self.children {
            let route = if prefix.is_empty() {
                route.clone()
            } else {
                format!("{prefix}.{route}")
            };
            child.flatten_into(&route, out);
        }
    }

    /// Ok when nothing was recorded.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (route, msg)) in self.flatten().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if route.is_empty() {
                write!(f, "{msg}")?;
            } else {
                write!(f, "{route}: {msg}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

/// Record a formatted failure into an [`ErrorTree`].
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_routes_flatten_in_order() {
        let mut inner = ErrorTree::new();
        inner.add("duplicate mapped name 'a'");
        inner.add_at("b", "bad signature");

        let mut errs = ErrorTree::new();
        errs.merge_at("com.example.Person", inner);
        err!(errs, "{} entities failed", 1);

        assert_eq!(errs.len(), 3);
        assert_eq!(
            errs.flatten(),
            vec![
                (String::new(), "1 entities failed".to_string()),
                (
                    "com.example.Person".to_string(),
                    "duplicate mapped name 'a'".to_string()
                ),
                ("com.example.Person.b".to_string(), "bad signature".to_string()),
            ]
        );
    }

    #[test]
    fn empty_tree_is_ok() {
        let mut errs = ErrorTree::new();
        errs.merge_at("ignored", ErrorTree::new());

        assert!(errs.is_empty());
        assert!(errs.result().is_ok());
    }
}
