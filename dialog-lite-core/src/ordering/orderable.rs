//! Named unit taking part in a topological ordering.

/// A named payload with optional single `before` / `after` links to other
/// orderables of the same sort operation.
///
/// Links are names, not references. Setting a link twice keeps the last
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orderable<T> {
    name: String,
    value: T,
    before: Option<String>,
    after: Option<String>,
}

impl<T> Orderable<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
            before: None,
            after: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// Name of the orderable this one must precede.
    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    /// Name of the orderable this one must follow.
    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn set_before(&mut self, name: impl Into<String>) {
        self.before = Some(name.into());
    }

    pub fn set_after(&mut self, name: impl Into<String>) {
        self.after = Some(name.into());
    }

    pub fn with_before(mut self, name: impl Into<String>) -> Self {
        self.set_before(name);
        self
    }

    pub fn with_after(mut self, name: impl Into<String>) -> Self {
        self.set_after(name);
        self
    }
}
