//! Tool signatures: declared parameters and the context capability.

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    /// Parameters with a default are optional for the caller.
    pub has_default: bool,
}

/// Ordered parameter list of a tool plus whether it receives the run context.
///
/// ```
/// use streamrun::tools::Signature;
///
/// // f(x, y=1)
/// let sig = Signature::new().required("x").optional("y");
/// assert_eq!(sig.required_names(), vec!["x"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ParamSpec>,
    wants_context: bool,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter without a default.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            has_default: false,
        });
        self
    }

    /// Add a parameter with a default.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            has_default: true,
        });
        self
    }

    /// Ask the dispatcher to pass the run's context object to this tool.
    pub fn with_context(mut self) -> Self {
        self.wants_context = true;
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn wants_context(&self) -> bool {
        self.wants_context
    }

    pub fn required_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| !p.has_default)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Reject blank or duplicate parameter names.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for param in &self.params {
            if param.name.trim().is_empty() {
                return Err("blank parameter name".to_string());
            }
            if !seen.insert(param.name.as_str()) {
                return Err(format!("duplicate parameter '{}'", param.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_invalid() {
        let sig = Signature::new().required("a").optional("a");
        assert!(sig.validate().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn context_flag_is_explicit() {
        assert!(!Signature::new().required("x").wants_context());
        assert!(Signature::new().with_context().wants_context());
    }
}
