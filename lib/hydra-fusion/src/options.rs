use hydra_fusion_model::Variable;

/// Settings of a [`CollectionEngine`](crate::CollectionEngine) that are not part of the API
/// description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOptions {
    default_page_size: usize,
    member_variable: Variable,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            member_variable: Variable::new_unchecked("member"),
        }
    }
}

impl CollectionOptions {
    /// The page size used when neither the request nor the collection sets one.
    ///
    /// A size of zero is replaced by one.
    #[must_use]
    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    /// The variable bound to members in generated queries.
    #[must_use]
    pub fn with_member_variable(mut self, variable: Variable) -> Self {
        self.member_variable = variable;
        self
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    pub fn member_variable(&self) -> &Variable {
        &self.member_variable
    }
}
