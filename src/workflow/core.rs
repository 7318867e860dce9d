//! Collaborator handles shared by all phase handlers.

use std::sync::Arc;

use crate::services::{DocumentationSource, GenerationService, SemanticIndex};

/// Core infrastructure shared by all phases.
///
/// Holds the injected collaborators each handler needs. Cloning is cheap:
/// every handle is reference-counted.
#[derive(Clone)]
pub struct PhaseCore {
    /// Deep-reasoning generation (Planner, Mentor).
    deep: Arc<dyn GenerationService>,
    /// Fast generation (Librarian).
    fast: Arc<dyn GenerationService>,
    docs: Arc<dyn DocumentationSource>,
    index: Arc<dyn SemanticIndex>,
}

impl PhaseCore {
    pub fn new(
        deep: Arc<dyn GenerationService>,
        fast: Arc<dyn GenerationService>,
        docs: Arc<dyn DocumentationSource>,
        index: Arc<dyn SemanticIndex>,
    ) -> Self {
        Self {
            deep,
            fast,
            docs,
            index,
        }
    }

    #[inline]
    pub fn deep(&self) -> &dyn GenerationService {
        self.deep.as_ref()
    }

    #[inline]
    pub fn fast(&self) -> &dyn GenerationService {
        self.fast.as_ref()
    }

    #[inline]
    pub fn docs(&self) -> &dyn DocumentationSource {
        self.docs.as_ref()
    }

    #[inline]
    pub fn index(&self) -> &dyn SemanticIndex {
        self.index.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Builders for handler tests.

    use super::*;
    use crate::services::{
        MockDocumentationSource, MockGenerationService, MockSemanticIndex,
    };

    /// Mocks that fail the test on any call; tests set the expectations they need.
    pub struct Mocks {
        pub deep: MockGenerationService,
        pub fast: MockGenerationService,
        pub docs: MockDocumentationSource,
        pub index: MockSemanticIndex,
    }

    impl Mocks {
        pub fn new() -> Self {
            Self {
                deep: MockGenerationService::new(),
                fast: MockGenerationService::new(),
                docs: MockDocumentationSource::new(),
                index: MockSemanticIndex::new(),
            }
        }

        pub fn into_core(self) -> PhaseCore {
            PhaseCore::new(
                Arc::new(self.deep),
                Arc::new(self.fast),
                Arc::new(self.docs),
                Arc::new(self.index),
            )
        }
    }
}
