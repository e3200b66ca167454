//! Shared test utilities for the collection crates
//!
//! - `TestChroma`: Chroma container with automatic cleanup (feature: "chroma")
//! - `TestDataBuilder`: deterministic collection names and document ids
//! - `assertions`: custom assertion helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestChroma, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_chroma_test() {
//!     let chroma = TestChroma::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_chroma_test");
//!
//!     let collection = builder.collection_name("main");
//!     let doc_id = builder.document_id(1);
//! }
//! ```

#[cfg(feature = "chroma")]
mod chroma;

#[cfg(feature = "chroma")]
pub use chroma::TestChroma;

/// Builder for test data with deterministic randomization
///
/// Names derive from a seed so reruns hit the same collections and parallel
/// tests with different names never collide.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name; the recommended constructor.
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Collection name valid for Chroma (3-63 chars, alphanumeric ends)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let name = TestDataBuilder::new(7).collection_name("main");
    /// assert_eq!(name, "test-7-main");
    /// ```
    pub fn collection_name(&self, suffix: &str) -> String {
        format!("test-{}-{}", self.seed, suffix)
    }

    /// Document id unique within this builder
    pub fn document_id(&self, n: usize) -> String {
        format!("doc-{:x}-{}", self.seed, n)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert the ids of returned items, in order
    pub fn assert_ids<'a>(actual: impl IntoIterator<Item = &'a str>, expected: &[&str]) {
        let actual: Vec<&str> = actual.into_iter().collect();
        assert_eq!(actual, expected, "expected ids {:?}, got {:?}", expected, actual);
    }
}
