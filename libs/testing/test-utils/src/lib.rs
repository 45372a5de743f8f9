//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for the domain crates:
//! - `TestTodoApi`: in-process fake of the remote `/api/todos` API
//! - `TestDataBuilder`: Deterministic test data generation
//! - `assertions`: Custom assertion helpers
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestTodoApi};
//!
//! #[tokio::test]
//! async fn my_remote_test() {
//!     let api = TestTodoApi::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_remote_test");
//!
//!     let title = builder.title("groceries");
//!     let base_url = api.base_url();
//! }
//! ```

mod todo_api;

pub use todo_api::{RecordedRequest, TestTodoApi};

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_resource");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique todo title for testing
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let title = builder.title("groceries");
    /// // Returns: "Test groceries 12345"
    /// ```
    pub fn title(&self, subject: &str) -> String {
        format!("Test {} {}", subject, self.seed)
    }

    /// Generate a category name scoped to this test
    pub fn category(&self, name: &str) -> String {
        format!("{}-{}", name, self.seed % 10_000)
    }
}

/// Test assertion helpers
pub mod assertions {
    use serde_json::Value;

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that a JSON document has `field` equal to `expected`
    pub fn assert_json_field(doc: &Value, field: &str, expected: &Value) {
        assert_eq!(
            doc.get(field),
            Some(expected),
            "field '{}' mismatch in {}",
            field,
            doc
        );
    }

    /// Assert that `items` are in exactly this order by key
    pub fn assert_order<T, K: PartialEq + std::fmt::Debug>(
        items: &[T],
        key: impl Fn(&T) -> K,
        expected: &[K],
    ) {
        let actual: Vec<K> = items.iter().map(key).collect();
        assert_eq!(actual.as_slice(), expected, "unexpected order");
    }
}
