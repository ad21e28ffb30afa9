//! Cursor over a materialized query result.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Chainable skip/limit view over a point-in-time copy of matching documents.
///
/// The documents are owned by the cursor, so later writes to the collection
/// do not affect it.
#[derive(Debug, Clone)]
pub struct Cursor {
    docs: Vec<Value>,
    skip: usize,
    limit: Option<usize>,
}

impl Cursor {
    pub fn new(docs: Vec<Value>) -> Self {
        Self {
            docs,
            skip: 0,
            limit: None,
        }
    }

    /// Skip the first `n` documents. Negative values clamp to 0; last call wins.
    pub fn skip(mut self, n: i64) -> Self {
        self.skip = n.max(0) as usize;
        self
    }

    /// Yield at most `n` documents. Values below 1 clamp to 1; last call wins.
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n.max(1) as usize);
        self
    }

    /// Number of documents `to_array` would return.
    pub fn count(&self) -> usize {
        let available = self.docs.len().saturating_sub(self.skip);
        match self.limit {
            Some(limit) => available.min(limit),
            None => available,
        }
    }

    /// Materialize: skip, then limit.
    pub async fn to_array(self) -> Vec<Value> {
        let limit = self.limit.unwrap_or(usize::MAX);
        self.docs.into_iter().skip(self.skip).take(limit).collect()
    }

    /// Materialize and deserialize. Documents that do not fit `T` are skipped.
    pub async fn to_typed<T: DeserializeOwned>(self) -> Vec<T> {
        self.to_array()
            .await
            .into_iter()
            .filter_map(|doc| match serde_json::from_value::<T>(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(error = %e, "skipping document that does not match the expected shape");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(n: usize) -> Vec<Value> {
        (0..n).map(|i| json!({"n": i})).collect()
    }

    fn ns(values: &[Value]) -> Vec<u64> {
        values.iter().map(|v| v["n"].as_u64().unwrap()).collect()
    }

    #[tokio::test]
    async fn skip_then_limit() {
        let out = Cursor::new(docs(10)).skip(3).limit(4).to_array().await;
        assert_eq!(ns(&out), vec![3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn order_of_calls_does_not_matter() {
        let out = Cursor::new(docs(10)).limit(4).skip(3).to_array().await;
        assert_eq!(ns(&out), vec![3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn clamping() {
        let out = Cursor::new(docs(5)).skip(-4).limit(0).to_array().await;
        assert_eq!(ns(&out), vec![0]);
    }

    #[tokio::test]
    async fn last_call_wins() {
        let out = Cursor::new(docs(10)).skip(8).skip(1).limit(1).limit(2).to_array().await;
        assert_eq!(ns(&out), vec![1, 2]);
    }

    #[tokio::test]
    async fn skip_past_end_is_empty() {
        let cursor = Cursor::new(docs(3)).skip(5);
        assert_eq!(cursor.count(), 0);
        assert!(cursor.to_array().await.is_empty());
    }

    #[tokio::test]
    async fn to_typed_skips_mismatches() {
        #[derive(serde::Deserialize)]
        struct N {
            n: u64,
        }
        let cursor = Cursor::new(vec![json!({"n": 1}), json!({"n": "x"}), json!({"n": 3})]);
        let out: Vec<N> = cursor.to_typed().await;
        assert_eq!(out.iter().map(|x| x.n).collect::<Vec<_>>(), vec![1, 3]);
    }
}
