use futures::stream::{self, Stream};
use parking_lot::RwLock;
use serde::Serialize;

use super::Cat;

/// In-memory cat store. Append and read only; lost on restart.
#[derive(Debug, Default)]
pub struct CatsService {
    cats: RwLock<Vec<Cat>>,
}

/// Row returned by the async listing route.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CatSummary {
    pub id: u32,
    pub name: String,
}

impl CatsService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing list, kept in order.
    pub fn with_cats(cats: Vec<Cat>) -> Self {
        Self { cats: RwLock::new(cats) }
    }

    pub fn create(&self, cat: Cat) {
        self.cats.write().push(cat);
    }

    /// Snapshot of every cat in insertion order.
    pub fn find_all(&self) -> Vec<Cat> {
        self.cats.read().clone()
    }

    pub fn find_one(&self, index: usize) -> Option<Cat> {
        self.cats.read().get(index).cloned()
    }

    pub async fn find_summaries(&self) -> Vec<CatSummary> {
        summaries()
    }

    /// The same listing, emitted once as a stream.
    pub fn summary_stream(&self) -> impl Stream<Item = Vec<CatSummary>> + Send + use<> {
        stream::once(async { summaries() })
    }
}

fn summaries() -> Vec<CatSummary> {
    vec![CatSummary { id: 1, name: "Cat".to_owned() }]
}
