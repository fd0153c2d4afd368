use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use atlas_model::{NodeId, NodeKind};

use crate::tokens::tokenize;

/// Distinct terms kept per document; beyond this the most frequent win.
pub const LIMIT_TERMS: usize = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DocEntry {
    dl: u64,
    tf: HashMap<String, u32>,
}

/// Okapi BM25 over one corpus of documents keyed by node id.
///
/// Documents are added, then [`finalize`](Self::finalize) fixes the corpus
/// statistics (document frequency, average length) before any scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    k1: f64,
    b: f64,
    n: usize,
    avgdl: f64,
    df: HashMap<String, u32>,
    docs: HashMap<NodeId, DocEntry>,
}

impl Bm25Index {
    #[must_use]
    pub fn new(k1: f64, b: f64) -> Self {
        Self {
            k1,
            b,
            n: 0,
            avgdl: 0.0,
            df: HashMap::new(),
            docs: HashMap::new(),
        }
    }

    pub fn add_document(&mut self, id: NodeId, text: &str) {
        let mut tf: HashMap<String, u32> = HashMap::new();
        for token in tokenize(text) {
            *tf.entry(token).or_insert(0) += 1;
        }
        if tf.len() > LIMIT_TERMS {
            let mut ranked: Vec<(String, u32)> = tf.into_iter().collect();
            // Count descending, term ascending: truncation is deterministic.
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(LIMIT_TERMS);
            tf = ranked.into_iter().collect();
        }
        let dl = tf.values().map(|&c| u64::from(c)).sum();
        self.docs.insert(id, DocEntry { dl, tf });
        self.n += 1;
    }

    /// Recompute document frequencies and average document length. Must run
    /// after the last `add_document` and before any scoring.
    pub fn finalize(&mut self) {
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut total = 0u64;
        for doc in self.docs.values() {
            total += doc.dl;
            for term in doc.tf.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }
        self.df = df;
        self.avgdl = if self.n > 0 {
            total as f64 / self.n as f64
        } else {
            0.0
        };
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[must_use]
    pub fn idf(&self, term: &str) -> f64 {
        let n = f64::from(self.df.get(term).copied().unwrap_or(0));
        (((self.n as f64) - n + 0.5) / (n + 0.5) + 1.0).ln()
    }

    /// BM25 score of one document against tokenized query terms. Unknown
    /// documents and termless queries score zero.
    #[must_use]
    pub fn score(&self, id: &NodeId, terms: &[String]) -> f64 {
        let Some(doc) = self.docs.get(id) else {
            return 0.0;
        };
        let dl = doc.dl.max(1) as f64;
        let avgdl = if self.avgdl > 0.0 { self.avgdl } else { 1.0 };
        let mut score = 0.0;
        for term in terms {
            let tf = f64::from(doc.tf.get(term).copied().unwrap_or(0));
            if tf == 0.0 {
                continue;
            }
            let denom = tf + self.k1 * (1.0 - self.b + self.b * dl / avgdl);
            score += self.idf(term) * (tf * (self.k1 + 1.0)) / denom;
        }
        score
    }

    /// Score every document sharing at least one term with the query,
    /// keeping positive scores only. Order is unspecified; callers sort.
    #[must_use]
    pub fn scored_candidates(&self, terms: &[String]) -> Vec<(NodeId, f64)> {
        let mut out = Vec::new();
        for (id, doc) in &self.docs {
            if !terms.iter().any(|t| doc.tf.contains_key(t)) {
                continue;
            }
            let score = self.score(id, terms);
            if score > 0.0 {
                out.push((id.clone(), score));
            }
        }
        out
    }
}

/// One BM25 corpus per hierarchy level, persisted together as `bm25.json`.
/// Keeping the corpora separate is the point: document frequency and average
/// length are only comparable between documents of the same granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Levels {
    levels: BTreeMap<NodeKind, Bm25Index>,
}

impl Bm25Levels {
    /// Create an empty corpus for every level so the artifact shape is
    /// identical no matter which levels end up populated.
    #[must_use]
    pub fn new(k1: f64, b: f64) -> Self {
        let levels = NodeKind::ALL
            .iter()
            .map(|&kind| (kind, Bm25Index::new(k1, b)))
            .collect();
        Self { levels }
    }

    pub fn add_document(&mut self, kind: NodeKind, id: NodeId, text: &str) {
        if let Some(index) = self.levels.get_mut(&kind) {
            index.add_document(id, text);
        }
    }

    pub fn finalize(&mut self) {
        for index in self.levels.values_mut() {
            index.finalize();
        }
    }

    #[must_use]
    pub fn level(&self, kind: NodeKind) -> Option<&Bm25Index> {
        self.levels.get(&kind)
    }

    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.levels.values().map(Bm25Index::len).sum()
    }
}
