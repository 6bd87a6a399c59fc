//! Document embeddings: pluggable embedders, sentence-aligned segmentation
//! and length-weighted pooling into one vector per document.

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::error::{EngineError, Result};
use crate::processing::text_processor::TextProcessor;
use anyhow::Context;
use log::{debug, info};
use model2vec_rs::model::StaticModel;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Model2Vec truncates each input to this many tokens
const MODEL_MAX_TOKENS: usize = 512;

pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    /// One vector per input, in input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

pub struct Model2VecEmbedder {
    model: Mutex<StaticModel>,
    name: String,
    dimension: usize,
    batch_size: usize,
}

impl Model2VecEmbedder {
    /// Load from `models_dir/<model>` when present, otherwise from the HuggingFace Hub
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        let local_path = config.models_dir.join(&config.model);
        let source = if local_path.exists() {
            local_path
        } else {
            PathBuf::from(&config.model)
        };

        info!("Loading Model2Vec embedding model from: {}", source.display());
        let start_time = Instant::now();

        let model = StaticModel::from_pretrained(&source, None, None, None)
            .with_context(|| format!("Failed to load model {}", config.model))?;

        let dimension = model.encode_single("dimension probe").len();
        if dimension == 0 {
            return Err(EngineError::EmbeddingUnavailable(format!(
                "Model {} produced empty embeddings",
                config.model
            )));
        }

        info!(
            "Model loaded successfully in {:.2?} ({} dimensions)",
            start_time.elapsed(),
            dimension
        );

        Ok(Self {
            model: Mutex::new(model),
            name: config.model.clone(),
            dimension,
            batch_size: config.batch_size,
        })
    }
}

impl Embedder for Model2VecEmbedder {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.model.lock().map_err(|_| {
            EngineError::EmbeddingUnavailable("embedding model lock poisoned".to_string())
        })?;
        Ok(model.encode_with_args(texts, Some(MODEL_MAX_TOKENS), self.batch_size))
    }
}

/// Feature-hashed bag of unigrams and bigrams. Needs no model download and is
/// fully deterministic, so it backs offline runs and tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    processor: TextProcessor,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            processor: TextProcessor::new(),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let words = self.processor.content_words(text);
        let mut features: BTreeMap<String, u32> = BTreeMap::new();
        for word in &words {
            *features.entry(word.clone()).or_insert(0) += 1;
        }
        for pair in words.windows(2) {
            *features.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (feature, count) in &features {
            let hash = fnv1a(feature.as_bytes());
            let idx = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[idx] += sign * (1.0 + (*count as f32).ln());
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ b as u64).wrapping_mul(PRIME))
}

/// Pooled document vector. `segments == 0` means the text had nothing to embed
/// and the vector is all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub segments: usize,
}

impl Embedding {
    pub fn is_empty(&self) -> bool {
        self.segments == 0
    }

    /// No segments, or segments that pooled to a zero vector (stop words only,
    /// unknown tokens). Such a vector has no direction to compare.
    pub fn has_no_magnitude(&self) -> bool {
        self.is_empty() || self.vector.iter().all(|&x| x == 0.0)
    }
}

#[derive(Clone)]
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    chunk_size: usize,
    chunk_overlap: usize,
    batch_size: usize,
    length_weighted: bool,
    processor: TextProcessor,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService")
            .field("embedder", &self.embedder.name())
            .field("dimension", &self.embedder.dimension())
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish()
    }
}

impl EmbeddingService {
    pub fn new(embedder: Arc<dyn Embedder>, config: &EmbeddingConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        Self {
            embedder,
            chunk_size,
            chunk_overlap: config.chunk_overlap.min(chunk_size - 1),
            batch_size: config.batch_size.max(1),
            length_weighted: config.length_weighted,
            processor: TextProcessor::new(),
        }
    }

    /// Build the configured backend; `Ok(None)` when embeddings are disabled
    pub fn from_config(config: &EmbeddingConfig) -> Result<Option<Self>> {
        let embedder: Arc<dyn Embedder> = match config.backend {
            EmbeddingBackend::Disabled => return Ok(None),
            EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.hashing_dimension)),
            EmbeddingBackend::Model2vec => Arc::new(Model2VecEmbedder::load(config)?),
        };
        Ok(Some(Self::new(embedder, config)))
    }

    pub fn backend_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed_many(&[text])?;
        embeddings.pop().ok_or_else(|| {
            EngineError::EmbeddingUnavailable("embedder returned no vectors".to_string())
        })
    }

    /// Embed several documents, batching all of their segments together
    pub fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let segmented: Vec<Vec<&str>> = texts.iter().map(|text| self.segment(text)).collect();
        let flat: Vec<String> = segmented
            .iter()
            .flatten()
            .map(|segment| segment.to_string())
            .collect();

        let mut vectors = Vec::with_capacity(flat.len());
        for batch in flat.chunks(self.batch_size) {
            vectors.extend(self.embedder.embed_batch(batch)?);
        }
        if vectors.len() != flat.len() {
            return Err(EngineError::EmbeddingUnavailable(format!(
                "expected {} vectors, embedder returned {}",
                flat.len(),
                vectors.len()
            )));
        }
        debug!(
            "Embedded {} segments from {} documents with {}",
            flat.len(),
            texts.len(),
            self.embedder.name()
        );

        let dimension = self.embedder.dimension();
        let mut vectors = vectors.into_iter();
        segmented
            .iter()
            .map(|segments| {
                let doc_vectors: Vec<Vec<f32>> = vectors.by_ref().take(segments.len()).collect();
                self.pool(segments, &doc_vectors, dimension)
            })
            .collect()
    }

    fn pool(&self, segments: &[&str], vectors: &[Vec<f32>], dimension: usize) -> Result<Embedding> {
        let mut pooled = vec![0.0f32; dimension];
        let mut total_weight = 0.0f32;

        for (segment, vector) in segments.iter().zip(vectors) {
            if vector.len() != dimension {
                return Err(EngineError::EmbeddingUnavailable(format!(
                    "segment embedding has {} dimensions, expected {}",
                    vector.len(),
                    dimension
                )));
            }
            let weight = if self.length_weighted {
                segment.chars().count() as f32
            } else {
                1.0
            };
            for (acc, value) in pooled.iter_mut().zip(vector) {
                *acc += weight * value;
            }
            total_weight += weight;
        }

        if total_weight > 0.0 {
            pooled.iter_mut().for_each(|x| *x /= total_weight);
        }

        Ok(Embedding {
            vector: pooled,
            segments: segments.len(),
        })
    }

    /// Split text into windows of at most `chunk_size` bytes, aligned to
    /// sentence boundaries where possible, with roughly `chunk_overlap` bytes
    /// of trailing sentences repeated at the start of the next window.
    pub fn segment<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        if trimmed.len() <= self.chunk_size {
            return vec![trimmed];
        }

        let units: Vec<Range<usize>> = self
            .processor
            .sentence_spans(text)
            .into_iter()
            .flat_map(|span| self.hard_split(text, span))
            .collect();

        let mut windows = Vec::new();
        let mut i = 0;
        while i < units.len() {
            let start = units[i].start;
            let mut j = i;
            while j + 1 < units.len() && units[j + 1].end - start <= self.chunk_size {
                j += 1;
            }
            windows.push(&text[start..units[j].end]);
            if j + 1 >= units.len() {
                break;
            }

            let mut k = j + 1;
            while k - 1 > i && units[j].end - units[k - 1].start <= self.chunk_overlap {
                k -= 1;
            }
            i = k;
        }
        windows
    }

    /// Split a sentence longer than the window, preferring whitespace cuts
    fn hard_split(&self, text: &str, span: Range<usize>) -> Vec<Range<usize>> {
        if span.end - span.start <= self.chunk_size {
            return vec![span];
        }

        let mut pieces = Vec::new();
        let mut pos = span.start;
        while pos < span.end {
            let mut cut = (pos + self.chunk_size).min(span.end);
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            if cut < span.end {
                if let Some(space) = text[pos..cut].rfind(char::is_whitespace) {
                    if space > 0 {
                        cut = pos + space;
                    }
                }
            }
            if cut <= pos {
                cut = pos + text[pos..].chars().next().map_or(1, char::len_utf8);
            }

            let piece = &text[pos..cut];
            let lead = piece.len() - piece.trim_start().len();
            let body = piece.trim();
            if !body.is_empty() {
                pieces.push(pos + lead..pos + lead + body.len());
            }
            pos = cut;
        }
        pieces
    }
}

/// Cosine similarity in [-1, 1]; zero when either vector has no magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EngineError::EmbeddingUnavailable(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(chunk_size: usize, chunk_overlap: usize) -> EmbeddingService {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Hashing,
            chunk_size,
            chunk_overlap,
            ..EmbeddingConfig::default()
        };
        EmbeddingService::from_config(&config).unwrap().unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &a).unwrap() > 0.999);
        assert!(cosine_similarity(&a, &b).unwrap().abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]).unwrap(), 0.0);
        assert!(cosine_similarity(&a, &[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_disabled_backend_yields_no_service() {
        let config = EmbeddingConfig {
            backend: EmbeddingBackend::Disabled,
            ..EmbeddingConfig::default()
        };
        assert!(EmbeddingService::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_short_text_is_one_segment() {
        let service = service(1500, 200);
        assert_eq!(service.segment("  Rust developer.  "), vec!["Rust developer."]);
        assert!(service.segment(" \n ").is_empty());
    }

    #[test]
    fn test_long_text_segments_fit_window_and_overlap() {
        let service = service(40, 20);
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu. Nu xi.";
        let segments = service.segment(text);

        assert!(segments.len() > 1);
        assert!(segments.iter().all(|s| s.len() <= 40));
        assert!(segments[0].starts_with("Alpha"));
        assert!(segments.last().unwrap().ends_with("Nu xi."));
        // trailing sentence of one window opens the next
        assert!(segments[1].starts_with("Delta"));
    }

    #[test]
    fn test_oversized_sentence_is_hard_split() {
        let service = service(10, 0);
        let text = "word ".repeat(20);
        let segments = service.segment(&text);
        assert!(segments.len() >= 8);
        assert!(segments.iter().all(|s| !s.is_empty() && s.len() <= 10));
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let service = service(1500, 200);
        let embedding = service.embed("").unwrap();
        assert!(embedding.is_empty());
        assert_eq!(embedding.vector.len(), service.dimension());
        assert!(embedding.vector.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_stop_words_embed_without_magnitude() {
        let service = service(1500, 200);
        let embedding = service.embed("to be or not to be").unwrap();
        assert!(!embedding.is_empty());
        assert!(embedding.has_no_magnitude());

        let content = service.embed("Python developer with SQL").unwrap();
        assert!(!content.has_no_magnitude());
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let service = service(40, 10);
        let x = service
            .embed("Rust systems programmer. Async networking with Tokio. Built storage engines.")
            .unwrap();
        let y = service
            .embed("Backend role using Rust and Tokio. Databases and storage experience wanted.")
            .unwrap();
        let forward = cosine_similarity(&x.vector, &y.vector).unwrap();
        let backward = cosine_similarity(&y.vector, &x.vector).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_hashing_embeddings_reflect_overlap() {
        let service = service(1500, 200);
        let resume = service.embed("Python backend engineer building data pipelines").unwrap();
        let same = service.embed("Python backend engineer building data pipelines").unwrap();
        let related = service.embed("Backend engineer for Python data pipelines").unwrap();
        let unrelated = service.embed("Pastry chef decorating wedding cakes").unwrap();

        let identical = cosine_similarity(&resume.vector, &same.vector).unwrap();
        let close = cosine_similarity(&resume.vector, &related.vector).unwrap();
        let far = cosine_similarity(&resume.vector, &unrelated.vector).unwrap();
        assert!(identical > 0.999);
        assert!(close > far);
    }

    #[test]
    fn test_batched_embedding_matches_single() {
        let service = service(30, 5);
        let texts = [
            "Kubernetes operator work. Helm charts. Terraform modules for AWS.",
            "Short one.",
        ];
        let batched = service.embed_many(&texts).unwrap();
        for (text, embedding) in texts.iter().zip(&batched) {
            assert_eq!(&service.embed(text).unwrap(), embedding);
        }
        assert!(batched[0].segments > 1);
    }
}
