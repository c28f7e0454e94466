//! Text tokenization for the classifier
//!
//! Wraps a HuggingFace `tokenizer.json` (WordPiece for BERT). Lower-casing
//! and accent handling come from the file's normalizer, so the same file
//! that shipped with the pretrained model must be used.

use std::path::Path;

use anyhow::{anyhow, Result};
use tokenizers::TruncationParams;

/// Model inputs for a single sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub ids: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Trait for tokenizers used by classr
pub trait TokenizerTrait: Send + Sync {
    /// Encode one text, special tokens included
    fn encode(&self, text: &str) -> Result<Encoded>;

    /// Maximum sequence length, special tokens included
    fn max_length(&self) -> usize;
}

/// Boxed tokenizer type for use in executors
pub type BoxedTokenizer = Box<dyn TokenizerTrait>;

/// Tokenizer backed by the `tokenizers` crate
///
/// Sequences longer than `max_length` are truncated from the right; a single
/// sequence is never padded.
pub struct Tokenizer {
    inner: tokenizers::Tokenizer,
    max_length: usize,
}

impl Tokenizer {
    /// Load a `tokenizer.json` file
    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer {}: {}", path.display(), e))?;
        Self::from_inner(inner, max_length)
    }

    /// Build from serialized `tokenizer.json` bytes
    pub fn from_bytes(bytes: &[u8], max_length: usize) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_bytes(bytes)
            .map_err(|e| anyhow!("Failed to parse tokenizer: {}", e))?;
        Self::from_inner(inner, max_length)
    }

    fn from_inner(mut inner: tokenizers::Tokenizer, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(anyhow!("max_length must be positive"));
        }
        inner
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Invalid truncation settings: {}", e))?;
        inner.with_padding(None);

        Ok(Self { inner, max_length })
    }

    /// Vocabulary size, added tokens included
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

impl TokenizerTrait for Tokenizer {
    fn encode(&self, text: &str) -> Result<Encoded> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        Ok(Encoded {
            ids: encoding.get_ids().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
        })
    }

    fn max_length(&self) -> usize {
        self.max_length
    }
}

/// Minimal uncased WordPiece tokenizer for tests
#[cfg(test)]
pub(crate) const TEST_TOKENIZER_JSON: &str = r###"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [
    {"id": 0, "content": "[PAD]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 1, "content": "[UNK]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 2, "content": "[CLS]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
    {"id": 3, "content": "[SEP]", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
  ],
  "normalizer": {"type": "BertNormalizer", "clean_text": true, "handle_chinese_chars": true, "strip_accents": null, "lowercase": true},
  "pre_tokenizer": {"type": "BertPreTokenizer"},
  "post_processor": {"type": "BertProcessing", "sep": ["[SEP]", 3], "cls": ["[CLS]", 2]},
  "decoder": null,
  "model": {
    "type": "WordPiece",
    "unk_token": "[UNK]",
    "continuing_subword_prefix": "##",
    "max_input_chars_per_word": 100,
    "vocab": {
      "[PAD]": 0, "[UNK]": 1, "[CLS]": 2, "[SEP]": 3,
      "fears": 4, "for": 5, "pension": 6, "after": 7, "talks": 8,
      "goal": 9, "stocks": 10, "fell": 11
    }
  }
}"###;

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(max_length: usize) -> Tokenizer {
        Tokenizer::from_bytes(TEST_TOKENIZER_JSON.as_bytes(), max_length).unwrap()
    }

    #[test]
    fn test_adds_special_tokens() {
        let encoded = tokenizer(512).encode("fears for pension").unwrap();
        assert_eq!(encoded.ids, vec![2, 4, 5, 6, 3]);
        assert_eq!(encoded.type_ids, vec![0; 5]);
        assert_eq!(encoded.attention_mask, vec![1; 5]);
    }

    #[test]
    fn test_lowercases_and_maps_unknown() {
        let encoded = tokenizer(512).encode("Stocks FELL Tuesday").unwrap();
        assert_eq!(encoded.ids, vec![2, 10, 11, 1, 3]);
    }

    #[test]
    fn test_truncates_to_max_length() {
        let encoded = tokenizer(4)
            .encode("fears for pension after talks")
            .unwrap();
        assert_eq!(encoded.ids.len(), 4);
        assert_eq!(encoded.ids.first(), Some(&2));
        assert_eq!(encoded.ids.last(), Some(&3));
    }

    #[test]
    fn test_empty_text() {
        let encoded = tokenizer(512).encode("").unwrap();
        assert_eq!(encoded.ids, vec![2, 3]);
    }

    #[test]
    fn test_zero_max_length_rejected() {
        assert!(Tokenizer::from_bytes(TEST_TOKENIZER_JSON.as_bytes(), 0).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, TEST_TOKENIZER_JSON).unwrap();
        let tokenizer = Tokenizer::from_file(&path, 16).unwrap();
        assert_eq!(tokenizer.max_length(), 16);
        assert!(tokenizer.vocab_size() >= 12);
    }

    #[test]
    fn test_missing_file() {
        assert!(Tokenizer::from_file("/nonexistent/tokenizer.json", 16).is_err());
    }
}
