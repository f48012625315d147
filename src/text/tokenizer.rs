//! Code-point tokenization and padded batching
//!
//! The model vocabulary is a dense table indexed by Unicode code point,
//! persisted as a JSON array of `i64`; `-1` marks an unmapped code point.
//! Every chunk of a batch is encoded to its token-id row, rows are padded
//! to the longest row, and a float validity mask is derived from the true
//! lengths.

use candle_core::{DType, Device, Tensor};

use crate::core::error::{Result, TtsError};

/// Dense code-point to token-id table.
#[derive(Debug, Clone)]
pub struct UnicodeIndexer {
    table: Vec<i64>,
}

impl UnicodeIndexer {
    /// Build an indexer from a dense table; entries below zero mark
    /// unmapped code points.
    pub fn new(table: Vec<i64>) -> Self {
        Self { table }
    }

    /// Token id for a character, if the vocabulary covers it.
    pub fn lookup(&self, c: char) -> Option<i64> {
        self.table
            .get(c as usize)
            .copied()
            .filter(|&id| id >= 0)
    }

    /// Number of code points the table spans.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// A tokenized batch: per-row token ids plus true lengths.
#[derive(Debug, Clone)]
pub struct TokenBatch {
    /// Unpadded token-id rows, one per chunk.
    pub ids: Vec<Vec<i64>>,
    /// True token count per row.
    pub lengths: Vec<usize>,
    /// Length of the longest row; the padded width.
    pub max_len: usize,
}

impl TokenBatch {
    /// Number of rows in the batch.
    pub fn batch_size(&self) -> usize {
        self.ids.len()
    }

    /// Materialize the padded `[B, L]` i64 id tensor and the `[B, 1, L]`
    /// f32 validity mask.
    pub fn to_tensors(&self, device: &Device) -> Result<(Tensor, Tensor)> {
        let bsz = self.ids.len();
        let mut padded = Vec::with_capacity(bsz * self.max_len);
        for row in &self.ids {
            padded.extend_from_slice(row);
            padded.extend(std::iter::repeat(0i64).take(self.max_len - row.len()));
        }

        let ids = Tensor::from_vec(padded, (bsz, self.max_len), device)?;
        let mask = length_to_mask(&self.lengths, self.max_len, device)?;
        Ok((ids, mask))
    }
}

/// Tokenizer turning text chunks into model-ready id batches
#[derive(Debug, Clone)]
pub struct UnicodeTokenizer {
    indexer: UnicodeIndexer,
}

impl UnicodeTokenizer {
    /// Create a tokenizer over the given vocabulary table.
    pub fn new(indexer: UnicodeIndexer) -> Self {
        Self { indexer }
    }

    /// Encode a batch of chunks.
    ///
    /// Fails on the first character the vocabulary does not cover,
    /// reporting the character, its position, and the offending chunk.
    pub fn encode_batch(&self, chunks: &[String]) -> Result<TokenBatch> {
        if chunks.is_empty() {
            return Err(TtsError::invalid("cannot tokenize an empty batch"));
        }

        let mut ids = Vec::with_capacity(chunks.len());
        let mut lengths = Vec::with_capacity(chunks.len());
        let mut max_len = 0usize;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let mut row = Vec::with_capacity(chunk.chars().count());
            for (position, ch) in chunk.chars().enumerate() {
                let id = self.indexer.lookup(ch).ok_or(TtsError::UnsupportedCharacter {
                    ch,
                    code_point: ch as u32,
                    position,
                    chunk_index,
                })?;
                row.push(id);
            }
            max_len = max_len.max(row.len());
            lengths.push(row.len());
            ids.push(row);
        }

        Ok(TokenBatch {
            ids,
            lengths,
            max_len,
        })
    }
}

/// Build a `[B, 1, L]` f32 mask with ones at valid positions.
pub(crate) fn length_to_mask(lengths: &[usize], max_len: usize, device: &Device) -> Result<Tensor> {
    let bsz = lengths.len();
    let mut data = vec![0f32; bsz * max_len];
    for (row, &len) in lengths.iter().enumerate() {
        for slot in &mut data[row * max_len..row * max_len + len] {
            *slot = 1.0;
        }
    }
    let mask = Tensor::from_vec(data, (bsz, 1, max_len), device)?.to_dtype(DType::F32)?;
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii_indexer() -> UnicodeIndexer {
        // Printable ASCII maps to (cp - 0x20) + 1; everything else unmapped.
        let mut table = vec![-1i64; 128];
        for cp in 0x20..0x7F {
            table[cp] = (cp - 0x20 + 1) as i64;
        }
        UnicodeIndexer::new(table)
    }

    #[test]
    fn test_lookup_and_unmapped() {
        let indexer = ascii_indexer();
        assert_eq!(indexer.lookup('A'), Some(('A' as i64) - 0x20 + 1));
        assert_eq!(indexer.lookup('\u{7F}'), None);
        assert_eq!(indexer.lookup('é'), None);
    }

    #[test]
    fn test_encode_batch_rows_and_lengths() {
        let tokenizer = UnicodeTokenizer::new(ascii_indexer());
        let batch = tokenizer
            .encode_batch(&["Hi.".to_string(), "Hello.".to_string()])
            .unwrap();
        assert_eq!(batch.batch_size(), 2);
        assert_eq!(batch.lengths, vec![3, 6]);
        assert_eq!(batch.max_len, 6);
        assert_eq!(batch.ids[0].len(), 3);
    }

    #[test]
    fn test_unsupported_character_reported() {
        let tokenizer = UnicodeTokenizer::new(ascii_indexer());
        let err = tokenizer
            .encode_batch(&["ok.".to_string(), "bad \u{00E9}".to_string()])
            .unwrap_err();
        match err {
            TtsError::UnsupportedCharacter {
                ch,
                code_point,
                position,
                chunk_index,
            } => {
                assert_eq!(ch, '\u{00E9}');
                assert_eq!(code_point, 0xE9);
                assert_eq!(position, 4);
                assert_eq!(chunk_index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_batch_rejected() {
        let tokenizer = UnicodeTokenizer::new(ascii_indexer());
        assert!(tokenizer.encode_batch(&[]).is_err());
    }

    #[test]
    fn test_padded_tensors() {
        let tokenizer = UnicodeTokenizer::new(ascii_indexer());
        let batch = tokenizer
            .encode_batch(&["ab".to_string(), "abcd".to_string()])
            .unwrap();
        let (ids, mask) = batch.to_tensors(&Device::Cpu).unwrap();
        assert_eq!(ids.dims(), &[2, 4]);
        assert_eq!(mask.dims(), &[2, 1, 4]);

        let id_rows = ids.to_vec2::<i64>().unwrap();
        assert_eq!(&id_rows[0][2..], &[0, 0]);

        let mask_rows = mask.to_vec3::<f32>().unwrap();
        assert_eq!(mask_rows[0][0], vec![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(mask_rows[1][0], vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_length_to_mask_shape() {
        let mask = length_to_mask(&[1, 3], 3, &Device::Cpu).unwrap();
        assert_eq!(mask.dims(), &[2, 1, 3]);
        let rows = mask.to_vec3::<f32>().unwrap();
        assert_eq!(rows[0][0], vec![1.0, 0.0, 0.0]);
    }
}
