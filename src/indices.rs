//! Index constants hidden in the ondemand script.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::Error;

/// Matches `(e[N], 16)` with a one-character ASCII array name and one or two
/// ASCII digits.
static INDICES_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
   Regex::new(r"\([A-Za-z0-9_]\[([0-9]{1,2})\],\s*16\)").expect("index pattern is a valid regex")
});

/// Row index and key-byte indices read from the ondemand script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicesSpec {
   row_index:        usize,
   key_byte_indices: Vec<usize>,
}

impl IndicesSpec {
   /// Scans the script for every `(e[N], 16)` occurrence, in order.
   ///
   /// The first index selects the frame row; the rest feed the frame time.
   pub fn extract(ondemand_js: &str) -> Result<Self, Error> {
      let indices = INDICES_PATTERN
         .captures_iter(ondemand_js)
         .map(|captures| {
            captures[1]
               .parse::<usize>()
               .map_err(|err| Error::Parse(format!("index {}: {err}", &captures[1])))
         })
         .collect::<Result<Vec<_>, _>>()?;

      let Some((&row_index, rest)) = indices.split_first() else {
         return Err(Error::Extraction("couldn't get key byte indices".into()));
      };

      debug!(row_index, key_byte_indices = rest.len(), "extracted ondemand indices");

      Ok(Self {
         row_index,
         key_byte_indices: rest.to_vec(),
      })
   }

   /// Like [`extract`](Self::extract), for a script body that has not been
   /// checked to be text yet.
   pub fn extract_bytes(ondemand_js: &[u8]) -> Result<Self, Error> {
      let text = std::str::from_utf8(ondemand_js)
         .map_err(|err| Error::InvalidInput(format!("ondemand script is not text: {err}")))?;
      Self::extract(text)
   }

   pub const fn row_index(&self) -> usize {
      self.row_index
   }

   pub fn key_byte_indices(&self) -> &[usize] {
      &self.key_byte_indices
   }
}
