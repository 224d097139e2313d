//! Site verification key.

use tracing::debug;

use crate::{
   error::Error,
   markup::{
      Document,
      Selector,
   },
   utils::base64_decode_lenient,
};

const VERIFICATION_META: Selector<'static> = Selector::AttrEquals {
   tag:   Some("meta"),
   name:  "name",
   value: "twitter-site-verification",
};

/// The verification key published in the page markup, with its decoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
   key:       String,
   key_bytes: Vec<u8>,
}

impl KeyMaterial {
   /// Reads the `twitter-site-verification` meta content from the document.
   pub fn extract<D: Document>(document: &D) -> Result<Self, Error> {
      let key = document
         .select_first(&VERIFICATION_META)
         .and_then(|meta| document.attribute(&meta, "content"))
         .filter(|content| !content.is_empty())
         .ok_or_else(|| Error::NotFound(format!("{VERIFICATION_META} key in page source")))?;

      Ok(Self::from_key(key))
   }

   /// Decodes a verification key string. Malformed base64 decodes on a best
   /// effort basis instead of failing.
   pub fn from_key(key: impl Into<String>) -> Self {
      let key = key.into();
      let key_bytes = base64_decode_lenient(&key);
      debug!(key_len = key.len(), key_bytes = key_bytes.len(), "decoded verification key");
      Self { key, key_bytes }
   }

   pub fn key(&self) -> &str {
      &self.key
   }

   pub fn key_bytes(&self) -> &[u8] {
      &self.key_bytes
   }
}
