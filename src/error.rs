//! Error types.

use std::{
   error::Error as StdError,
   fmt,
};

#[derive(Debug)]
pub enum Error {
   /// Input has the wrong shape, e.g. a script resource that is not text.
   InvalidInput(String),
   /// The index pattern was not found in the ondemand script.
   Extraction(String),
   /// An expected markup element or attribute is absent.
   NotFound(String),
   /// Path data or numeric data is malformed.
   Parse(String),
   /// A token was requested without key material.
   Precondition(&'static str),
   /// Interpolation vectors have different lengths.
   MismatchedArguments,
   /// Strict base64 decoding failed.
   Base64(data_encoding::DecodeError),
   /// Form fields could not be url-encoded.
   Encode(serde_urlencoded::ser::Error),
   /// HTTP request failed.
   #[cfg(feature = "fetch")]
   Http(minreq::Error),
   /// HTTP response returned non-200 status.
   #[cfg(feature = "fetch")]
   HttpStatus(i32, &'static str),
}

impl fmt::Display for Error {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match *self {
         Self::InvalidInput(ref msg) => write!(f, "invalid input: {msg}"),
         Self::Extraction(ref msg) => write!(f, "extraction failed: {msg}"),
         Self::NotFound(ref what) => write!(f, "not found: {what}"),
         Self::Parse(ref msg) => write!(f, "parse error: {msg}"),
         Self::Precondition(what) => write!(f, "missing {what}"),
         Self::MismatchedArguments => {
            write!(f, "interpolation arrays have different lengths")
         },
         Self::Base64(ref err) => write!(f, "base64 decode error: {err}"),
         Self::Encode(ref err) => write!(f, "form encoding error: {err}"),
         #[cfg(feature = "fetch")]
         Self::Http(ref err) => write!(f, "HTTP error: {err}"),
         #[cfg(feature = "fetch")]
         Self::HttpStatus(code, url) => write!(f, "{url} returned HTTP {code}"),
      }
   }
}

impl StdError for Error {
   fn source(&self) -> Option<&(dyn StdError + 'static)> {
      match *self {
         Self::Base64(ref err) => Some(err),
         Self::Encode(ref err) => Some(err),
         Self::InvalidInput(_)
         | Self::Extraction(_)
         | Self::NotFound(_)
         | Self::Parse(_)
         | Self::Precondition(_)
         | Self::MismatchedArguments => None,
         #[cfg(feature = "fetch")]
         Self::Http(ref err) => Some(err),
         #[cfg(feature = "fetch")]
         Self::HttpStatus(..) => None,
      }
   }
}

impl From<data_encoding::DecodeError> for Error {
   fn from(err: data_encoding::DecodeError) -> Self {
      Self::Base64(err)
   }
}

impl From<serde_urlencoded::ser::Error> for Error {
   fn from(err: serde_urlencoded::ser::Error) -> Self {
      Self::Encode(err)
   }
}

#[cfg(feature = "fetch")]
impl From<minreq::Error> for Error {
   fn from(err: minreq::Error) -> Self {
      Self::Http(err)
   }
}
