//! Animated icon frames and their path data.

use tracing::debug;

use crate::{
   error::Error,
   markup::{
      Document,
      Selector,
   },
};

const FRAME_COUNT: u8 = 4;
const FRAME_SELECTOR_INDEX: usize = 5;
/// Length of the leading move command, e.g. `"M 10,30 C"`.
const PATH_PREFIX_LEN: usize = 9;

const ANIMATION_FRAMES: Selector<'static> = Selector::AttrPrefix {
   tag:    None,
   name:   "id",
   prefix: "loading-x-anim",
};

/// Integer rows parsed from one frame's cubic path data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTable {
   rows: Vec<Vec<i32>>,
}

impl FrameTable {
   /// Picks frame `key_bytes[5] % 4` and parses its second `<path>`.
   pub fn select<D: Document>(document: &D, key_bytes: &[u8]) -> Result<Self, Error> {
      let selector_byte = key_bytes
         .get(FRAME_SELECTOR_INDEX)
         .ok_or_else(|| Error::Parse("key too short for frame selection".into()))?;
      let frame_index = usize::from(selector_byte % FRAME_COUNT);

      let frames = document.select_all(&ANIMATION_FRAMES);
      debug!(frames = frames.len(), frame_index, "selecting animation frame");

      let frame = frames
         .get(frame_index)
         .ok_or_else(|| Error::NotFound(format!("{ANIMATION_FRAMES} frame {frame_index}")))?;

      let d = document
         .select_within(frame, &Selector::Tag("path"))
         .get(1)
         .and_then(|path| document.attribute(path, "d"))
         .filter(|d| !d.is_empty())
         .ok_or_else(|| Error::Parse("could not find path data".into()))?;

      Self::parse_path(&d)
   }

   /// Splits path data into rows at each `C` command, keeping only the digits.
   pub fn parse_path(path_d: &str) -> Result<Self, Error> {
      if path_d.len() < PATH_PREFIX_LEN {
         return Err(Error::Parse(format!("path data too short: {path_d:?}")));
      }
      let body = path_d.get(PATH_PREFIX_LEN..).ok_or_else(|| {
         Error::Parse(format!("path data prefix ends inside a character: {path_d:?}"))
      })?;

      let rows = body
         .split('C')
         .map(|segment| {
            segment
               .replace(|chr: char| !chr.is_ascii_digit() && !chr.is_whitespace(), " ")
               .split_whitespace()
               .map(|token| {
                  token
                     .parse::<i32>()
                     .map_err(|err| Error::Parse(format!("path value {token:?}: {err}")))
               })
               .collect::<Result<Vec<_>, _>>()
         })
         .collect::<Result<Vec<_>, _>>()?;

      Ok(Self { rows })
   }

   pub fn rows(&self) -> &[Vec<i32>] {
      &self.rows
   }

   pub fn row(&self, index: usize) -> Option<&[i32]> {
      self.rows.get(index).map(Vec::as_slice)
   }
}
