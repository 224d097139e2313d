//! Generate X (Twitter) client transaction IDs.
//!
//! ```ignore
//! use x_client_txid::ClientTransaction;
//!
//! let client = ClientTransaction::fetch()?;
//! let id = client.generate_transaction_id("GET", "/i/api/1.1/jot/client_event.json")?;
//! ```
//!
//! To bring your own HTTP client:
//!
//! ```ignore
//! use x_client_txid::ClientTransaction;
//!
//! let html = your_client.get("https://x.com").text()?;
//! let js_url = ClientTransaction::extract_ondemand_url(&html)?;
//! let js = your_client.get(&js_url).text()?;
//! let client = ClientTransaction::new(&html, &js)?;
//! ```
//!
//! Each step of the derivation is also exposed on its own: [`IndicesSpec`],
//! [`KeyMaterial`], [`FrameTable`], [`AnimationKey`] and
//! [`TokenContext::encode`].

mod animation;
mod cubic_curve;
mod error;
mod frames;
mod indices;
mod interpolate;
mod key;
mod markup;
mod rotation;
mod token;
mod transaction;
mod utils;

pub use animation::{
   AnimationKey,
   frame_time,
};
pub use cubic_curve::{
   Cubic,
   CurveSpec,
};
pub use error::Error;
pub use frames::FrameTable;
pub use indices::IndicesSpec;
pub use interpolate::{
   interpolate,
   lerp,
};
pub use key::KeyMaterial;
pub use markup::{
   Document,
   ElementRef,
   HtmlDocument,
   Selector,
};
pub use rotation::rotation_matrix;
pub use token::{
   ADDITIONAL_RANDOM_NUMBER,
   DEFAULT_KEYWORD,
   FixedMask,
   MaskSource,
   RandomMask,
   TokenContext,
   TokenOptions,
   current_time,
   xor_mask,
};
pub use transaction::{
   ClientTransaction,
   MigrationForm,
   SessionKeys,
   migration_form,
   migration_url,
};
pub use utils::{
   base64_decode,
   base64_encode,
   half_up_round,
};
