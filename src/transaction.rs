//! Transaction ID generation for X (Twitter) API requests.

use std::sync::{
   LazyLock,
   OnceLock,
};

use regex::Regex;
use tracing::debug;

use crate::{
   animation::AnimationKey,
   error::Error,
   frames::FrameTable,
   indices::IndicesSpec,
   key::KeyMaterial,
   markup::{
      Document,
      HtmlDocument,
      Selector,
   },
   token::{
      MaskSource,
      RandomMask,
      TokenContext,
      TokenOptions,
      current_time,
   },
};

#[cfg(feature = "fetch")]
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, \
                          like Gecko) Chrome/133.0.0.0 Safari/537.36";

const ONDEMAND_BASE_URL: &str = "https://abs.twimg.com/responsive-web/client-web";

const MIGRATION_ACTION: &str = "https://x.com/x/migrate";

static ONDEMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
   Regex::new(r#"['"]ondemand\.s['"]\s*:\s*['"]([A-Za-z0-9_]+)['"]"#).expect("ondemand pattern is a valid regex")
});

static MIGRATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
   Regex::new(r"https?://(?:www\.)?(?:twitter|x)\.com(?:/x)?/migrate[/?]?tok=[a-zA-Z0-9%\-_]+")
      .expect("migration pattern is a valid regex")
});

/// Key material derived once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
   key:           KeyMaterial,
   animation_key: AnimationKey,
}

impl SessionKeys {
   /// Runs the whole extraction pipeline over a page and its ondemand script.
   pub fn derive<D: Document>(document: &D, ondemand_js: &str) -> Result<Self, Error> {
      let indices = IndicesSpec::extract(ondemand_js)?;
      let key = KeyMaterial::extract(document)?;
      let frames = FrameTable::select(document, key.key_bytes())?;
      let animation_key = AnimationKey::derive(key.key_bytes(), &indices, &frames)?;

      debug!(
         animation_key_len = animation_key.as_str().len(),
         "derived session keys"
      );

      Ok(Self { key, animation_key })
   }

   pub const fn key(&self) -> &KeyMaterial {
      &self.key
   }

   pub const fn animation_key(&self) -> &AnimationKey {
      &self.animation_key
   }
}

/// Client for generating X (Twitter) transaction IDs.
///
/// Holds key material extracted from X's homepage and ondemand script.
/// Create one with [`fetch`](Self::fetch) (requires `fetch` feature),
/// [`new`](Self::new), or [`with_context`](Self::with_context) followed by
/// [`prime`](Self::prime). Once primed, the keys never change.
#[derive(Debug, Default)]
pub struct ClientTransaction {
   context: TokenContext,
   keys:    OnceLock<SessionKeys>,
}

impl ClientTransaction {
   /// Fetches X.com and creates a ready-to-use client.
   ///
   /// ```ignore
   /// let client = ClientTransaction::fetch()?;
   /// let id = client.generate_transaction_id("GET", "/i/api/1.1/jot/client_event.json")?;
   /// ```
   #[cfg(feature = "fetch")]
   pub fn fetch() -> Result<Self, Error> {
      let home_html = fetch_text("https://x.com", "x.com")?;
      let home_html = follow_migration(home_html)?;
      let ondemand_url = Self::extract_ondemand_url(&home_html)?;
      let ondemand_js = fetch_text(&ondemand_url, "ondemand.js")?;
      Self::new(&home_html, &ondemand_js)
   }

   /// Creates a client from pre-fetched HTML and JavaScript.
   ///
   /// Use this if you want to bring your own HTTP client.
   /// Get the JS URL with [`extract_ondemand_url`](Self::extract_ondemand_url).
   pub fn new(home_page_html: &str, ondemand_js: &str) -> Result<Self, Error> {
      Self::from_document(
         &HtmlDocument::parse(home_page_html),
         ondemand_js,
         TokenContext::default(),
      )
   }

   /// Creates a client from any [`Document`] implementation.
   pub fn from_document<D: Document>(
      document: &D,
      ondemand_js: &str,
      context: TokenContext,
   ) -> Result<Self, Error> {
      let client = Self::with_context(context);
      client.prime(document, ondemand_js)?;
      Ok(client)
   }

   /// Creates a client without key material. Tokens need either
   /// [`prime`](Self::prime) or per-call overrides.
   pub const fn with_context(context: TokenContext) -> Self {
      Self {
         context,
         keys: OnceLock::new(),
      }
   }

   /// Derives the session keys unless already present. Later calls return the
   /// first keys without looking at their arguments.
   pub fn prime<D: Document>(&self, document: &D, ondemand_js: &str) -> Result<&SessionKeys, Error> {
      if let Some(keys) = self.keys.get() {
         return Ok(keys);
      }

      let keys = SessionKeys::derive(document, ondemand_js)?;
      Ok(self.keys.get_or_init(|| keys))
   }

   pub fn keys(&self) -> Option<&SessionKeys> {
      self.keys.get()
   }

   pub const fn context(&self) -> &TokenContext {
      &self.context
   }

   /// Generates a transaction ID for an API request.
   pub fn generate_transaction_id(&self, method: &str, path: &str) -> Result<String, Error> {
      self.generate_transaction_id_with(method, path, &TokenOptions::default(), &RandomMask)
   }

   /// Generates a transaction ID with explicit time, key or animation key, and
   /// a chosen mask source.
   pub fn generate_transaction_id_with(
      &self,
      method: &str,
      path: &str,
      options: &TokenOptions<'_>,
      mask: &impl MaskSource,
   ) -> Result<String, Error> {
      let keys = self.keys.get();

      let override_key = options.key.map(KeyMaterial::from_key);
      let key_bytes = override_key
         .as_ref()
         .or_else(|| keys.map(SessionKeys::key))
         .map(KeyMaterial::key_bytes)
         .ok_or(Error::Precondition("verification key"))?;

      let animation_key = options
         .animation_key
         .or_else(|| keys.map(|keys| keys.animation_key().as_str()))
         .ok_or(Error::Precondition("animation key"))?;

      let time = options.time.unwrap_or_else(current_time);

      Ok(self
         .context
         .encode(method, path, time, key_bytes, animation_key, mask.mask_byte()))
   }

   /// Extracts the ondemand.s.*.js URL from homepage HTML.
   pub fn extract_ondemand_url(home_page_html: &str) -> Result<String, Error> {
      if let Some(captures) = ONDEMAND_PATTERN.captures(home_page_html) {
         let hash = &captures[1];
         return Ok(format!("{ONDEMAND_BASE_URL}/ondemand.s.{hash}a.js"));
      }

      // Provide helpful context about what we received
      let hint = if home_page_html.contains("login") || home_page_html.contains("LoginForm") {
         " (received login page - may need cookies)"
      } else if home_page_html.len() < 10000 {
         " (response too small - may be rate limited or blocked)"
      } else {
         " (X may have changed their page structure)"
      };
      Err(Error::NotFound(format!("ondemand file hash{hint}")))
   }
}

/// The first `migrate?tok=` URL among the `<meta http-equiv="refresh">` tags.
pub fn migration_url<D: Document>(document: &D) -> Option<String> {
   document
      .select_all(&Selector::AttrEquals {
         tag:   Some("meta"),
         name:  "http-equiv",
         value: "refresh",
      })
      .iter()
      .filter_map(|meta| document.attribute(meta, "content"))
      .find_map(|content| {
         MIGRATION_PATTERN
            .find(&content)
            .map(|found| found.as_str().to_owned())
      })
}

/// The hidden form X serves while migrating twitter.com sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationForm {
   pub method: String,
   pub url:    String,
   pub fields: Vec<(String, String)>,
}

impl MigrationForm {
   /// Fields as `application/x-www-form-urlencoded`.
   pub fn encoded_body(&self) -> Result<String, Error> {
      Ok(serde_urlencoded::to_string(&self.fields)?)
   }
}

/// Reads `form[name='f']`, or the form posting to the migrate endpoint.
pub fn migration_form<D: Document>(document: &D) -> Option<MigrationForm> {
   let form = document
      .select_first(&Selector::AttrEquals {
         tag:   Some("form"),
         name:  "name",
         value: "f",
      })
      .or_else(|| {
         document.select_first(&Selector::AttrEquals {
            tag:   Some("form"),
            name:  "action",
            value: MIGRATION_ACTION,
         })
      })?;

   let fields = document
      .select_within(&form, &Selector::Tag("input"))
      .iter()
      .filter_map(|input| {
         let name = document.attribute(input, "name").filter(|name| !name.is_empty())?;
         let value = document.attribute(input, "value").unwrap_or_default();
         Some((name, value))
      })
      .collect();

   Some(MigrationForm {
      method: document
         .attribute(&form, "method")
         .filter(|method| !method.is_empty())
         .unwrap_or_else(|| "POST".to_owned()),
      url: document
         .attribute(&form, "action")
         .filter(|action| !action.is_empty())
         .unwrap_or_else(|| MIGRATION_ACTION.to_owned()),
      fields,
   })
}

#[cfg(feature = "fetch")]
fn browser_request(request: minreq::Request) -> minreq::Request {
   request
      .with_header("User-Agent", USER_AGENT)
      .with_header("Accept-Language", "en-US,en;q=0.9")
      .with_header("Cache-Control", "no-cache")
      .with_header("Referer", "https://x.com")
      .with_header("X-Twitter-Active-User", "yes")
      .with_header("X-Twitter-Client-Language", "en")
}

#[cfg(feature = "fetch")]
fn read_text(request: minreq::Request, label: &'static str) -> Result<String, Error> {
   let response = browser_request(request).send()?;

   if response.status_code != 200 {
      return Err(Error::HttpStatus(response.status_code, label));
   }

   Ok(response.as_str()?.to_owned())
}

#[cfg(feature = "fetch")]
fn fetch_text(url: &str, label: &'static str) -> Result<String, Error> {
   read_text(minreq::get(url), label)
}

/// Follows the refresh redirect and submits the migration form when the
/// homepage is a twitter.com migration stub.
#[cfg(feature = "fetch")]
fn follow_migration(mut html: String) -> Result<String, Error> {
   let refresh = migration_url(&HtmlDocument::parse(&html));
   if let Some(url) = refresh {
      debug!("following migration redirect");
      html = fetch_text(&url, "migration redirect")?;
   }

   let form = migration_form(&HtmlDocument::parse(&html));
   if let Some(form) = form {
      debug!(method = %form.method, fields = form.fields.len(), "submitting migration form");
      let request = if form.method.eq_ignore_ascii_case("GET") {
         let separator = if form.url.contains('?') { '&' } else { '?' };
         minreq::get(format!("{}{separator}{}", form.url, form.encoded_body()?))
      } else {
         minreq::post(form.url.as_str())
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .with_body(form.encoded_body()?)
      };
      html = read_text(request, "migration form")?;
   }

   Ok(html)
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::token::FixedMask;

   #[test]
   fn ondemand_url_extraction() {
      let html = r#"something "ondemand.s": "abc123def" something"#;
      let url = ClientTransaction::extract_ondemand_url(html).unwrap();
      assert_eq!(
         url,
         "https://abs.twimg.com/responsive-web/client-web/ondemand.s.abc123defa.js"
      );
   }

   #[test]
   fn ondemand_url_single_quotes() {
      let html = "something 'ondemand.s':'xyz789' something";
      let url = ClientTransaction::extract_ondemand_url(html).unwrap();
      assert_eq!(
         url,
         "https://abs.twimg.com/responsive-web/client-web/ondemand.s.xyz789a.js"
      );
   }

   #[test]
   fn ondemand_hash_is_ascii_only() {
      let html = "\"ondemand.s\": \"abc\u{0663}def\"";
      assert!(ClientTransaction::extract_ondemand_url(html).is_err());

      let html = r#"{"ondemand.s": "éabc", "ondemand.s": "abc_1"}"#;
      let url = ClientTransaction::extract_ondemand_url(html).unwrap();
      assert!(url.ends_with("/ondemand.s.abc_1a.js"));
   }

   #[test]
   fn ondemand_url_missing() {
      let err = ClientTransaction::extract_ondemand_url("please login").unwrap_err();
      assert!(err.to_string().contains("login page"));
   }

   #[test]
   fn unprimed_client_needs_key_material() {
      let client = ClientTransaction::with_context(TokenContext::default());
      assert!(client.keys().is_none());

      let err = client.generate_transaction_id("GET", "/").unwrap_err();
      assert!(matches!(err, Error::Precondition("verification key")));

      let options = TokenOptions {
         key: Some("AAAA"),
         ..TokenOptions::default()
      };
      let err = client
         .generate_transaction_id_with("GET", "/", &options, &FixedMask(0))
         .unwrap_err();
      assert!(matches!(err, Error::Precondition("animation key")));
   }

   #[test]
   fn overrides_stand_in_for_session_keys() {
      let client = ClientTransaction::default();
      let options = TokenOptions {
         time:          Some(5),
         key:           Some("AQID"),
         animation_key: Some("ff100100100"),
      };

      let first = client
         .generate_transaction_id_with("GET", "/a", &options, &FixedMask(9))
         .unwrap();
      let second = client
         .generate_transaction_id_with("GET", "/a", &options, &FixedMask(9))
         .unwrap();
      assert_eq!(first, second);

      let expected = TokenContext::default().encode("GET", "/a", 5, &[1, 2, 3], "ff100100100", 9);
      assert_eq!(first, expected);
   }

   #[test]
   fn migration_url_from_refresh_meta() {
      let html = r#"<meta http-equiv="refresh" content="0; url = https://twitter.com/x/migrate?tok=abc%2D123_x">"#;
      let url = migration_url(&HtmlDocument::parse(html)).unwrap();
      assert_eq!(url, "https://twitter.com/x/migrate?tok=abc%2D123_x");

      let html = r#"<meta http-equiv="refresh" content="0; url=https://example.com/">"#;
      assert!(migration_url(&HtmlDocument::parse(html)).is_none());
   }

   #[test]
   fn migration_url_skips_unrelated_refresh_tags() {
      let html = r#"<head>
         <noscript><meta http-equiv="refresh" content="0; URL=https://mobile.x.com/i/nojs_router?path=%2F"></noscript>
         <meta http-equiv="refresh" content="0; url = https://twitter.com/x/migrate?tok=abc">
      </head>"#;
      let url = migration_url(&HtmlDocument::parse(html)).unwrap();
      assert_eq!(url, "https://twitter.com/x/migrate?tok=abc");

      let html = r#"<meta http-equiv="refresh" content="0; URL=https://mobile.x.com/i/nojs_router">
         <meta http-equiv="refresh" content="0; url = https://x.com/x/migrate?tok=def">"#;
      let url = migration_url(&HtmlDocument::parse(html)).unwrap();
      assert_eq!(url, "https://x.com/x/migrate?tok=def");
   }

   #[test]
   fn migration_body_escapes_reserved_characters() {
      let form = MigrationForm {
         method: "POST".to_owned(),
         url:    MIGRATION_ACTION.to_owned(),
         fields: vec![
            ("a=b".to_owned(), "é~*".to_owned()),
            ("empty".to_owned(), String::new()),
         ],
      };
      assert_eq!(form.encoded_body().unwrap(), "a%3Db=%C3%A9%7E*&empty=");
   }

   #[test]
   fn migration_form_fields() {
      let html = r#"<form name="f" action="https://x.com/x/migrate" method="post">
         <input type="hidden" name="tok" value="a b&amp;c">
         <input type="hidden" name="data" value="x/y">
         <input type="submit">
      </form>"#;
      let form = migration_form(&HtmlDocument::parse(html)).unwrap();
      assert_eq!(form.method, "post");
      assert_eq!(form.url, MIGRATION_ACTION);
      assert_eq!(form.encoded_body().unwrap(), "tok=a+b%26c&data=x%2Fy");
   }

   #[test]
   fn migration_form_defaults() {
      let html = r#"<form action="https://x.com/x/migrate"><input name="tok"></form>"#;
      let form = migration_form(&HtmlDocument::parse(html)).unwrap();
      assert_eq!(form.method, "POST");
      assert_eq!(form.fields, [("tok".to_owned(), String::new())]);

      assert!(migration_form(&HtmlDocument::parse("<form name=\"g\"></form>")).is_none());
   }
}
