//! Minimal DOM-query capability over page markup.
//!
//! The pipeline only needs to select elements by tag or attribute, scope a
//! selection to an element's descendants and read attributes. Any DOM
//! library can implement [`Document`]; [`HtmlDocument`] is a small built-in
//! scanner for plain HTML strings.

use std::{
   borrow::Cow,
   fmt,
};

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
   "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
   "wbr",
];

/// Elements whose content is raw text and must not be scanned for tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["noscript", "script", "style"];

/// A CSS-like selector restricted to what the pipeline queries.
///
/// `Display` renders the equivalent CSS selector, so an adapter over a CSS
/// engine can simply format it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
   /// `tag`
   Tag(&'a str),
   /// `tag[name='value']`, or `[name='value']` without a tag.
   AttrEquals {
      tag:   Option<&'a str>,
      name:  &'a str,
      value: &'a str,
   },
   /// `tag[name^='prefix']`, or `[name^='prefix']` without a tag.
   AttrPrefix {
      tag:    Option<&'a str>,
      name:   &'a str,
      prefix: &'a str,
   },
}

impl Selector<'_> {
   /// Tests an element given its tag name and an attribute lookup.
   pub fn matches<'v>(&self, tag: &str, attribute: impl Fn(&str) -> Option<&'v str>) -> bool {
      let tag_matches = |wanted: Option<&str>| wanted.is_none_or(|want| want.eq_ignore_ascii_case(tag));

      match *self {
         Self::Tag(want) => want.eq_ignore_ascii_case(tag),
         Self::AttrEquals { tag: want, name, value } => {
            tag_matches(want) && attribute(name) == Some(value)
         },
         Self::AttrPrefix {
            tag: want,
            name,
            prefix,
         } => tag_matches(want) && attribute(name).is_some_and(|found| found.starts_with(prefix)),
      }
   }
}

impl fmt::Display for Selector<'_> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match *self {
         Self::Tag(tag) => write!(f, "{tag}"),
         Self::AttrEquals { tag, name, value } => {
            write!(f, "{}[{name}='{value}']", tag.unwrap_or_default())
         },
         Self::AttrPrefix { tag, name, prefix } => {
            write!(f, "{}[{name}^='{prefix}']", tag.unwrap_or_default())
         },
      }
   }
}

/// Read-only query access to a parsed markup document.
pub trait Document {
   type Element;

   /// All matching elements, in markup order.
   fn select_all(&self, selector: &Selector<'_>) -> Vec<Self::Element>;

   /// Matching descendants of `scope`, in markup order.
   fn select_within(&self, scope: &Self::Element, selector: &Selector<'_>) -> Vec<Self::Element>;

   fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

   /// Markup between the element's start and end tags.
   fn inner_markup(&self, element: &Self::Element) -> String;

   /// The whole document as markup.
   fn serialize(&self) -> Cow<'_, str>;

   fn select_first(&self, selector: &Selector<'_>) -> Option<Self::Element> {
      self.select_all(selector).into_iter().next()
   }
}

/// Handle to an element of an [`HtmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef(usize);

#[derive(Debug)]
struct Node {
   name:          String,
   attributes:    Vec<(String, String)>,
   start:         usize,
   content_start: usize,
   content_end:   usize,
}

impl Node {
   fn attribute(&self, name: &str) -> Option<&str> {
      self
         .attributes
         .iter()
         .find(|(key, _)| key.eq_ignore_ascii_case(name))
         .map(|(_, value)| value.as_str())
   }
}

/// A forgiving tag scanner that records every element with its attributes
/// and content span. It does not build a tree; nesting is derived from spans.
#[derive(Debug)]
pub struct HtmlDocument<'a> {
   source: &'a str,
   nodes:  Vec<Node>,
}

impl<'a> HtmlDocument<'a> {
   pub fn parse(source: &'a str) -> Self {
      let mut nodes = Vec::<Node>::new();
      let mut open = Vec::<usize>::new();
      let mut pos = 0;

      while let Some(offset) = source.get(pos..).and_then(|rest| rest.find('<')) {
         let start = pos + offset;
         let rest = &source[start..];

         if rest.starts_with("<!--") {
            pos = rest
               .find("-->")
               .map_or(source.len(), |end| start + end + 3);
            continue;
         }

         if rest.starts_with("<!") || rest.starts_with("<?") {
            pos = rest.find('>').map_or(source.len(), |end| start + end + 1);
            continue;
         }

         if let Some(closing) = rest.strip_prefix("</") {
            let name_len = tag_name_len(closing.as_bytes());
            let name = closing[..name_len].to_ascii_lowercase();

            if let Some(depth) = open.iter().rposition(|&idx| nodes[idx].name == name) {
               for idx in open.drain(depth..) {
                  nodes[idx].content_end = start;
               }
            }

            pos = rest.find('>').map_or(source.len(), |end| start + end + 1);
            continue;
         }

         let Some(tag) = parse_tag(rest) else {
            pos = start + 1;
            continue;
         };

         let content_start = start + tag.len;
         let is_void = tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str());
         let raw_text = !is_void && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str());
         let closing_tag = format!("</{}", tag.name);

         nodes.push(Node {
            name: tag.name,
            attributes: tag.attributes,
            start,
            content_start,
            content_end: content_start,
         });

         if !is_void {
            open.push(nodes.len() - 1);
         }

         pos = if raw_text {
            source
               .get(content_start..)
               .and_then(|body| find_ignore_ascii_case(body, &closing_tag))
               .map_or(source.len(), |end| content_start + end)
         } else {
            content_start
         };
      }

      for idx in open {
         nodes[idx].content_end = source.len();
      }

      Self { source, nodes }
   }

   fn node(&self, element: ElementRef) -> Option<&Node> {
      self.nodes.get(element.0)
   }

   fn matching(&self, range: impl Iterator<Item = usize>, selector: &Selector<'_>) -> Vec<ElementRef> {
      range
         .filter(|&idx| {
            let node = &self.nodes[idx];
            selector.matches(&node.name, |name| node.attribute(name))
         })
         .map(ElementRef)
         .collect()
   }
}

impl Document for HtmlDocument<'_> {
   type Element = ElementRef;

   fn select_all(&self, selector: &Selector<'_>) -> Vec<ElementRef> {
      self.matching(0..self.nodes.len(), selector)
   }

   fn select_within(&self, scope: &ElementRef, selector: &Selector<'_>) -> Vec<ElementRef> {
      let Some(parent) = self.node(*scope) else {
         return Vec::new();
      };

      let end = self
         .nodes
         .iter()
         .skip(scope.0 + 1)
         .position(|node| node.start >= parent.content_end)
         .map_or(self.nodes.len(), |offset| scope.0 + 1 + offset);

      self.matching(scope.0 + 1..end, selector)
   }

   fn attribute(&self, element: &ElementRef, name: &str) -> Option<String> {
      self
         .node(*element)?
         .attribute(name)
         .map(ToOwned::to_owned)
   }

   fn inner_markup(&self, element: &ElementRef) -> String {
      self
         .node(*element)
         .and_then(|node| self.source.get(node.content_start..node.content_end))
         .unwrap_or_default()
         .to_owned()
   }

   fn serialize(&self) -> Cow<'_, str> {
      Cow::Borrowed(self.source)
   }
}

struct Tag {
   name:         String,
   attributes:   Vec<(String, String)>,
   self_closing: bool,
   len:          usize,
}

fn tag_name_len(bytes: &[u8]) -> usize {
   bytes
      .iter()
      .take_while(|&&byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':'))
      .count()
}

/// Parses an opening tag at the start of `rest` (which begins with `<`).
fn parse_tag(rest: &str) -> Option<Tag> {
   let bytes = rest.as_bytes();
   let name_len = tag_name_len(bytes.get(1..)?);
   if name_len == 0 {
      return None;
   }

   let name = rest[1..=name_len].to_ascii_lowercase();
   let mut attributes = Vec::new();
   let mut idx = 1 + name_len;

   loop {
      while bytes.get(idx).is_some_and(u8::is_ascii_whitespace) {
         idx += 1;
      }

      match *bytes.get(idx)? {
         b'>' => {
            return Some(Tag {
               name,
               attributes,
               self_closing: false,
               len: idx + 1,
            });
         },
         b'/' if bytes.get(idx + 1) == Some(&b'>') => {
            return Some(Tag {
               name,
               attributes,
               self_closing: true,
               len: idx + 2,
            });
         },
         b'/' => {
            idx += 1;
            continue;
         },
         _ => {},
      }

      let name_start = idx;
      while bytes
         .get(idx)
         .is_some_and(|&byte| !byte.is_ascii_whitespace() && !matches!(byte, b'=' | b'>' | b'/'))
      {
         idx += 1;
      }
      if idx == name_start {
         idx += 1;
         continue;
      }
      let attr_name = rest[name_start..idx].to_ascii_lowercase();

      while bytes.get(idx).is_some_and(u8::is_ascii_whitespace) {
         idx += 1;
      }

      let mut value = "";
      if bytes.get(idx) == Some(&b'=') {
         idx += 1;
         while bytes.get(idx).is_some_and(u8::is_ascii_whitespace) {
            idx += 1;
         }

         match *bytes.get(idx)? {
            quote @ (b'"' | b'\'') => {
               let value_start = idx + 1;
               let value_len = bytes.get(value_start..)?.iter().position(|&byte| byte == quote)?;
               value = &rest[value_start..value_start + value_len];
               idx = value_start + value_len + 1;
            },
            _ => {
               let value_start = idx;
               while bytes
                  .get(idx)
                  .is_some_and(|&byte| !byte.is_ascii_whitespace() && byte != b'>')
               {
                  idx += 1;
               }
               value = &rest[value_start..idx];
            },
         }
      }

      attributes.push((attr_name, decode_entities(value).into_owned()));
   }
}

fn decode_entities(value: &str) -> Cow<'_, str> {
   if !value.contains('&') {
      return Cow::Borrowed(value);
   }

   Cow::Owned(
      value
         .replace("&quot;", "\"")
         .replace("&#39;", "'")
         .replace("&#x27;", "'")
         .replace("&lt;", "<")
         .replace("&gt;", ">")
         .replace("&amp;", "&"),
   )
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
   haystack
      .as_bytes()
      .windows(needle.len())
      .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
