//! Structured view of a project descriptor.
//!
//! The file is parsed with a real XML parser to locate elements; edits splice
//! new text into the exact byte range of an element's text node, so the rest
//! of the file (comments, attribute order, whitespace) is left untouched.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node};

use super::DescriptorError;

/// Matches an un-suffixed output directory such as `bin\Release` or `bin\Release\`.
static OUTPUT_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^bin\\(\w+)\\?$").expect("valid regex"));

/// A descriptor file held in memory.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
  path: PathBuf,
  text: String,
}

impl ProjectDescriptor {
  pub fn load(path: &Path) -> Result<Self, DescriptorError> {
    if !path.exists() {
      return Err(DescriptorError::NotFound {
        path: path.to_path_buf(),
      });
    }
    let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Ok(Self {
      path: path.to_path_buf(),
      text,
    })
  }

  #[cfg(test)]
  pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      text: text.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn save(&self) -> Result<(), DescriptorError> {
    std::fs::write(&self.path, &self.text).map_err(|source| DescriptorError::Write {
      path: self.path.clone(),
      source,
    })
  }

  fn parse(&self) -> Result<Document<'_>, DescriptorError> {
    Document::parse(&self.text).map_err(|e| DescriptorError::Parse {
      path: self.path.clone(),
      message: e.to_string(),
    })
  }

  /// Text of every `HintPath` element directly under a `Reference`.
  pub fn hint_paths(&self) -> Result<Vec<String>, DescriptorError> {
    let doc = self.parse()?;
    Ok(
      doc
        .descendants()
        .filter(|n| n.has_tag_name("HintPath") && n.parent_element().is_some_and(|p| p.has_tag_name("Reference")))
        .filter_map(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect(),
    )
  }

  /// Rename the assembly: every `AssemblyName` whose text is `old` becomes `new`.
  ///
  /// Returns whether anything matched.
  pub fn set_assembly_name(&mut self, old: &str, new: &str) -> Result<bool, DescriptorError> {
    let edits = {
      let doc = self.parse()?;
      doc
        .descendants()
        .filter(|n| n.has_tag_name("AssemblyName"))
        .filter_map(text_range)
        .filter(|(_, text)| text.trim() == old)
        .map(|(range, _)| (range, escape_text(new)))
        .collect::<Vec<_>>()
    };
    Ok(self.apply(edits) > 0)
  }

  /// Redirect every `bin\<Config>` output directory to `bin\<Config>.<suffix>\`.
  ///
  /// Already redirected directories are left alone. Returns the number of
  /// rewritten sections.
  pub fn redirect_output_paths(&mut self, suffix: &str) -> Result<usize, DescriptorError> {
    let edits = {
      let doc = self.parse()?;
      doc
        .descendants()
        .filter(|n| n.has_tag_name("OutputPath"))
        .filter_map(text_range)
        .filter_map(|(range, text)| {
          let caps = OUTPUT_PATH.captures(text.trim())?;
          Some((range, format!("bin\\{}.{}\\", &caps[1], suffix)))
        })
        .collect::<Vec<_>>()
    };
    Ok(self.apply(edits))
  }

  fn apply(&mut self, mut edits: Vec<(Range<usize>, String)>) -> usize {
    // Later ranges first so earlier offsets stay valid.
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
    let count = edits.len();
    for (range, replacement) in edits {
      self.text.replace_range(range, &replacement);
    }
    count
  }
}

/// Byte range and content of an element's sole text child.
fn text_range<'a>(node: Node<'a, '_>) -> Option<(Range<usize>, &'a str)> {
  let child = node.first_child()?;
  if !child.is_text() || child.next_sibling().is_some() {
    return None;
  }
  Some((child.range(), child.text()?))
}

fn escape_text(text: &str) -> String {
  text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
