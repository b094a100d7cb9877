//! Structured location paths.
//!
//! A selector is derived as an ordered list of steps from the document root
//! down to a target element. It stays structured until it is written to the
//! selector file, where it becomes a CSS selector string.

use std::fmt;

/// How a single step identifies its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAttr {
    Class(String),
    Id(String),
    None,
}

/// One element on the path: a tag name plus an optional attribute match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub tag: String,
    pub attr: StepAttr,
}

impl PathStep {
    /// Build a step preferring the class attribute, then the id.
    pub fn from_attributes(tag: &str, class: Option<&str>, id: Option<&str>) -> Self {
        let attr = match (class, id) {
            (Some(class), _) if !class.is_empty() => StepAttr::Class(class.to_string()),
            (_, Some(id)) if !id.is_empty() => StepAttr::Id(id.to_string()),
            _ => StepAttr::None,
        };
        Self {
            tag: tag.to_ascii_lowercase(),
            attr,
        }
    }

    fn is_document_frame(&self) -> bool {
        self.tag == "html" || self.tag == "body"
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attr {
            StepAttr::Class(value) => write!(f, "{}[class=\"{}\"]", self.tag, escape(value)),
            StepAttr::Id(value) => write!(f, "{}[id=\"{}\"]", self.tag, escape(value)),
            StepAttr::None => f.write_str(&self.tag),
        }
    }
}

/// Root-relative path of steps, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocationPath {
    steps: Vec<PathStep>,
}

impl LocationPath {
    /// Build from steps collected while walking from the target up to the root.
    ///
    /// The leading `html`/`body` frame is dropped so the selector matches at
    /// any depth, whatever document the fragment ends up embedded in.
    pub fn from_target_upwards(mut steps: Vec<PathStep>) -> Self {
        steps.reverse();
        let skip = steps
            .iter()
            .take_while(|step| step.is_document_frame())
            .count();
        steps.drain(..skip);
        Self { steps }
    }

    /// Single-step path for an element identified by its class attribute.
    pub fn class_of(tag: &str, class: &str) -> Self {
        Self {
            steps: vec![PathStep::from_attributes(tag, Some(class), None)],
        }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Serialize to a CSS selector using child combinators.
    pub fn to_css(&self) -> String {
        self.steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Escape a value for a double-quoted CSS attribute string.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_prefers_class_over_id() {
        let step = PathStep::from_attributes("DIV", Some("a b"), Some("main"));
        assert_eq!(step.to_string(), "div[class=\"a b\"]");

        let step = PathStep::from_attributes("span", None, Some("main"));
        assert_eq!(step.to_string(), "span[id=\"main\"]");

        let step = PathStep::from_attributes("span", Some(""), None);
        assert_eq!(step.to_string(), "span");
    }

    #[test]
    fn test_document_frame_is_collapsed() {
        let upwards = vec![
            PathStep::from_attributes("span", None, None),
            PathStep::from_attributes("div", Some("css-1"), None),
            PathStep::from_attributes("body", None, None),
            PathStep::from_attributes("html", None, None),
        ];
        let path = LocationPath::from_target_upwards(upwards);
        assert_eq!(path.steps().len(), 2);
        assert_eq!(path.to_css(), "div[class=\"css-1\"] > span");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let path = LocationPath::class_of("div", r#"say "hi""#);
        assert_eq!(path.to_css(), r#"div[class="say \"hi\""]"#);
    }

    #[test]
    fn test_css_parses_with_scraper() {
        let path = LocationPath::from_target_upwards(vec![
            PathStep::from_attributes("span", None, Some("x")),
            PathStep::from_attributes("div", Some("r-1 r-2"), None),
        ]);
        assert!(scraper::Selector::parse(&path.to_css()).is_ok());
    }
}
