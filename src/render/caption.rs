//! Caption directives.
//!
//! A markdown image caption may carry directives separated by `|`:
//!
//! ```text
//! ![A cat|nolink|left](cat.jpg)
//! ```
//!
//! Recognized tokens are `nolink`, `left` and `right`. They match only as
//! whole segments: `"leftover"` is text, not a directive. Parsing is total.

const NOLINK: &str = "nolink";
const LEFT: &str = "left";
const RIGHT: &str = "right";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

impl Align {
    /// CSS class name.
    pub fn as_str(self) -> &'static str {
        match self {
            Align::Left => LEFT,
            Align::Right => RIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionDirectives {
    pub text: String,
    pub render_as_link: bool,
    pub align: Option<Align>,
}

impl CaptionDirectives {
    /// Split `raw` on `|` and pull out text and directives.
    ///
    /// The text is the last segment that is not a directive; if every
    /// segment is a directive, the last segment is used as-is. Directives
    /// are collected from every segment. `left` wins over `right`.
    pub fn parse(raw: &str) -> Self {
        let segments: Vec<&str> = raw.split('|').collect();
        let has = |token: &str| segments.iter().any(|s| *s == token);

        let text = segments
            .iter()
            .rev()
            .find(|s| !is_directive(s))
            .or(segments.last())
            .copied()
            .unwrap_or_default();

        let align = if has(LEFT) {
            Some(Align::Left)
        } else if has(RIGHT) {
            Some(Align::Right)
        } else {
            None
        };

        Self {
            text: text.to_string(),
            render_as_link: !has(NOLINK),
            align,
        }
    }
}

fn is_directive(segment: &str) -> bool {
    matches!(segment, NOLINK | LEFT | RIGHT)
}
