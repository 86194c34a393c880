//! Label column formatting for merged multi-source output
//!
//! Every line of a multi-source run carries its pod name in a fixed-width
//! left column so the interleaved stream stays scannable. The column width is
//! computed once from the resolved names and never changes during a run.

use std::collections::HashMap;

use owo_colors::OwoColorize;

/// Column width for a set of source names: the next multiple of 4 strictly
/// greater than `floor(max_len / 4) * 4`.
///
/// A 10-character name gets a 12-wide column, a 16-character name a 20-wide
/// one, so the longest label always keeps at least one trailing space before
/// the two-space gutter.
pub fn label_width<S: AsRef<str>>(names: &[S]) -> usize {
    let max_len = names.iter().map(|n| n.as_ref().len()).max().unwrap_or(0);
    (max_len / 4 + 1) * 4
}

/// Renders the label prefix for each source of a multi-source run.
///
/// Labels are padded and (optionally) dimmed once at construction; formatting
/// a line is a lookup plus a concatenation.
pub struct LineFormatter {
    prefixes: HashMap<String, String>,
    width: usize,
    color: bool,
}

impl LineFormatter {
    pub fn new<S: AsRef<str>>(sources: &[S], color: bool) -> Self {
        let width = label_width(sources);
        let prefixes = sources
            .iter()
            .map(|s| {
                let name = s.as_ref();
                (name.to_string(), render_prefix(name, width, color))
            })
            .collect();

        Self {
            prefixes,
            width,
            color,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Prefix `content` with the padded label for `source`.
    pub fn format(&self, source: &str, content: &str) -> String {
        match self.prefixes.get(source) {
            Some(prefix) => format!("{prefix}{content}"),
            // Sources are fixed before watching starts, so this only fires if
            // a caller feeds an id that never resolved.
            None => format!(
                "{}{content}",
                render_prefix(source, self.width, self.color)
            ),
        }
    }
}

/// Unpadded label for the solo fast path: just the name and the two-space
/// gutter, dimmed like the multi-source column.
pub fn solo_prefix(source: &str, color: bool) -> String {
    if color {
        format!("{}  ", source.dimmed())
    } else {
        format!("{source}  ")
    }
}

fn render_prefix(source: &str, width: usize, color: bool) -> String {
    let padded = format!("{source:<width$}");
    if color {
        format!("{}  ", padded.dimmed())
    } else {
        format!("{padded}  ")
    }
}
