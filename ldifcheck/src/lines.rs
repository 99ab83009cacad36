//! Line reader shared by the LDIF and schema parsers.
//!
//! Turns raw text into logical lines: line endings are normalised to LF,
//! `#` comments are dropped and folded continuation lines are joined back
//! onto the line they continue.

/// One logical (unfolded) line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based number of the physical line this logical line starts on.
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split `input` into logical lines.
///
/// Internal blank lines are kept (they separate LDIF entries); leading and
/// trailing blank lines are removed. A physical line starting with a single
/// space or tab continues the previous logical line and is appended to it
/// with that one character removed. A comment swallows its own
/// continuation lines.
pub fn read_lines(input: &str) -> Vec<Line> {
    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<Line> = Vec::new();
    let mut in_comment = false;

    for (i, physical) in normalized.split('\n').enumerate() {
        let number = i + 1;

        if let Some(rest) = physical
            .strip_prefix(' ')
            .or_else(|| physical.strip_prefix('\t'))
        {
            if in_comment {
                continue;
            }
            match lines.last_mut() {
                Some(last) if !last.is_blank() => last.text.push_str(rest),
                // Nothing to continue: keep it as a line of its own.
                _ => lines.push(Line {
                    number,
                    text: rest.to_string(),
                }),
            }
            continue;
        }

        if physical.starts_with('#') {
            in_comment = true;
            continue;
        }

        in_comment = false;
        lines.push(Line {
            number,
            text: physical.to_string(),
        });
    }

    let start = lines.iter().position(|l| !l.is_blank());
    let end = lines.iter().rposition(|l| !l.is_blank());
    match (start, end) {
        (Some(start), Some(end)) => lines.drain(start..=end).collect(),
        _ => Vec::new(),
    }
}

/// Group logical lines into blocks separated by blank lines. Runs of blank
/// lines count as a single separator.
pub fn blocks(lines: &[Line]) -> Vec<&[Line]> {
    lines
        .split(|l| l.is_blank())
        .filter(|block| !block.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
