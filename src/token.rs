//! Token extraction for single and multi-entry inputs
//!
//! In multi-entry mode the input holds several entries separated by `,` or
//! `;`, and only the entry being typed is matched.

/// Characters that separate entries by default
pub const DEFAULT_SEPARATORS: &str = ",;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSplitter {
    multi: bool,
    separators: Vec<char>,
}

impl TokenSplitter {
    pub fn new(multi: bool) -> Self {
        Self::with_separators(multi, DEFAULT_SEPARATORS)
    }

    /// Falls back to the default separators when `separators` is empty
    pub fn with_separators(multi: bool, separators: &str) -> Self {
        let separators = if separators.is_empty() {
            DEFAULT_SEPARATORS
        } else {
            separators
        };
        Self {
            multi,
            separators: separators.chars().collect(),
        }
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// The token to match for the full input `text`
    pub fn current_token<'a>(&self, text: &'a str) -> &'a str {
        if !self.multi {
            return text;
        }
        match self.last_separator(text) {
            Some(index) => text[index + separator_len(text, index)..].trim_start(),
            None => text.trim_start(),
        }
    }

    /// Replace the current token in `text` with `choice`.
    ///
    /// In multi-entry mode the result ends with a separator, ready for the
    /// next entry.
    pub fn complete(&self, text: &str, choice: &str) -> String {
        if !self.multi {
            return choice.to_string();
        }

        let mut result = match self.last_separator(text) {
            Some(index) => {
                let mut head = text[..index + separator_len(text, index)].to_string();
                head.push(' ');
                head
            }
            None => String::new(),
        };
        result.push_str(choice);
        result.push_str(&self.default_separator());
        result
    }

    fn default_separator(&self) -> String {
        let mut sep = String::new();
        if let Some(&c) = self.separators.first() {
            sep.push(c);
        }
        sep.push(' ');
        sep
    }

    fn last_separator(&self, text: &str) -> Option<usize> {
        text.rfind(|c: char| self.separators.contains(&c))
    }
}

fn separator_len(text: &str, index: usize) -> usize {
    text[index..].chars().next().map_or(0, char::len_utf8)
}

impl Default for TokenSplitter {
    fn default() -> Self {
        Self::new(false)
    }
}
