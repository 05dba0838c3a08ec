use std::path::MAIN_SEPARATOR;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const MAX_CANDIDATES: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
}

/// Single-line editor used for typed answers and the deck path prompt.
pub struct LineInput {
    text: String,
    /// Char index, not byte offset.
    cursor: usize,
    complete_paths: bool,
    completion: Option<Completion>,
}

struct Completion {
    candidates: Vec<String>,
    index: usize,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
            complete_paths: false,
            completion: None,
        }
    }

    /// Tab cycles through directory entries and `.json` files.
    pub fn for_paths(text: &str) -> Self {
        Self {
            complete_paths: true,
            ..Self::new(text)
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.completion = None;
    }

    /// Text before the cursor, the char under it, and the rest.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let at = self.byte_at(self.cursor);
        match self.text[at..].chars().next() {
            Some(ch) => (&self.text[..at], Some(ch), &self.text[at + ch.len_utf8()..]),
            None => (&self.text, None, ""),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if !matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            self.completion = None;
        }
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.len(),
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('w') if ctrl => self.delete_word_back(),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.len() {
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Tab if self.complete_paths => self.cycle_completion(true),
            KeyCode::BackTab if self.complete_paths => self.cycle_completion(false),
            KeyCode::Char(ch) if !ctrl => {
                let at = self.byte_at(self.cursor);
                self.text.insert(at, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map_or(self.text.len(), |(b, _)| b)
    }

    fn remove_at(&mut self, char_idx: usize) {
        let start = self.byte_at(char_idx);
        let end = self.byte_at(char_idx + 1);
        self.text.replace_range(start..end, "");
    }

    fn delete_word_back(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        let (start, end) = (self.byte_at(pos), self.byte_at(self.cursor));
        self.text.replace_range(start..end, "");
        self.cursor = pos;
    }

    fn cycle_completion(&mut self, forward: bool) {
        if self.cursor < self.len() {
            return;
        }
        let completion = match self.completion.take() {
            Some(mut c) => {
                let count = c.candidates.len();
                c.index = if forward {
                    (c.index + 1) % count
                } else {
                    (c.index + count - 1) % count
                };
                c
            }
            None => {
                let candidates = path_candidates(&self.text);
                if candidates.is_empty() {
                    return;
                }
                let index = if forward { 0 } else { candidates.len() - 1 };
                Completion { candidates, index }
            }
        };
        self.text = completion.candidates[completion.index].clone();
        self.cursor = self.len();
        self.completion = Some(completion);
    }
}

/// Entries of the directory named by `seed` that start with its last
/// component. Directories sort first; only `.json` files are offered.
fn path_candidates(seed: &str) -> Vec<String> {
    let split = seed.rfind(['/', '\\']).map_or(0, |i| i + 1);
    let (dir, partial) = seed.split_at(split);

    let read_from = match dir.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => format!("{}{rest}", home.display()),
            None => dir.to_string(),
        },
        None if dir.is_empty() => ".".to_string(),
        None => dir.to_string(),
    };
    let Ok(entries) = std::fs::read_dir(&read_from) else {
        return Vec::new();
    };

    let show_hidden = partial.starts_with('.');
    let mut found: Vec<(bool, String)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if !name.starts_with(partial) || (!show_hidden && name.starts_with('.')) {
                return None;
            }
            if is_dir {
                Some((true, format!("{dir}{name}{MAIN_SEPARATOR}")))
            } else if name.ends_with(".json") {
                Some((false, format!("{dir}{name}")))
            } else {
                None
            }
        })
        .collect();
    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    found.truncate(MAX_CANDIDATES);
    found.into_iter().map(|(_, path)| path).collect()
}
