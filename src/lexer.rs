//! A module implementing lexical analysis (tokenization) for command lines.
//!
//! A line is split on runs of spaces and tabs into words. A `"`-delimited
//! span keeps embedded whitespace inside a single word; the quote characters
//! themselves are stripped, and a quoted span glues onto adjacent bare text.

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// A closing double quote was not found before the end of the line.
    UnterminatedQuote,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnterminatedQuote => write!(f, "unterminated quote"),
        }
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Start,
    ReadingWord,
    ReadingQuote,
}

struct LexFsm {
    input: Vec<char>,
    pos: usize,
    state: LexState,
    buffer: String,
    // Set once the current word has begun, so that `""` still yields a word.
    started: bool,
}

impl LexFsm {
    fn new(line: &str) -> Self {
        LexFsm {
            input: line.chars().collect(),
            pos: 0,
            state: LexState::Start,
            buffer: String::new(),
            started: false,
        }
    }

    fn make_words(mut self) -> Result<Vec<String>, LexError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexState::Start => self.handle_start(ch),
                LexState::ReadingWord => self.handle_word(ch, &mut out),
                LexState::ReadingQuote => self.handle_quote(ch),
            }
        }

        if self.state == LexState::ReadingQuote {
            return Err(LexError::UnterminatedQuote);
        }
        if self.started {
            out.push(std::mem::take(&mut self.buffer));
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn handle_start(&mut self, ch: char) {
        match ch {
            ' ' | '\t' => {}
            '"' => {
                self.started = true;
                self.state = LexState::ReadingQuote;
            }
            c => {
                self.buffer.push(c);
                self.started = true;
                self.state = LexState::ReadingWord;
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<String>) {
        match ch {
            ' ' | '\t' => {
                out.push(std::mem::take(&mut self.buffer));
                self.started = false;
                self.state = LexState::Start;
            }
            '"' => self.state = LexState::ReadingQuote,
            c => self.buffer.push(c),
        }
    }

    fn handle_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexState::ReadingWord,
            c => self.buffer.push(c),
        }
    }
}

/// Split one line into its argument vector.
///
/// Returns an empty vector for an empty or all-whitespace line, and
/// [`LexError::UnterminatedQuote`] when a `"` is never closed.
pub fn tokenize(line: &str) -> Result<Vec<String>, LexError> {
    LexFsm::new(line).make_words()
}
