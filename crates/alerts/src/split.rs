//! Message splitting for length-limited chat APIs.
//!
//! Telegram counts message length in UTF-16 code units. Long reports are cut
//! on line boundaries; a cut inside a ``` block closes the block and reopens
//! it at the top of the next chunk so every chunk renders on its own.

const FENCE: &str = "```";
/// "\n```" appended when a chunk is cut inside a code block.
const CLOSE_LEN: usize = 4;
/// Smallest limit that still leaves room for content between fences.
const MIN_LIMIT: usize = 16;

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split `text` into chunks of at most `limit` UTF-16 units.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(MIN_LIMIT);
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut splitter = Splitter::new(limit);
    for line in text.split('\n') {
        splitter.push_line(line);
    }
    splitter.finish()
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with(FENCE)
}

/// Longest prefix of `line` within `room` units, never empty.
fn split_at_utf16(line: &str, room: usize) -> (&str, &str) {
    let mut used = 0;
    let mut cut = 0;
    for (idx, c) in line.char_indices() {
        let width = c.len_utf16();
        if used + width > room {
            break;
        }
        used += width;
        cut = idx + c.len_utf8();
    }
    if cut == 0 {
        cut = line.chars().next().map_or(0, char::len_utf8);
    }
    line.split_at(cut)
}

struct Splitter {
    limit: usize,
    chunks: Vec<String>,
    current: String,
    len: usize,
    in_fence: bool,
    /// Nothing but a reopened fence in `current` yet
    fresh: bool,
}

impl Splitter {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            chunks: Vec::new(),
            current: String::new(),
            len: 0,
            in_fence: false,
            fresh: true,
        }
    }

    fn separator(&self) -> usize {
        usize::from(!self.current.is_empty())
    }

    fn append(&mut self, line: &str) {
        if !self.current.is_empty() {
            self.current.push('\n');
            self.len += 1;
        }
        self.current.push_str(line);
        self.len += utf16_len(line);
        self.fresh = false;
    }

    fn flush(&mut self) {
        if self.in_fence {
            self.current.push('\n');
            self.current.push_str(FENCE);
        }
        self.chunks.push(std::mem::take(&mut self.current));
        if self.in_fence {
            self.current.push_str(FENCE);
        }
        self.len = utf16_len(&self.current);
        self.fresh = true;
    }

    fn push_line(&mut self, line: &str) {
        let fence_after = self.in_fence ^ is_fence(line);
        let closing = if fence_after { CLOSE_LEN } else { 0 };
        if self.len + self.separator() + utf16_len(line) + closing <= self.limit {
            self.append(line);
            self.in_fence = fence_after;
            return;
        }

        if !self.fresh {
            self.flush();
            self.push_line(line);
            return;
        }

        // a single line longer than a whole chunk
        let closing = if self.in_fence { CLOSE_LEN } else { 0 };
        let room = self.limit - self.len - self.separator() - closing;
        let (head, tail) = split_at_utf16(line, room);
        self.append(head);
        if !tail.is_empty() {
            self.flush();
            self.push_line(tail);
        }
    }

    fn finish(mut self) -> Vec<String> {
        if !self.fresh {
            self.chunks.push(self.current);
        }
        self.chunks
    }
}
