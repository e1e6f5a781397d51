/// Entry splitting
///
/// A forensic report is a sequence of entries separated by fence lines of
/// exactly 69 asterisks (optionally followed by commas, since the report is
/// exported as CSV). The splitter walks the document lazily and hands out
/// each block together with the document line it starts on.
use lazy_static::lazy_static;
use regex::{Match, Matches, Regex};

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"\n\*{69},*\n").expect("fence pattern is valid");
}

/// A contiguous block of text between two fences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry<'a> {
    /// Block text without the surrounding fence lines
    pub text: &'a str,
    /// 1-based document line of the block's first line
    pub start_line: usize,
}

impl<'a> RawEntry<'a> {
    /// Whether this block carries nothing worth parsing
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of lines the block spans in the document
    pub fn line_span(&self) -> usize {
        self.text.matches('\n').count() + 1
    }
}

/// Lazy iterator over every block of a document, blank ones included
pub struct Blocks<'a> {
    doc: &'a str,
    fences: Matches<'static, 'a>,
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Iterator for Blocks<'a> {
    type Item = RawEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let end = match self.fences.next() {
            Some(m) => Some(m),
            None => {
                self.done = true;
                None
            }
        };

        let entry = match end {
            Some(m) => self.take_until(m),
            None => RawEntry { text: &self.doc[self.pos..], start_line: self.line },
        };
        Some(entry)
    }
}

impl<'a> Blocks<'a> {
    fn take_until(&mut self, fence: Match<'a>) -> RawEntry<'a> {
        let entry = RawEntry { text: &self.doc[self.pos..fence.start()], start_line: self.line };
        // Block lines, then the fence line itself
        self.line += entry.line_span() + 1;
        self.pos = fence.end();
        entry
    }
}

/// Split a document into all of its blocks, in document order.
///
/// A document with N fence lines always yields N + 1 blocks; leading,
/// trailing and doubled fences produce blank blocks.
pub fn split_blocks(doc: &str) -> Blocks<'_> {
    Blocks { doc, fences: FENCE.find_iter(doc), pos: 0, line: 1, done: false }
}
