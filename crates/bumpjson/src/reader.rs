//! Byte sources consumed by the decoders.
//!
//! A decoder only ever looks at one byte at a time: [`Reader::current`]
//! peeks, [`Reader::advance`] consumes. Decoding stops right after the root
//! value, so anything that follows stays in the source.

use std::io::{self, Read};

/// A peekable byte source.
pub trait Reader {
    /// The byte under the cursor, or `None` at the end of input.
    fn current(&mut self) -> Option<u8>;

    /// Moves past the current byte. Does nothing at the end of input.
    fn advance(&mut self);
}

impl<R: Reader + ?Sized> Reader for &mut R {
    fn current(&mut self) -> Option<u8> {
        (**self).current()
    }

    fn advance(&mut self) {
        (**self).advance();
    }
}

/// Reads from a borrowed byte slice.
///
/// ```
/// use bumpjson::{Document, DecodeOptions, deserialize_json_with};
/// use bumpjson::reader::SliceReader;
///
/// let mut doc = Document::new();
/// let mut reader = SliceReader::new(b"{}123");
/// deserialize_json_with(&mut doc, &mut reader, DecodeOptions::default()).unwrap();
/// assert_eq!(reader.remaining(), b"123");
/// ```
#[derive(Debug, Clone)]
pub struct SliceReader<'i> {
    input: &'i [u8],
    position: usize,
}

impl<'i> SliceReader<'i> {
    /// Creates a reader positioned at the first byte.
    #[must_use]
    pub fn new(input: &'i [u8]) -> Self {
        SliceReader { input, position: 0 }
    }

    /// Number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The unread tail of the input.
    #[must_use]
    pub fn remaining(&self) -> &'i [u8] {
        &self.input[self.position..]
    }
}

impl Reader for SliceReader<'_> {
    #[inline]
    fn current(&mut self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    #[inline]
    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }
}

/// Reads from any [`io::Read`], one byte at a time.
///
/// At most one byte of look-ahead is held, and only after the decoder asked
/// for it. I/O errors end the input; the first one is kept for
/// [`take_error`](IoReader::take_error). Wrap slow sources in a
/// `BufReader`.
#[derive(Debug)]
pub struct IoReader<R> {
    inner: R,
    peeked: Option<Option<u8>>,
    error: Option<io::Error>,
}

impl<R: Read> IoReader<R> {
    /// Wraps a source.
    pub fn new(inner: R) -> Self {
        IoReader {
            inner,
            peeked: None,
            error: None,
        }
    }

    /// Returns the I/O error that ended the input, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Returns the wrapped source.
    ///
    /// A byte peeked but not consumed is lost; decoders never leave one
    /// behind after a successful decode of an array, object or quoted string.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return None,
                Ok(_) => return Some(byte[0]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.error.get_or_insert(err);
                    return None;
                }
            }
        }
    }
}

impl<R: Read> Reader for IoReader<R> {
    fn current(&mut self) -> Option<u8> {
        match self.peeked {
            Some(byte) => byte,
            None => {
                let byte = self.fill();
                self.peeked = Some(byte);
                byte
            }
        }
    }

    fn advance(&mut self) {
        match self.peeked.take() {
            // Already consumed by the peek.
            Some(_) => {}
            None => {
                let _ = self.fill();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_reader() {
        let mut reader = SliceReader::new(b"ab");
        assert_eq!(reader.current(), Some(b'a'));
        assert_eq!(reader.current(), Some(b'a'));
        reader.advance();
        assert_eq!(reader.current(), Some(b'b'));
        reader.advance();
        assert_eq!(reader.current(), None);
        reader.advance();
        assert_eq!(reader.position(), 2);
        assert!(reader.remaining().is_empty());
    }

    #[test]
    fn test_io_reader_does_not_read_ahead() {
        let mut reader = IoReader::new(io::Cursor::new(b"xyz".to_vec()));
        assert_eq!(reader.current(), Some(b'x'));
        reader.advance();

        let cursor = reader.into_inner();
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_io_reader_advance_without_peek() {
        let mut reader = IoReader::new(&b"xyz"[..]);
        reader.advance();
        assert_eq!(reader.current(), Some(b'y'));
        reader.advance();
        reader.advance();
        assert_eq!(reader.current(), None);
    }

    struct Failing;

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("unplugged"))
        }
    }

    #[test]
    fn test_io_error_ends_input() {
        let mut reader = IoReader::new(Failing);
        assert_eq!(reader.current(), None);
        assert_eq!(reader.take_error().unwrap().to_string(), "unplugged");
    }
}
