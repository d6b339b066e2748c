use std::borrow::Cow;
use std::io::Read;
use std::io::Result as IoResult;

use crate::errors::ExtractError;

extern crate circular;

/// Splits a stream into lines, without the trailing `\n` / `\r\n`. The
/// buffer grows when a single line doesn't fit. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD.
#[derive(Debug)]
pub struct LineReader<T: Read> {
    buffer: circular::Buffer,
    stream: T,
    capacity: usize,
    is_eof: bool,
    line_no: usize,
}

impl<T: Read> LineReader<T> {
    pub fn new(stream: T, capacity: usize) -> LineReader<T> {
        LineReader {
            stream,
            capacity,
            buffer: circular::Buffer::with_capacity(capacity),
            is_eof: false,
            line_no: 0,
        }
    }

    fn fill_buffer(&mut self) -> IoResult<usize> {
        if self.is_eof {
            return Ok(0);
        }
        // move unread data to the front before asking for more
        self.buffer.shift();
        if self.buffer.available_space() == 0 {
            self.capacity *= 2;
            self.buffer.grow(self.capacity);
            debug!("Increasing read buffer capacity to {} b", self.capacity);
        }
        let bytes_read = self.stream.read(self.buffer.space())?;
        if bytes_read == 0 {
            self.is_eof = true;
        } else {
            self.buffer.fill(bytes_read);
        }
        Ok(bytes_read)
    }

    pub fn next_line(&mut self) -> Result<Option<String>, ExtractError> {
        loop {
            let data = self.buffer.data();
            let (len, consumed) = match data.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos, pos + 1),
                None if self.is_eof && !data.is_empty() => (data.len(), data.len()),
                None if self.is_eof => return Ok(None),
                None => {
                    self.fill_buffer()?;
                    continue;
                }
            };
            let mut line = &data[..len];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            let line = match String::from_utf8_lossy(line) {
                Cow::Borrowed(l) => l.to_owned(),
                Cow::Owned(l) => {
                    debug!("Line {} is not valid UTF-8", self.line_no + 1);
                    l
                }
            };
            self.buffer.consume(consumed);
            self.line_no += 1;
            return Ok(Some(line));
        }
    }
}

impl<T: Read> Iterator for LineReader<T> {
    type Item = Result<String, ExtractError>;

    fn next(&mut self) -> Option<Result<String, ExtractError>> {
        self.next_line().transpose()
    }
}
