use crate::{
    error::{format_error, Result},
    memory_manager::MemoryManager,
    types::SInt,
};
use std::path::Path;

/// A cursor over the bytes of a memory mapped text file.
pub struct MappedFileToker {
    mm: MemoryManager,
    position: usize,
}

impl MappedFileToker {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(MemoryManager::new_mmap(path)?))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(MemoryManager::Mem(bytes))
    }

    fn new(mm: MemoryManager) -> Self {
        MappedFileToker { mm, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn length(&self) -> usize {
        self.mm.len()
    }

    pub fn valid_position(&self) -> bool {
        self.position < self.mm.len()
    }

    /// Moves the cursor to `position`. If that is inside a line, the cursor
    /// continues at the start of the next line.
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.length());
        if self.position > 0 && self.bytes()[self.position - 1] != b'\n' {
            self.skip_line();
        }
    }

    pub fn current(&self) -> Option<u8> {
        self.bytes().get(self.position).copied()
    }

    pub fn test_char(&self, c: u8) -> bool {
        self.current() == Some(c)
    }

    pub fn skip_spaces(&mut self) {
        while matches!(self.current(), Some(b' ') | Some(b'\t')) {
            self.position += 1;
        }
    }

    /// Advances past the next newline, or to the end of the file.
    pub fn skip_line(&mut self) {
        let rest = &self.bytes()[self.position..];
        let skipped = rest
            .iter()
            .position(|&c| c == b'\n')
            .map_or(rest.len(), |i| i + 1);
        self.position += skipped;
    }

    /// Whether only spaces remain before the end of the current line.
    pub fn at_line_end(&mut self) -> bool {
        self.skip_spaces();
        matches!(self.current(), None | Some(b'\n') | Some(b'\r'))
    }

    pub fn consume_char(&mut self, c: u8) -> Result<()> {
        self.skip_spaces();
        match self.current() {
            Some(found) if found == c => {
                self.position += 1;
                Ok(())
            }
            Some(found) => format_error(
                self.position,
                format!("expected '{}', found '{}'", c as char, found as char),
            ),
            None => format_error(
                self.position,
                format!("expected '{}', found end of file", c as char),
            ),
        }
    }

    /// Consumes the rest of the line, which must be blank.
    pub fn consume_line_end(&mut self) -> Result<()> {
        if !self.at_line_end() {
            return format_error(self.position, "expected end of line");
        }
        if self.test_char(b'\r') {
            self.position += 1;
        }
        if self.valid_position() {
            self.consume_char(b'\n')?;
        }
        Ok(())
    }

    pub fn consume_int(&mut self) -> Result<SInt> {
        self.skip_spaces();
        let start = self.position;
        let mut value: SInt = 0;
        while let Some(c @ b'0'..=b'9') = self.current() {
            value = match value
                .checked_mul(10)
                .and_then(|v| v.checked_add((c - b'0') as SInt))
            {
                Some(value) => value,
                None => return format_error(start, "integer overflow"),
            };
            self.position += 1;
        }
        if self.position == start {
            return format_error(start, "expected integer");
        }
        Ok(value)
    }

    fn bytes(&self) -> &[u8] {
        self.mm.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_consume() {
        let mut toker = MappedFileToker::from_bytes(b"12  7\n\t3\r\n".to_vec());
        assert_eq!(toker.consume_int().unwrap(), 12);
        assert_eq!(toker.consume_int().unwrap(), 7);
        toker.consume_line_end().unwrap();
        assert_eq!(toker.consume_int().unwrap(), 3);
        toker.consume_line_end().unwrap();
        assert!(!toker.valid_position());
    }

    #[test]
    fn test_errors_report_offset() {
        let mut toker = MappedFileToker::from_bytes(b"4 x\n".to_vec());
        toker.consume_int().unwrap();
        match toker.consume_int() {
            Err(Error::Format { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(toker.consume_char(b'y').is_err());
        toker.consume_char(b'x').unwrap();
        assert!(toker.consume_char(b'x').is_err());
    }

    #[test]
    fn test_overflow() {
        let mut toker = MappedFileToker::from_bytes(b"99999999999999999999999".to_vec());
        assert!(toker.consume_int().is_err());
    }

    #[test]
    fn test_seek_recovers_line_start() {
        let mut toker = MappedFileToker::from_bytes(b"10 11\n20 21\n30 31\n".to_vec());
        toker.seek(8);
        assert_eq!(toker.position(), 12);
        assert_eq!(toker.consume_int().unwrap(), 30);
        toker.seek(6);
        assert_eq!(toker.consume_int().unwrap(), 20);
        toker.seek(0);
        assert_eq!(toker.consume_int().unwrap(), 10);
        toker.seek(100);
        assert!(!toker.valid_position());
    }

    #[test]
    fn test_skip_line() {
        let mut toker = MappedFileToker::from_bytes(b"a b c\nd".to_vec());
        toker.skip_line();
        assert!(toker.test_char(b'd'));
        toker.skip_line();
        assert_eq!(toker.position(), toker.length());
    }

    #[test]
    fn test_open() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"5 6\n").unwrap();
        let path = file.into_temp_path();
        let mut toker = MappedFileToker::open(&path).unwrap();
        assert_eq!(toker.length(), 4);
        assert_eq!(toker.consume_int().unwrap(), 5);
    }
}
