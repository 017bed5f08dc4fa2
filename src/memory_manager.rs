use crate::error::Result;
use memmap::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// A read-only memory mapped file.
pub struct MmapFile {
    mmap: Mmap,
}

impl MmapFile {
    fn len(&self) -> usize {
        self.mmap.len()
    }
}

/// A writable memory map over the byte range `[offset, offset + len)` of an
/// existing file.
///
/// The file must already be at least `offset + len` bytes long.
pub struct MmapRegion {
    mmap: MmapMut,
}

impl MmapRegion {
    pub fn open<P: AsRef<Path>>(path: P, offset: u64, len: usize) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let mmap = unsafe { MmapOptions::new().offset(offset).len(len).map_mut(&file)? };
        Ok(Self { mmap })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap[..]
    }

    pub fn flush(&self) -> Result<()> {
        Ok(self.mmap.flush()?)
    }
}

/// A memory manager to hide the underlying type of a read-only byte buffer.
pub enum MemoryManager {
    /// A memory buffer.
    Mem(Vec<u8>),
    /// A read-only memory mapped buffer.
    Mmap(MmapFile),
}

impl MemoryManager {
    /// Maps the file at `path`; an empty file yields an empty buffer since
    /// zero-length maps are invalid.
    pub fn new_mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(MemoryManager::Mem(vec![]));
        }
        Ok(MemoryManager::Mmap(MmapFile {
            mmap: unsafe { Mmap::map(&file)? },
        }))
    }

    pub fn len(&self) -> usize {
        match self {
            MemoryManager::Mem(vec) => vec.len(),
            MemoryManager::Mmap(mmapfile) => mmapfile.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            MemoryManager::Mem(vec) => vec,
            MemoryManager::Mmap(mmapfile) => &mmapfile.mmap[..],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mem() {
        let mm = MemoryManager::Mem(vec![1, 2, 3, 4, 5]);
        assert_eq!(mm.len(), 5);
        assert_eq!(mm.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_mmap() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[3, 2, 1]).unwrap();
        let path = file.into_temp_path();
        let mm = MemoryManager::new_mmap(&path).unwrap();
        assert_eq!(mm.len(), 3);
        assert_eq!(mm.as_bytes(), &[3, 2, 1]);
    }

    #[test]
    fn test_mmap_empty() {
        let path = NamedTempFile::new().unwrap().into_temp_path();
        let mm = MemoryManager::new_mmap(&path).unwrap();
        assert!(mm.is_empty());
    }

    #[test]
    fn test_region() {
        let file = NamedTempFile::new().unwrap();
        file.as_file().set_len(10).unwrap();
        let path = file.into_temp_path();
        {
            let mut region = MmapRegion::open(&path, 4, 3).unwrap();
            assert_eq!(region.len(), 3);
            assert!(!region.is_empty());
            region.as_mut_slice().copy_from_slice(&[7, 8, 9]);
            region.flush().unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 7, 8, 9, 0, 0, 0]);
    }
}
