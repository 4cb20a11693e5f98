// file: src/corpus/identity.rs
// description: streaming content digest used as the file node key
// reference: https://docs.rs/md5

use crate::error::{PipelineError, Result};
use crate::models::{ContentHash, FileIdentity};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Computes an MD5 digest over a file in fixed-size chunks.
#[derive(Debug, Clone, Copy)]
pub struct ContentHasher {
    chunk_size: usize,
}

impl ContentHasher {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn hash_file(&self, path: &Path) -> Result<ContentHash> {
        let file = File::open(path).map_err(|e| PipelineError::file_operation(path, e))?;
        self.hash_reader(file)
            .map_err(|e| PipelineError::file_operation(path, e))
    }

    pub fn identify(&self, path: &Path) -> Result<FileIdentity> {
        Ok(FileIdentity::new(path, self.hash_file(path)?))
    }

    pub fn hash_reader(&self, mut reader: impl Read) -> std::io::Result<ContentHash> {
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => context.consume(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(ContentHash::from_hex(format!("{:x}", context.compute())))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}
