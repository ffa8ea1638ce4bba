use crate::error::OfcError;
use std::str::FromStr;

/// Bytes read from the input per chunk loop iteration.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Lz4,
    Zstd,
}

impl Algorithm {
    /// File extension appended to the input name for the output file.
    pub fn extension(&self) -> &'static str {
        match self {
            Algorithm::Lz4 => "lz4",
            Algorithm::Zstd => "zst",
        }
    }
}

/// Whether chunk writes block until completion or are issued overlapped
/// and reconciled on the next iteration. Header and trailer writes always
/// block regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Blocking,
    Overlapped,
}

#[derive(Debug, Clone)]
pub struct OfcConfig {
    pub algorithm: Algorithm,
    pub chunk_size: usize,
    /// Compression level; applies to zstd only (the LZ4 frame encoder has
    /// a single fast mode).
    pub level: i32,
    pub wait_mode: WaitMode,
    /// Render a progress bar while compressing. Off by default; the CLI
    /// turns it on.
    pub progress: bool,
}

impl Default for OfcConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Lz4,
            chunk_size: DEFAULT_CHUNK_SIZE,
            level: 1,
            wait_mode: WaitMode::Overlapped,
            progress: false,
        }
    }
}

impl OfcConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_wait_mode(mut self, wait_mode: WaitMode) -> Self {
        self.wait_mode = wait_mode;
        self
    }

    /// Reject configurations the session could not honor.
    pub fn validate(&self) -> Result<(), OfcError> {
        if self.chunk_size == 0 {
            return Err(OfcError::Config("chunk size must be non-zero".to_string()));
        }
        if !zstd::compression_level_range().contains(&self.level) {
            return Err(OfcError::Config(format!(
                "compression level {} out of range",
                self.level
            )));
        }
        Ok(())
    }
}

impl FromStr for Algorithm {
    type Err = OfcError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lz4" => Ok(Algorithm::Lz4),
            "zstd" => Ok(Algorithm::Zstd),
            _ => Err(OfcError::Config(format!("Invalid algorithm: {}", s))),
        }
    }
}

impl FromStr for WaitMode {
    type Err = OfcError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blocking" => Ok(WaitMode::Blocking),
            "overlapped" => Ok(WaitMode::Overlapped),
            _ => Err(OfcError::Config(format!("Invalid wait mode: {}", s))),
        }
    }
}
