use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfcError {
	#[error("failed to open {path}: {source}")]
	Open {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("codec initialization failed: {0}")]
	CodecInit(String),

	#[error("compression failed: {0}")]
	CodecCompress(String),

	#[error("failed to finish compressed stream: {0}")]
	CodecFinalize(String),

	#[error("resource allocation failed: {0}")]
	ResourceExhausted(String),

	#[error("configuration error: {0}")]
	Config(String),
}

pub type Result<T> = std::result::Result<T, OfcError>;
