use ofc::config::{Algorithm, OfcConfig, WaitMode};
use ofc::session;
use rand::{Rng, SeedableRng};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_input(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
	let path = dir.path().join(name);
	std::fs::write(&path, data).unwrap();
	path
}

fn decode(algorithm: Algorithm, path: &Path) -> Vec<u8> {
	let compressed = std::fs::read(path).unwrap();
	match algorithm {
		Algorithm::Lz4 => {
			let mut out = Vec::new();
			lz4_flex::frame::FrameDecoder::new(&compressed[..])
				.read_to_end(&mut out)
				.unwrap();
			out
		}
		Algorithm::Zstd => zstd::decode_all(&compressed[..]).unwrap(),
	}
}

fn round_trip(data: &[u8], config: &OfcConfig) -> Vec<u8> {
	let dir = TempDir::new().unwrap();
	let input = write_input(&dir, "input.bin", data);
	let output = dir.path().join("output.bin");
	let stats = session::compress(&input, &output, config).unwrap();
	assert_eq!(stats.original_size, data.len() as u64);
	decode(config.algorithm, &output)
}

fn sample_data(len: usize) -> Vec<u8> {
	// Mildly compressible: runs of repeats interleaved with noise.
	let mut rng = rand::rngs::StdRng::seed_from_u64(7);
	let mut data = Vec::with_capacity(len);
	while data.len() < len {
		if rng.gen_bool(0.5) {
			let b: u8 = rng.gen();
			let run = rng.gen_range(1..200).min(len - data.len());
			data.extend(std::iter::repeat(b).take(run));
		} else {
			let run = rng.gen_range(1..100).min(len - data.len());
			data.extend((0..run).map(|_| rng.gen::<u8>()));
		}
	}
	data
}

#[test]
fn round_trip_lz4() {
	let data = sample_data(200_000);
	let config = OfcConfig::default().with_algorithm(Algorithm::Lz4);
	assert_eq!(round_trip(&data, &config), data);
}

#[test]
fn round_trip_zstd() {
	let data = sample_data(200_000);
	let config = OfcConfig::default().with_algorithm(Algorithm::Zstd);
	assert_eq!(round_trip(&data, &config), data);
}

#[test]
fn round_trip_empty_input() {
	for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
		let config = OfcConfig::default().with_algorithm(algorithm);
		assert_eq!(round_trip(&[], &config), Vec::<u8>::new());
	}
}

#[test]
fn round_trip_exact_multiple_of_chunk_size() {
	let data = sample_data(16 * 1024 * 4);
	for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
		let config = OfcConfig::default().with_algorithm(algorithm);
		assert_eq!(round_trip(&data, &config), data);
	}
}

#[test]
fn chunk_boundary_invariance() {
	let data = sample_data(100_000);
	for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
		for chunk_size in [1usize, 7, 64 * 1024, data.len()] {
			let config = OfcConfig::default()
				.with_algorithm(algorithm)
				.with_chunk_size(chunk_size);
			assert_eq!(
				round_trip(&data, &config),
				data,
				"chunk size {} must not change the decoded payload",
				chunk_size
			);
		}
	}
}

#[test]
fn overlapped_and_blocking_outputs_are_identical() {
	let data = sample_data(300_000);
	let dir = TempDir::new().unwrap();
	let input = write_input(&dir, "input.bin", &data);

	for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
		let overlapped_out = dir.path().join("overlapped.bin");
		let blocking_out = dir.path().join("blocking.bin");

		let config = OfcConfig::default()
			.with_algorithm(algorithm)
			.with_wait_mode(WaitMode::Overlapped);
		session::compress(&input, &overlapped_out, &config).unwrap();

		let config = config.with_wait_mode(WaitMode::Blocking);
		session::compress(&input, &blocking_out, &config).unwrap();

		assert_eq!(
			std::fs::read(&overlapped_out).unwrap(),
			std::fs::read(&blocking_out).unwrap(),
			"pipelining must not change the output bytes"
		);
	}
}

#[test]
fn single_byte_input() {
	for algorithm in [Algorithm::Lz4, Algorithm::Zstd] {
		let config = OfcConfig::default().with_algorithm(algorithm);
		assert_eq!(round_trip(b"x", &config), b"x".to_vec());
	}
}

#[test]
fn output_is_overwritten_on_collision() {
	let data = sample_data(10_000);
	let dir = TempDir::new().unwrap();
	let input = write_input(&dir, "input.bin", &data);
	let output = write_input(&dir, "output.lz4", b"stale contents");

	let config = OfcConfig::default().with_algorithm(Algorithm::Lz4);
	session::compress(&input, &output, &config).unwrap();
	assert_eq!(decode(Algorithm::Lz4, &output), data);
}

#[test]
fn unopenable_input_returns_error_and_no_output() {
	let dir = TempDir::new().unwrap();
	let output = dir.path().join("never.zst");
	let config = OfcConfig::default().with_algorithm(Algorithm::Zstd);

	assert!(session::compress(Path::new("/nonexistent/in.bin"), &output, &config).is_err());
	assert!(!output.exists());
}

#[test]
fn compressed_size_matches_file_size() {
	let data = sample_data(64 * 1024);
	let dir = TempDir::new().unwrap();
	let input = write_input(&dir, "input.bin", &data);
	let output = dir.path().join("output.zst");

	let config = OfcConfig::default().with_algorithm(Algorithm::Zstd);
	let stats = session::compress(&input, &output, &config).unwrap();
	assert_eq!(
		stats.compressed_size,
		std::fs::metadata(&output).unwrap().len()
	);
}
