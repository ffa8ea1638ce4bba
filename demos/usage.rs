use ofc::config::{Algorithm, OfcConfig};
use ofc::session;

fn main() {
	let dir = std::env::temp_dir();
	let input = dir.join("ofc_demo_input.bin");
	let output = dir.join("ofc_demo_input.bin.zst");
	std::fs::write(&input, b"hello hello hello hello".repeat(1000)).unwrap();

	let cfg = OfcConfig::default().with_algorithm(Algorithm::Zstd);
	let stats = session::compress(&input, &output, &cfg).unwrap();
	println!("compressed {} -> {}", stats.original_size, stats.compressed_size);

	let restored = zstd::decode_all(&std::fs::read(&output).unwrap()[..]).unwrap();
	println!("restored {} bytes", restored.len());
}
