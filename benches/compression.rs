use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use ofc::config::{Algorithm, OfcConfig};
use ofc::session;
use tempfile::TempDir;

fn bench_compress(c: &mut Criterion) {
	let data = vec![0u8; 8 * 1024 * 1024];
	let dir = TempDir::new().unwrap();
	let input = dir.path().join("input.bin");
	std::fs::write(&input, &data).unwrap();

	let mut group = c.benchmark_group("compression");
	group.throughput(Throughput::Bytes(data.len() as u64));
	group.bench_function("compress_zeroes_lz4", |b| {
		let config = OfcConfig::default().with_algorithm(Algorithm::Lz4);
		let output = dir.path().join("output.lz4");
		b.iter(|| {
			let _ = session::compress(&input, &output, &config).unwrap();
		});
	});
	group.bench_function("compress_zeroes_zstd", |b| {
		let config = OfcConfig::default().with_algorithm(Algorithm::Zstd);
		let output = dir.path().join("output.zst");
		b.iter(|| {
			let _ = session::compress(&input, &output, &config).unwrap();
		});
	});
	group.finish();
}

criterion_group!(benches, bench_compress);
criterion_main!(benches);
