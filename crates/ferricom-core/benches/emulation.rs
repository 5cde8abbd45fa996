//! Whole-machine throughput benchmarks.

use criterion::{criterion_group, criterion_main, Criterion};
use ferricom_core::Console;

/// NROM image: NOP slide with the reset vector at $8000 and an RTI NMI
/// handler, so the machine runs frames forever.
fn nop_rom() -> Vec<u8> {
    let mut data = vec![0x4E, 0x45, 0x53, 0x1A, 2, 1, 0, 0];
    data.extend_from_slice(&[0; 8]);
    let mut prg = vec![0xEA; 32 * 1024];
    prg[0x1000] = 0x40; // RTI at $9000
    prg[0x7FFA] = 0x00;
    prg[0x7FFB] = 0x90;
    prg[0x7FFC] = 0x00;
    prg[0x7FFD] = 0x80;
    data.extend_from_slice(&prg);
    data.extend_from_slice(&[0; 8 * 1024]);
    data
}

fn bench_step(c: &mut Criterion) {
    let rom = nop_rom();
    c.bench_function("console_step", |b| {
        let mut console = Console::new(&rom).expect("test ROM loads");
        b.iter(|| console.step());
    });
}

fn bench_frame(c: &mut Criterion) {
    let rom = nop_rom();
    c.bench_function("console_run_frame", |b| {
        let mut console = Console::new(&rom).expect("test ROM loads");
        b.iter(|| console.run_frame());
    });
}

criterion_group!(benches, bench_step, bench_frame);
criterion_main!(benches);
