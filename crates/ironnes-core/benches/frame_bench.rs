//! Frame-stepping throughput benchmark.

use criterion::{criterion_group, criterion_main, Criterion};
use ironnes_core::Console;

/// Minimal 16 KiB NROM image: a NOP sled vectored at $8000.
fn nop_image() -> Vec<u8> {
    let prg_len = 16 * 1024;
    let mut image = vec![0u8; 16];
    image[0..4].copy_from_slice(&[0x4E, 0x45, 0x53, 0x1A]);
    image[4] = 1;
    let mut prg = vec![0xEA; prg_len];
    prg[0x3FFC] = 0x00;
    prg[0x3FFD] = 0x80;
    image.extend(prg);
    image
}

fn bench_step_frame(c: &mut Criterion) {
    let image = nop_image();

    c.bench_function("step_frame_nop_sled", |b| {
        let mut console = Console::new(&image).unwrap();
        b.iter(|| console.step_frame());
    });

    c.bench_function("step_frame_rendering", |b| {
        let mut console = Console::new(&image).unwrap();
        // Turn rendering on so the scanline compositor runs.
        use ironnes_cpu::Bus;
        Bus::write(console.bus_mut(), 0x2001, 0x1E);
        b.iter(|| console.step_frame());
    });
}

criterion_group!(benches, bench_step_frame);
criterion_main!(benches);
