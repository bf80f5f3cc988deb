use std::hint::black_box;
use std::time::Instant;

use handgrid_kernel::AnimationDriver;
use handgrid_render::{
    CubeMapGenerator, ExtrudeSettings, HandScene, SceneSettings, extrude, palm_outline,
    phalanx_mesh,
};

const DT: f32 = 1.0 / 60.0;

fn bench_frame(phase_step: f32, iterations: usize) {
    let settings = SceneSettings {
        driver: AnimationDriver::curl().with_phase_step(phase_step),
        ..SceneSettings::default()
    };
    let Ok(mut scene) = HandScene::new(settings) else {
        println!("  frame: scene construction failed");
        return;
    };

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(scene.frame(black_box(DT)));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  frame (phase step {phase_step}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_meshes(iterations: usize) {
    let outline = palm_outline();
    let settings = ExtrudeSettings::default();

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(phalanx_mesh(black_box(1.0), black_box(3.0)));
        black_box(extrude(black_box(&outline), &settings));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  meshes ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_cubemap(iterations: usize) {
    let generator = CubeMapGenerator::default();

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(generator.generate().layer_bytes());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  cubemap ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Hand Frame Benchmarks ===\n");

    println!("Frame tick:");
    bench_frame(0.0, 10_000);
    bench_frame(0.1, 10_000);

    println!("\nProcedural meshes:");
    bench_meshes(200);

    println!("\nCubemap noise:");
    bench_cubemap(1_000);

    println!("\nDone.");
}
