//! Criterion micro-benchmarks for single-rank stencil kernels.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use strand_bench::seeded_field;
use strand_core::{FieldStack, GridDims, NameIndex, Params};
use strand_decomp::LocalLayout;
use strand_kernel::{Kernel, KernelState};
use strand_kernels::stencil::laplacian;
use strand_kernels::{AllenCahn, Diffusion};

/// Ghost-padded buffers for one 256x256 field seeded with noise.
struct Buffers {
    layout: LocalLayout,
    names: NameIndex,
    fields: FieldStack,
    chem_pot: FieldStack,
    mobility: FieldStack,
}

impl Buffers {
    fn new() -> Self {
        let interior = GridDims::new(&[256, 256]).unwrap();
        let layout = LocalLayout::new(interior, 1);
        let len = layout.padded_volume();
        let mut fields = FieldStack::try_new(1, len).unwrap();
        let noise = seeded_field(&GridDims::new(&[len]).unwrap(), 3);
        fields.field_mut(0).copy_from_slice(&noise);
        Self {
            layout,
            names: NameIndex::from_strings(&["phi".to_string()]).unwrap(),
            fields,
            chem_pot: FieldStack::try_new(1, len).unwrap(),
            mobility: FieldStack::try_new(1, len).unwrap(),
        }
    }

    fn state(&mut self, step: u64) -> KernelState<'_> {
        KernelState::new(
            &mut self.fields,
            &mut self.chem_pot,
            &mut self.mobility,
            &self.layout,
            &self.names,
            step,
        )
    }
}

fn bench_laplacian_256(c: &mut Criterion) {
    let buffers = Buffers::new();
    let mut out = vec![0.0; buffers.layout.padded_volume()];
    c.bench_function("laplacian_256x256", |b| {
        b.iter(|| {
            laplacian(&buffers.layout, buffers.fields.field(0), 1.0, &mut out);
            black_box(&out);
        });
    });
}

fn bench_kernel<K: Kernel>(c: &mut Criterion, id: &str, mut kernel: K) {
    let mut buffers = Buffers::new();
    kernel
        .preprocess(&mut buffers.state(0), &Params::new())
        .unwrap();
    let mut step = 0;
    c.bench_function(id, |b| {
        b.iter(|| {
            step += 1;
            kernel.apply(&mut buffers.state(step)).unwrap();
        });
    });
    black_box(buffers.fields.as_slice());
}

fn bench_diffusion_step(c: &mut Criterion) {
    bench_kernel(c, "diffusion_step_256x256", Diffusion::default());
}

fn bench_allen_cahn_step(c: &mut Criterion) {
    bench_kernel(c, "allen_cahn_step_256x256", AllenCahn::default());
}

criterion_group!(
    benches,
    bench_laplacian_256,
    bench_diffusion_step,
    bench_allen_cahn_step
);
criterion_main!(benches);
