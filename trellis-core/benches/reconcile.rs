use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use trellis_core::{Element, Engine, MemoryBackend, Props};

fn table(rows: usize, tag: &str) -> Element {
    Element::native(
        "table",
        Props::new().children((0..rows).map(|i| {
            Element::native(
                "tr",
                Props::new()
                    .key(i.to_string())
                    .with("className", tag)
                    .child(Element::native("td", Props::new().child(i)))
                    .child(Element::native("td", Props::new().child(format!("row {i}")))),
            )
        })),
    )
}

fn mounted(rows: usize) -> Engine<MemoryBackend> {
    let mut engine = Engine::new(MemoryBackend::new());
    let container = engine.backend().container();
    engine.begin_render(table(rows, "even"), container).unwrap();
    engine.flush().unwrap();
    engine
}

fn bench_mount(c: &mut Criterion) {
    c.bench_function("mount_1000_rows", |b| {
        b.iter(|| black_box(mounted(1000)))
    });
}

fn bench_rerender_unchanged(c: &mut Criterion) {
    c.bench_function("rerender_unchanged_1000_rows", |b| {
        b.iter_batched(
            || mounted(1000),
            |mut engine| {
                engine.request_rerender().unwrap();
                black_box(engine.flush().unwrap())
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_patch_all(c: &mut Criterion) {
    c.bench_function("patch_1000_rows", |b| {
        b.iter_batched(
            || mounted(1000),
            |mut engine| {
                engine.render(table(1000, "odd")).unwrap();
                black_box(engine.flush().unwrap())
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_shrink(c: &mut Criterion) {
    c.bench_function("shrink_1000_to_500_rows", |b| {
        b.iter_batched(
            || mounted(1000),
            |mut engine| {
                engine.render(table(500, "even")).unwrap();
                black_box(engine.flush().unwrap())
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_mount,
    bench_rerender_unchanged,
    bench_patch_all,
    bench_shrink
);
criterion_main!(benches);
