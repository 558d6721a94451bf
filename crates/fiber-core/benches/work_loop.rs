use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fiber_core::{create_root, Deadline, Element, MemoryHost, Root, WorkStatus};

const ROW_SAMPLES: &[usize] = &[16, 64, 256, 1024];

fn list_content(rows: usize, revision: usize) -> Element {
    Element::host("ul")
        .attr("id", "rows")
        .children((0..rows).map(|row| {
            Element::host("li")
                .attr("class", if row % 2 == 0 { "even" } else { "odd" })
                .child(format!("row {row} rev {revision}"))
        }))
        .build()
}

struct ListFixture {
    root: Root<MemoryHost>,
    rows: usize,
    revision: usize,
}

impl ListFixture {
    fn new(rows: usize) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        Self {
            root: create_root(host, container),
            rows,
            revision: 0,
        }
    }

    fn render(&mut self) {
        self.revision += 1;
        self.root.render(list_content(self.rows, self.revision));
        self.root.flush_sync().expect("render");
        // keep the mutation log from growing across iterations
        self.root.host_mut().take_mutations();
    }
}

/// Deadline that always reports an almost spent slice, so every slice yields
/// after a single unit of work.
struct Exhausted;

impl Deadline for Exhausted {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("mount");
    for &rows in ROW_SAMPLES {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            b.iter(|| {
                let mut fixture = ListFixture::new(rows);
                fixture.render();
                black_box(fixture.root.fiber_count());
            });
        });
    }
    group.finish();
}

fn bench_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("rerender");
    for &rows in ROW_SAMPLES {
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            let mut fixture = ListFixture::new(rows);
            // Warm up so steady-state updates are measured.
            fixture.render();
            b.iter(|| {
                fixture.render();
            });
        });
    }
    group.finish();
}

fn bench_sliced(c: &mut Criterion) {
    let mut fixture = ListFixture::new(256);
    fixture.render();

    c.bench_function("rerender_one_unit_per_slice", |b| {
        b.iter(|| {
            fixture.revision += 1;
            fixture
                .root
                .render(list_content(fixture.rows, fixture.revision));
            let mut slices = 0;
            while fixture.root.work_loop(&Exhausted).expect("slice") == WorkStatus::Yielded {
                slices += 1;
            }
            fixture.root.host_mut().take_mutations();
            black_box(slices);
        });
    });
}

criterion_group!(work_loop, bench_mount, bench_rerender, bench_sliced);
criterion_main!(work_loop);
