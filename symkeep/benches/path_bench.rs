use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use symkeep::path::{classify, normalize, rebase, HostContext, PathFlavor, PathResolver, RebaseDirection};

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    let host = HostContext::windows()
        .with_drive('Z', r"\\fileserver\projects")
        .unwrap();

    for (name, path) in [
        ("posix", "/home/user/projects/symkeep/src"),
        ("windows_local", r"C:\Users\user\projects\symkeep"),
        ("unc", r"\\fileserver\projects\symkeep\src"),
        ("mapped_drive", r"Z:\symkeep\src"),
        ("verbatim", r"\\?\C:\Users\user\projects"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), path, |b, path| {
            b.iter(|| classify(black_box(path), &host));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    // Benchmark a clean absolute path
    group.bench_function("posix_clean", |b| {
        b.iter(|| normalize(black_box("/absolute/path/to/file"), PathFlavor::Posix));
    });

    // Benchmark path with . and .. components
    group.bench_function("posix_with_dots", |b| {
        b.iter(|| normalize(black_box("/a/b/../c/./d//e"), PathFlavor::Posix));
    });

    // Benchmark mixed separators and a lower-case drive
    group.bench_function("windows_mixed_separators", |b| {
        b.iter(|| normalize(black_box(r"c:/Users\me/./docs\..\file.txt"), PathFlavor::WindowsLocal));
    });

    group.bench_function("unc", |b| {
        b.iter(|| normalize(black_box(r"\\server\share\a\..\b\c"), PathFlavor::WindowsUnc));
    });

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let windows = PathResolver::new(Arc::new(
        HostContext::windows()
            .with_drive('Z', r"\\fileserver\projects")
            .unwrap(),
    ));
    group.bench_function("unc_to_mapped_drive", |b| {
        b.iter(|| windows.to_local(black_box(r"\\fileserver\projects\f.txt"), PathFlavor::WindowsUnc));
    });

    let posix = PathResolver::new(Arc::new(HostContext::posix()));
    group.bench_function("posix_identity", |b| {
        b.iter(|| posix.to_local(black_box("/srv/data/f.txt"), PathFlavor::Posix));
    });

    group.bench_function("to_portable", |b| {
        b.iter(|| windows.to_portable(black_box(r"Z:\reports\q3.xlsx"), PathFlavor::WindowsMappedDrive));
    });

    group.finish();
}

fn bench_rebase(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebase");

    group.bench_function("to_relative", |b| {
        b.iter(|| {
            rebase(
                black_box("/srv/shared/deep/tree/f.txt"),
                PathFlavor::Posix,
                Some("/srv/links/a/b"),
                RebaseDirection::ToRelative,
            )
        });
    });

    group.bench_function("to_absolute", |b| {
        b.iter(|| {
            rebase(
                black_box("../../shared/deep/tree/f.txt"),
                PathFlavor::Posix,
                Some("/srv/links/a/b"),
                RebaseDirection::ToAbsolute,
            )
        });
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_normalize, bench_resolve, bench_rebase);
criterion_main!(benches);
