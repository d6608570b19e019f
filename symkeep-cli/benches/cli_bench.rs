use std::path::Path;
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

const RECORDS: usize = 50;

fn symkeep(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("symkeep").expect("failed to locate symkeep binary");
    cmd.arg("--data-dir").arg(data_dir).arg("--quiet");
    cmd.stdout(Stdio::null()).stderr(Stdio::null());
    cmd
}

/// A temp tree with one target file and `RECORDS` records pointing at it.
fn record_tree() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let target = dir.path().join("data").join("target.txt");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, "bench").unwrap();

    for i in 0..RECORDS {
        let link = dir.path().join("links").join(format!("link-{i}"));
        let status = symkeep(&dir.path().join("data-dir"))
            .arg("create")
            .arg(&target)
            .arg(&link)
            .arg("--output")
            .arg(dir.path().join("records").join(format!("link-{i}.symkeep")))
            .status()
            .expect("failed to execute symkeep create");
        assert!(status.success(), "symkeep create failed");
    }
    std::fs::create_dir_all(dir.path().join("links")).unwrap();
    dir
}

fn bench_cli_startup(c: &mut Criterion) {
    c.bench_function("cli_startup_version", |b| {
        b.iter(|| {
            let mut cmd = Command::cargo_bin("symkeep").expect("failed to locate symkeep binary");
            let output = cmd.arg("--version").output().expect("failed to run symkeep");
            black_box(output);
        });
    });
}

fn bench_cli_import(c: &mut Criterion) {
    c.bench_function("cli_import_50", |b| {
        b.iter_batched(
            record_tree,
            |dir| {
                let status = symkeep(&dir.path().join("data-dir"))
                    .arg("import")
                    .arg(dir.path().join("records"))
                    .status()
                    .expect("failed to execute symkeep import");
                black_box(status.success());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_cli_scan(c: &mut Criterion) {
    c.bench_function("cli_scan_50", |b| {
        b.iter_batched(
            || {
                let dir = record_tree();
                let status = symkeep(&dir.path().join("data-dir"))
                    .arg("import")
                    .arg(dir.path().join("records"))
                    .status()
                    .expect("failed to execute symkeep import");
                assert!(status.success(), "symkeep import failed");
                dir
            },
            |dir| {
                let output = Command::cargo_bin("symkeep")
                    .expect("failed to locate symkeep binary")
                    .arg("--data-dir")
                    .arg(dir.path().join("data-dir"))
                    .arg("scan")
                    .arg(dir.path().join("links"))
                    .arg("--json")
                    .output()
                    .expect("failed to execute symkeep scan");
                black_box(output);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(cli_benches, bench_cli_startup, bench_cli_import, bench_cli_scan);
criterion_main!(cli_benches);
