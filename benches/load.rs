use std::path::Path;

use criterion::{Criterion, criterion_group, criterion_main};
use runenv::{EnvLoader, TargetEnv};
use tempfile::TempDir;

fn bench_load(c: &mut Criterion) {
    let dir = TempDir::new().expect("failed to create temp dir");
    write_file(&dir.path().join(".env"), &make_env_content(2_000));

    c.bench_function("load_in_memory", |b| {
        b.iter(|| {
            let mut loader = EnvLoader::new()
                .current_dir(dir.path())
                .target(TargetEnv::memory());
            loader.load().expect("load should succeed")
        });
    });
}

fn bench_locate(c: &mut Criterion) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let child = dir.path().join("a").join("b").join("c");
    std::fs::create_dir_all(&child).expect("failed to create nested dirs");
    write_file(&dir.path().join(".env.yaml"), "KEY: value\n");

    c.bench_function("locate_three_parents", |b| {
        b.iter(|| runenv::locate(&child, 3, None).expect("env file should be found"));
    });
}

fn make_env_content(entries: usize) -> String {
    let mut content = String::with_capacity(entries * 24);
    for idx in 0..entries {
        content.push_str("KEY_");
        content.push_str(&idx.to_string());
        content.push('=');
        content.push_str("value_${KEY_0}");
        content.push('\n');
    }
    content
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).expect("failed to write bench file");
}

criterion_group!(benches, bench_load, bench_locate);
criterion_main!(benches);
