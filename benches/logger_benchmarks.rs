//! Criterion benchmarks for rust_log_backend

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_log_backend::pattern::render_to_string;
use rust_log_backend::prelude::*;
use std::sync::Arc;
use std::thread;

struct NullWriter {
    required: ValueSet,
}

impl Writer for NullWriter {
    fn required_values(&self) -> ValueSet {
        self.required
    }
    fn write(&self, entry: &LogEntry) -> Result<()> {
        black_box(entry);
        Ok(())
    }
    fn flush(&self) -> Result<()> {
        Ok(())
    }
    fn close(&self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "null"
    }
}

fn backend(configuration: Configuration, required: ValueSet) -> Arc<LoggingBackend> {
    LoggingBackend::builder()
        .configuration(configuration.with("writer", "null"))
        .registry(WriterRegistry::new().with("null", move |_, _| {
            Ok(Arc::new(NullWriter { required }) as Arc<dyn Writer>)
        }))
        .build()
        .unwrap()
}

fn message_only() -> ValueSet {
    ValueSet::of(&[LogEntryValue::Level, LogEntryValue::Message])
}

// ============================================================================
// Backend Creation Benchmarks
// ============================================================================

fn bench_backend_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("backend_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("sync", |b| {
        b.iter(|| black_box(backend(Configuration::new().with("level", "info"), message_only())));
    });

    group.bench_function("with_writing_thread", |b| {
        b.iter(|| {
            black_box(backend(
                Configuration::new().with("writingthread", "true"),
                message_only(),
            ))
        });
    });

    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_is_enabled(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_enabled");
    group.throughput(Throughput::Elements(1));

    let backend = backend(
        Configuration::new()
            .with("level", "info, debug@db")
            .with("level@app.service", "trace"),
        message_only(),
    );
    let module = Location::Module("app::worker");
    let package = Location::Name("app.service.Handler".into());

    group.bench_function("disabled", |b| {
        b.iter(|| backend.is_enabled(black_box(&module), None, black_box(Level::Debug)));
    });

    group.bench_function("enabled", |b| {
        b.iter(|| backend.is_enabled(black_box(&module), None, black_box(Level::Info)));
    });

    group.bench_function("tagged", |b| {
        b.iter(|| backend.is_enabled(black_box(&module), Some("db"), black_box(Level::Debug)));
    });

    group.bench_function("package_override", |b| {
        b.iter(|| backend.is_enabled(black_box(&package), None, black_box(Level::Trace)));
    });

    group.finish();
}

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let minimal = backend(Configuration::new(), message_only());
    let full = backend(Configuration::new(), ValueSet::all());
    let location = Location::Module("app::service");

    group.bench_function("message_only", |b| {
        b.iter(|| {
            minimal.log(&location, None, Level::Info, None, Some(&black_box("Info message")), &[], None);
        });
    });

    group.bench_function("all_values", |b| {
        b.iter(|| {
            full.log(&location, None, Level::Info, None, Some(&black_box("Info message")), &[], None);
        });
    });

    let formatter = BraceMessageFormatter::new();
    group.bench_function("formatted_arguments", |b| {
        b.iter(|| {
            minimal.log(
                &location,
                None,
                Level::Info,
                None,
                Some(&"User {} performed {}"),
                &[&black_box(42), &black_box("login")],
                Some(&formatter),
            );
        });
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    let backend = backend(Configuration::new().with("writingthread", "true"), message_only());
    let location = Location::Module("app::service");

    group.bench_function("enqueue", |b| {
        b.iter(|| {
            backend.log(&location, None, Level::Info, None, Some(&black_box("Async message")), &[], None);
        });
    });

    group.finish();
    backend.shutdown();
}

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    for threads in [2, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * 1_000));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            let backend = backend(Configuration::new().with("writingthread", "true"), message_only());
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let backend = Arc::clone(&backend);
                        thread::spawn(move || {
                            let location = Location::Module("app::worker");
                            for _ in 0..1_000 {
                                backend.log(&location, None, Level::Info, None, Some(&"Concurrent"), &[], None);
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
            });
            backend.shutdown();
        });
    }

    group.finish();
}

// ============================================================================
// Pattern Benchmarks
// ============================================================================

fn bench_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern");
    group.throughput(Throughput::Elements(1));

    let parser = FormatPatternParser::new(InternalLogger::capturing());
    let patterns = [
        ("simple", "{level}: {message}"),
        ("default", "{date} [{thread}] {level}: {message}"),
        (
            "styled",
            "{date: %H:%M:%S%.3f} {level|min-size=5} {{class}.{method}()|max-size=30}: {message|indent=4}",
        ),
    ];

    for (name, pattern) in patterns {
        group.bench_function(BenchmarkId::new("parse", name), |b| {
            b.iter(|| black_box(parser.parse(black_box(pattern))));
        });
    }

    let entry = LogEntry::new(Level::Info)
        .with_timestamp(chrono::Utc::now())
        .with_thread(rust_log_backend::core::ThreadInfo::current())
        .with_location("app.service.Handler", "handle", "handler.rs", 42)
        .with_message("Request handled\nin 12 ms");

    for (name, pattern) in patterns {
        let token = parser.parse(pattern);
        group.bench_function(BenchmarkId::new("render", name), |b| {
            b.iter(|| black_box(render_to_string(token.as_ref(), black_box(&entry))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_backend_creation,
    bench_is_enabled,
    bench_sync_logging,
    bench_async_logging,
    bench_concurrent_logging,
    bench_pattern,
);

criterion_main!(benches);
