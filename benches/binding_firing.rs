//! Benchmarks for binding firing and profile persistence
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use helios_core::registry::builtins;
use helios_core::serialization::ProfileLoader;
use helios_core::{
    BindingValue, ComponentRegistry, ElementId, ElementSpec, EngineSettings, HeliosBinding,
    HeliosGraph, HeliosProfile, ObjectKind,
};

/// A visual holding one numeric value element; returns its value element.
fn level(graph: &mut HeliosGraph, name: String) -> ElementId {
    let object = graph.create_object(ObjectKind::Visual, "Bench.Level", name);
    graph
        .add_element(object, ElementSpec::value("", "level", BindingValue::from_double(0.0)))
        .unwrap()
}

fn bind(graph: &mut HeliosGraph, from: ElementId, to: ElementId) {
    let owner = |graph: &HeliosGraph, e: ElementId| graph.element(e).unwrap().owner();
    let trigger = graph.find_trigger(owner(graph, from), "level.changed").unwrap();
    let action = graph.find_action(owner(graph, to), "level.set").unwrap();
    graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for size in [10, 100, 1000].iter() {
        let mut graph = HeliosGraph::new();
        let source = level(&mut graph, "Source".to_string());
        for i in 0..*size {
            let target = level(&mut graph, format!("Target {}", i));
            bind(&mut graph, source, target);
        }

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("set_value", size), size, |b, _| {
            let mut next = 0.0;
            b.iter(|| {
                next += 1.0;
                graph
                    .set_value(source, black_box(BindingValue::from_double(next)), false)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");

    for (depth, tracing) in [(10, false), (100, false), (100, true)] {
        let mut graph = HeliosGraph::new();
        graph.set_loop_tracing(tracing);
        let head = level(&mut graph, "Level 0".to_string());
        let mut previous = head;
        for i in 1..depth {
            let next = level(&mut graph, format!("Level {}", i));
            bind(&mut graph, previous, next);
            previous = next;
        }

        let id = if tracing { "traced" } else { "untraced" };
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new(id, depth), &depth, |b, _| {
            let mut next = 0.0;
            b.iter(|| {
                next += 1.0;
                graph
                    .set_value(head, black_box(BindingValue::from_double(next)), false)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_scripted_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("scripted_binding");
    let mut graph = HeliosGraph::new();
    let source = level(&mut graph, "Source".to_string());
    let target = level(&mut graph, "Target".to_string());
    let source_object = graph.element(source).unwrap().owner();
    let target_object = graph.element(target).unwrap().owner();
    let trigger = graph.find_trigger(source_object, "level.changed").unwrap();
    let action = graph.find_action(target_object, "level.set").unwrap();
    graph
        .add_binding(
            HeliosBinding::new(trigger, action)
                .with_condition("TriggerValue > 0.0")
                .with_script("TriggerValue * 2.0 + 1.0"),
        )
        .unwrap();

    group.bench_function("condition_and_script", |b| {
        let mut next = 0.0;
        b.iter(|| {
            next += 1.0;
            graph
                .set_value(source, black_box(BindingValue::from_double(next)), false)
                .unwrap();
        });
    });

    group.finish();
}

fn bench_value_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("value_conversion");
    let text = BindingValue::from_string("1234.5");
    let number = BindingValue::from_double(1234.5);

    group.bench_function("string_to_double", |b| {
        b.iter(|| black_box(black_box(&text).double_value()))
    });
    group.bench_function("double_to_string", |b| {
        b.iter(|| black_box(BindingValue::from_double(black_box(1234.5)).string_value().len()))
    });
    group.bench_function("equals_mixed", |b| {
        b.iter(|| black_box(black_box(&text).equals(black_box(&number))))
    });

    group.finish();
}

fn sample_profile(registry: &ComponentRegistry, panels: usize) -> HeliosProfile {
    let mut profile = HeliosProfile::new(&EngineSettings::default(), registry).unwrap();
    let monitor = profile.add_monitor(registry, "Monitor 1").unwrap();
    let sim = profile
        .add_interface(registry, builtins::SIMULATOR_INTERFACE, "Simulator")
        .unwrap();
    for i in 0..panels {
        let panel = profile
            .add_control(registry, monitor, builtins::PANEL, format!("Panel {}", i))
            .unwrap();
        let gear = profile
            .add_control(registry, panel, builtins::TOGGLE_SWITCH, "Gear")
            .unwrap();
        let graph = profile.graph_mut();
        let trigger = graph.find_trigger(sim, "Gear.Handle.changed").unwrap();
        let action = graph.find_action(gear, "position.set").unwrap();
        graph.add_binding(HeliosBinding::new(trigger, action)).unwrap();
    }
    profile
}

fn bench_profile_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("profile_persistence");
    let registry = ComponentRegistry::with_builtins();
    let settings = EngineSettings::default();

    for panels in [10, 100].iter() {
        let profile = sample_profile(&registry, *panels);
        let xml = profile.to_xml();

        group.bench_with_input(BenchmarkId::new("write", panels), &profile, |b, profile| {
            b.iter(|| black_box(profile.to_xml()))
        });
        group.bench_with_input(BenchmarkId::new("load", panels), &xml, |b, xml| {
            b.iter(|| {
                let loader = ProfileLoader::from_xml(black_box(xml), &settings, &registry).unwrap();
                black_box(loader.finish())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fan_out,
    bench_chain,
    bench_scripted_binding,
    bench_value_conversion,
    bench_profile_persistence,
);
criterion_main!(benches);
