use criterion::{black_box, criterion_group, criterion_main, Criterion};
use optarr::{optarr, OptArr};

fn push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_back");

    group.bench_function("opt_arr", |b| {
        b.iter(|| {
            let mut arr = OptArr::<u32>::new();
            for i in 0..100 {
                arr.push_back(black_box(i));
            }
            arr
        });
    });

    group.bench_function("opt_arr_reserved", |b| {
        b.iter(|| {
            let mut arr = OptArr::<u32>::new();
            arr.reserve(100);
            for i in 0..100 {
                arr.push_back(black_box(i));
            }
            arr
        });
    });

    group.bench_function("vec_of_option", |b| {
        b.iter(|| {
            let mut vec = Vec::<Option<u32>>::new();
            for i in 0..100 {
                vec.push(black_box(Some(i)));
            }
            vec
        });
    });

    group.finish();
}

fn index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    let arr = optarr![5u32; 100];
    group.bench_function("opt_arr", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for i in 0..arr.len() {
                if let Some(val) = arr[black_box(i)] {
                    sum += val;
                }
            }
            sum
        });
    });

    let vec = vec![Some(5u32); 100];
    group.bench_function("vec_of_option", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for i in 0..vec.len() {
                if let Some(val) = vec[black_box(i)] {
                    sum += val;
                }
            }
            sum
        });
    });

    group.finish();
}

fn insert_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_front");

    group.bench_function("opt_arr", |b| {
        b.iter(|| {
            let mut arr = OptArr::<u32>::new();
            for i in 0..100 {
                arr.insert(0, black_box(i));
            }
            arr
        });
    });

    group.bench_function("vec_of_option", |b| {
        b.iter(|| {
            let mut vec = Vec::<Option<u32>>::new();
            for i in 0..100 {
                vec.insert(0, black_box(Some(i)));
            }
            vec
        });
    });

    group.finish();
}

criterion_group!(opt_arr, push_back, index, insert_front);
criterion_main!(opt_arr);
