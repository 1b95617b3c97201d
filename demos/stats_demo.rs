use std::hash::BuildHasher;

use clap::Parser;
use tri_probe::DefaultHashBuilder;
use tri_probe::HashTable;
use tri_probe::hash_table::Entry;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Percentage of inserted values to remove afterwards.
    #[arg(short = 'r', long = "remove_percent", default_value_t = 25)]
    remove_percent: u64,
}

fn print_histogram(hist: &[usize]) {
    println!("=== Probe Length Histogram ===");
    let total: usize = hist.iter().sum();
    for (length, count) in hist.iter().enumerate().skip(1) {
        if *count == 0 {
            continue;
        }
        println!(
            "{length:>4}: {count:>8} ({:.02}%)",
            *count as f64 / total.max(1) as f64 * 100.0
        );
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let hasher = DefaultHashBuilder::default();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let mut table: HashTable<u64> = HashTable::with_capacity(args.target_capacity);
    let capacity = table.capacity();
    println!("Actual capacity: {capacity}");

    // Fill right up to the load bound without triggering growth.
    let num_values = (capacity as u64 * 4) / 5;
    println!("Filling table with {num_values} u64 values...");
    for value in 0..num_values {
        let hash = hasher.hash_one(value);
        match table.entry(hash, |&v| v == value) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }
    }

    println!("Inserted {} values into table", table.len());
    print_histogram(&table.probe_histogram());
    table.debug_stats().print();

    let removed = (0..num_values)
        .filter(|value| value % 100 < args.remove_percent)
        .filter(|&value| table.remove(hasher.hash_one(value), |&v| v == value).is_some())
        .count();

    println!("\nRemoved {removed} values, leaving tombstones in place");
    print_histogram(&table.probe_histogram());
    table.debug_stats().print();
}
