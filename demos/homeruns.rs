use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use log::info;
use log::warn;
use tri_probe::DefaultHashBuilder;
use tri_probe::HashMap;

type Table = HashMap<String, u32, DefaultHashBuilder>;

#[derive(Parser, Debug)]
struct Args {
    /// CSV file of `name,homeruns` records.
    #[arg(long = "csv", default_value = "demos/players_homeruns.csv")]
    csv: PathBuf,

    /// Initial slot count, rounded up to a power of two.
    #[arg(short = 'c', long = "capacity", default_value_t = 256)]
    capacity: usize,
}

enum Command<'a> {
    Find(&'a str),
    Count,
    Remove(&'a str),
    Keys,
    Contains(&'a str),
    Exit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        match (verb, arg) {
            ("find", name) if !name.is_empty() => Some(Command::Find(name)),
            ("remove", name) if !name.is_empty() => Some(Command::Remove(name)),
            ("contains", name) if !name.is_empty() => Some(Command::Contains(name)),
            ("count", "") => Some(Command::Count),
            ("keys", "") => Some(Command::Keys),
            ("exit", "") => Some(Command::Exit),
            _ => None,
        }
    }
}

fn parse_record(line: &str) -> Option<(String, u32)> {
    let (name, homeruns) = line.split_once(',')?;
    let homeruns = homeruns.trim().parse().ok()?;
    Some((name.trim().to_string(), homeruns))
}

fn load(table: &mut Table, reader: impl BufRead) -> Result<usize> {
    let mut loaded = 0;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_record(&line) {
            Some((name, homeruns)) => {
                table.insert(name, homeruns);
                loaded += 1;
            }
            None => warn!("skipping malformed record on line {}: {line:?}", line_no + 1),
        }
    }
    Ok(loaded)
}

fn menu(table: &mut Table, input: impl BufRead, mut out: impl Write) -> Result<()> {
    writeln!(
        out,
        "Commands: find <name>, count, remove <name>, keys, contains <name>, exit"
    )?;

    for line in input.lines() {
        let line = line.context("reading command")?;
        let Some(command) = Command::parse(&line) else {
            writeln!(out, "Unrecognised command: {}", line.trim())?;
            continue;
        };

        match command {
            Command::Find(name) => match table.find(name) {
                Ok(homeruns) => writeln!(out, "Homeruns: {homeruns}")?,
                Err(e) => writeln!(out, "{name}: {e}")?,
            },
            Command::Count => writeln!(out, "Count: {}", table.count())?,
            Command::Remove(name) => {
                if table.remove(name).is_none() {
                    writeln!(out, "{name} was not in the table")?;
                }
            }
            Command::Keys => {
                for key in table.key_set() {
                    writeln!(out, "{key}")?;
                }
            }
            Command::Contains(name) => {
                let found = if table.contains_key(name) { "True" } else { "False" };
                writeln!(out, "{found}")?;
            }
            Command::Exit => break,
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let file = File::open(&args.csv).with_context(|| format!("opening {}", args.csv.display()))?;

    let mut table = Table::with_capacity(args.capacity);
    let loaded = load(&mut table, BufReader::new(file))?;
    info!(
        "loaded {loaded} records into {} entries ({} slots, {:.2} load factor)",
        table.count(),
        table.capacity(),
        table.load_factor()
    );

    menu(&mut table, std::io::stdin().lock(), std::io::stdout().lock())
}
