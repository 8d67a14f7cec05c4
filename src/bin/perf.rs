use log::{info, LevelFilter};
use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use structopt::StructOpt;

use std::{cell::Cell, rc::Rc, time};

use rbtmpl::{RbTree, Template};

/// Command line options.
#[derive(Clone, StructOpt)]
pub struct Opt {
    #[structopt(long = "seed")]
    seed: Option<u64>,

    #[structopt(long = "loads", default_value = "1000000")] // default 1M
    loads: usize,

    #[structopt(long = "sets", default_value = "0")]
    sets: usize,

    #[structopt(long = "dels", default_value = "0")]
    dels: usize,

    #[structopt(long = "gets", default_value = "0")]
    gets: usize,

    #[structopt(long = "log", default_value = "warn")]
    log: LevelFilter,
}

fn main() {
    let opts = Opt::from_args();
    TermLogger::init(
        opts.log,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .unwrap();

    let seed = opts.seed.unwrap_or_else(random);
    info!("perf seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let frees = Rc::new(Cell::new(0_usize));
    let tmpl = {
        let frees = Rc::clone(&frees);
        Template::new("perf", |key: u64| Ok(key), |a: &u64, b: &u64| a.cmp(b))
            .with_free(move |_key: u64| frees.set(frees.get() + 1))
    };
    let tmpl = Rc::new(tmpl);
    let mut index: RbTree<u64, u64> = RbTree::new(&tmpl);

    // initial load
    let start = time::Instant::now();
    for _i in 0..opts.loads {
        index.insert(rng.gen()).ok();
    }
    println!(
        "loaded {} items in {:?}, height:{}",
        index.len(),
        start.elapsed(),
        index.height()
    );

    do_incremental(&mut rng, &opts, &mut index);

    let start = time::Instant::now();
    let (mut n, mut cursor) = (0, index.leftmost());
    while let Some(id) = cursor {
        n += 1;
        cursor = index.successor(id);
    }
    println!("iterating {} entries, took {:?}", n, start.elapsed());

    let start = time::Instant::now();
    index.validate().unwrap();
    println!(
        "validated {} entries, took {:?}, black height:{}",
        index.len(),
        start.elapsed(),
        index.is_balanced().unwrap_or(0)
    );

    let start = time::Instant::now();
    index.clear().unwrap();
    println!("cleared in {:?}, freed {} payloads", start.elapsed(), frees.get());
}

fn do_incremental(rng: &mut SmallRng, opts: &Opt, index: &mut RbTree<u64, u64>) {
    let total = opts.sets + opts.dels + opts.gets;
    if total == 0 {
        return;
    }

    let start = time::Instant::now();
    let (mut n_sets, mut n_dels, mut n_gets) = (0, 0, 0);
    for _i in 0..total {
        let op = rng.gen::<usize>() % total;
        // bias keys toward the loaded set so dels and gets hit entries.
        let key = if !index.is_empty() && rng.gen::<bool>() {
            pick_existing(rng, index)
        } else {
            rng.gen::<u64>()
        };

        if op < opts.sets {
            index.insert(key).ok();
            n_sets += 1;
        } else if op < (opts.sets + opts.dels) {
            if let Ok(Some(id)) = index.find(key) {
                index.erase(id).ok();
            }
            n_dels += 1;
        } else {
            index.find(key).ok();
            n_gets += 1;
        }
    }
    println!(
        "incremental sets:{} dels:{} gets:{}, took {:?}",
        n_sets,
        n_dels,
        n_gets,
        start.elapsed()
    );
}

// Short random walk from root, return the payload it stops at.
fn pick_existing(rng: &mut SmallRng, index: &RbTree<u64, u64>) -> u64 {
    let (mut key, mut cursor) = (0, index.root());
    while let Some(id) = cursor {
        key = index.get(id).cloned().unwrap_or(key);
        cursor = match rng.gen::<bool>() {
            true => index.predecessor(id).filter(|_| rng.gen::<u8>() < 16),
            false => index.successor(id).filter(|_| rng.gen::<u8>() < 16),
        };
    }
    key
}
