use std::{
    cell::RefCell,
    env,
    fmt::Debug,
    rc::Rc,
    time::Instant,
};

use kestrel_common::{alloc::memory_stats, prelude::*};
use kestrel_logging::{get_logger, log_error, log_info, LogCategory, LogLevel};

pub const LOG_CAT : LogCategory = LogCategory::new("Testbench");

const BENCH_TEST_COUNT : u32 = 100;
const BENCH_STRING : &str = "My name is jeff";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Suite {
    Array,
    Function,
    Bench,
}

impl Suite {
    const ALL: [Suite; 3] = [Suite::Array, Suite::Function, Suite::Bench];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "array" => Some(Suite::Array),
            "function" => Some(Suite::Function),
            "bench" => Some(Suite::Bench),
            _ => None,
        }
    }
}

struct Options {
    suites: DynArray<Suite>,
    quiet:  bool,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options { suites: DynArray::new(), quiet: false };
    for arg in env::args().skip(1) {
        if arg == "--quiet" {
            options.quiet = true;
            continue;
        }

        match Suite::parse(&arg) {
            Some(suite) => if !options.suites.contains(&suite) {
                options.suites.push(suite);
            },
            None => return Err(format!("unknown argument '{arg}', expected 'array', 'function', 'bench' or '--quiet'")),
        }
    }

    if options.suites.is_empty() {
        options.suites.assign_array(Suite::ALL);
    }
    Ok(options)
}

fn log_arr<T: Debug, R: ReserveStrategy>(name: &str, arr: &DynArray<T, R>) {
    log_info!(LOG_CAT, "{name}");
    for elem in arr {
        log_info!(LOG_CAT, "    {elem:?}");
    }
    log_info!(LOG_CAT, "size: {}, capacity: {}", arr.len(), arr.capacity());
}

//--------------------------------------------------------------

fn array_suite(arg_str: &str) {
    log_info!(LOG_CAT, "Testing construction");
    let mut strings0 = DynArray::<String>::new();
    log_arr("strings0", &strings0);
    let strings1 = DynArray::<String>::from_elem(arg_str.to_string(), 4);
    log_arr("strings1", &strings1);
    let mut strings2 = dynarray!["Hello".to_string(), "World".to_string(), arg_str.to_string()];
    log_arr("strings2", &strings2);

    log_info!(LOG_CAT, "Testing copy and move");
    strings0.clone_from(&strings1);
    log_arr("strings0 (copied from strings1)", &strings0);
    let mut moved = strings0.take();
    log_arr("moved (taken from strings0)", &moved);
    log_arr("strings0", &strings0);
    moved.clear();

    log_info!(LOG_CAT, "Testing push and emplace_back");
    for i in 0..6 {
        strings2.push(format!("This is Pushed String #{i}"));
    }
    for i in 0..6 {
        strings2.emplace_back(|| format!("This is an Emplaced String #{i}"));
    }
    log_arr("strings2", &strings2);

    log_info!(LOG_CAT, "Testing pop");
    for _ in 0..3 {
        strings2.pop_back();
    }
    log_arr("strings2", &strings2);

    log_info!(LOG_CAT, "Testing insert");
    strings2.insert(0, arg_str.to_string());
    strings2.insert(0, "Inserted String".to_string());
    strings2.insert_array(0, ["Inserted String #1".to_string(), "Inserted String #2".to_string()]);
    strings2.insert(2, "Inserted String Again".to_string());
    let len = strings2.len();
    strings2.insert_array(len, ["Inserted String At End #1".to_string(), "Inserted String At End #2".to_string()]);
    log_arr("strings2", &strings2);

    log_info!(LOG_CAT, "Testing insert after reallocation");
    strings2.shrink_to_fit();
    strings2.insert(0, "Inserted String Reallocated".to_string());
    strings2.shrink_to_fit();
    strings2.insert_slice(2, &["Inserted String Again Reallocated #1".to_string(), "Inserted String Again Reallocated #2".to_string()]);
    log_arr("strings2", &strings2);

    log_info!(LOG_CAT, "Testing erase");
    strings2.erase(0);
    strings2.erase(2);
    strings2.erase_range(0..2);
    strings2.erase_range(4..7);
    let len = strings2.len();
    strings2.erase_range(len - 3..);
    log_arr("strings2", &strings2);

    log_info!(LOG_CAT, "Testing swap");
    strings0.swap(&mut strings2);
    log_arr("strings0", &strings0);
    log_arr("strings2", &strings2);
}

//--------------------------------------------------------------

struct Greeter {
    greeting: String,
    count:    u32,
}

impl Greeter {
    fn greet(&mut self, name: &'static str) -> String {
        self.count += 1;
        format!("{}, {name} (#{})", self.greeting, self.count)
    }

    fn greeting_len(&self, extra: usize) -> usize {
        self.greeting.len() + extra
    }
}

fn function_suite() {
    log_info!(LOG_CAT, "Testing plain functions and closures");
    let mut add = Function::<(i32, i32), i32>::from_fn(|a: i32, b: i32| a + b);
    let res = add.call(2, 3);
    log_info!(LOG_CAT, "add(2, 3) = {res} ({add:?})");

    let payload = [1u64; 8];
    let mut sum = Function::<(u64,), u64>::from_fn(move |x: u64| payload.iter().sum::<u64>() + x);
    let res = sum.call(4);
    log_info!(LOG_CAT, "sum(4) = {res} ({sum:?})");

    log_info!(LOG_CAT, "Testing member functions");
    let greeter = Rc::new(RefCell::new(Greeter { greeting: "Hello".to_string(), count: 0 }));
    let mut greet = Function::<(&'static str,), String>::from_fn(bind_member(&greeter, Greeter::greet));
    log_info!(LOG_CAT, "{}", greet.call("World"));
    let mut greet_copy = greet.clone();
    log_info!(LOG_CAT, "{}", greet_copy.call("Copy"));

    let shared = Rc::new(Greeter { greeting: "Hi".to_string(), count: 0 });
    let mut len = Function::<(usize,), usize>::from_fn(bind_const_member(&shared, Greeter::greeting_len));
    log_info!(LOG_CAT, "greeting_len(3) = {}", len.call(3));

    log_info!(LOG_CAT, "Testing assign, take and reset");
    let mut taken = sum.take();
    log_info!(LOG_CAT, "after take: source {sum:?}, destination {taken:?}");
    taken.swap(&mut sum);
    log_info!(LOG_CAT, "after swap: sum(0) = {}", sum.call(0));
    add.assign(|a: i32, b: i32| a * b);
    log_info!(LOG_CAT, "assigned mul(2, 3) = {}", add.call(2, 3));
    add.reset();
    log_info!(LOG_CAT, "after reset: {add:?}");
}

//--------------------------------------------------------------

fn time_ns<F: FnMut()>(mut f: F) -> u128 {
    let mut total = 0;
    for _ in 0..BENCH_TEST_COUNT {
        let start = Instant::now();
        f();
        total += start.elapsed().as_nanos();
    }
    total / BENCH_TEST_COUNT as u128
}

fn bench_suite() {
    const INSERT_ITERATIONS : usize = 1000;
    const PUSH_ITERATIONS : usize = 100_000;

    log_info!(LOG_CAT, "Insert at front (iterations={INSERT_ITERATIONS}, test count={BENCH_TEST_COUNT})");
    let vec_ns = time_ns(|| {
        let mut strings = Vec::new();
        for _ in 0..INSERT_ITERATIONS {
            strings.insert(0, BENCH_STRING.to_string());
        }
    });
    let arr_ns = time_ns(|| {
        let mut strings = DynArray::<String>::new();
        for _ in 0..INSERT_ITERATIONS {
            strings.insert(0, BENCH_STRING.to_string());
        }
    });
    log_info!(LOG_CAT, "Vec     : {vec_ns}ns");
    log_info!(LOG_CAT, "DynArray: {arr_ns}ns");

    log_info!(LOG_CAT, "Push (iterations={PUSH_ITERATIONS}, test count={BENCH_TEST_COUNT})");
    let vec_ns = time_ns(|| {
        let mut strings = Vec::new();
        for _ in 0..PUSH_ITERATIONS {
            strings.push(BENCH_STRING.to_string());
        }
    });
    let arr_ns = time_ns(|| {
        let mut strings = DynArray::<String>::new();
        for _ in 0..PUSH_ITERATIONS {
            strings.push(BENCH_STRING.to_string());
        }
    });
    log_info!(LOG_CAT, "Vec     : {vec_ns}ns");
    log_info!(LOG_CAT, "DynArray: {arr_ns}ns");

    log_info!(LOG_CAT, "Emplace back (iterations={PUSH_ITERATIONS}, test count={BENCH_TEST_COUNT})");
    let arr_ns = time_ns(|| {
        let mut strings = DynArray::<String>::new();
        for _ in 0..PUSH_ITERATIONS {
            strings.emplace_back(|| BENCH_STRING.to_string());
        }
    });
    log_info!(LOG_CAT, "DynArray: {arr_ns}ns");
}

//--------------------------------------------------------------

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(err) => {
            log_error!(LOG_CAT, "{err}");
            get_logger().flush();
            std::process::exit(1);
        },
    };

    let logger = get_logger();
    logger.set_log_to_console(true);
    if options.quiet {
        logger.set_max_level(LogLevel::Warning);
    }

    let arg_str = env::args().next().unwrap_or_default();
    for suite in &options.suites {
        match suite {
            Suite::Array => array_suite(&arg_str),
            Suite::Function => function_suite(),
            Suite::Bench => bench_suite(),
        }
    }

    let stats = memory_stats();
    log_info!(LOG_CAT, "Memory: {} live allocations ({} bytes), {} allocations, {} frees",
        stats.live_allocations, stats.live_bytes, stats.total_allocations, stats.total_frees);
    logger.flush();
}
