//! Interactive CLI.
//!
//! A single-line prompt with a recognized verb set, history, and Tab
//! completion. This is glue, not core engineering: it exists so the
//! allocator, scheduler and filesystem have a human-operable front end,
//! and none of its internals are referenced by anything on the IRQ path.

use crate::{architecture, kernel};
use alloc::{string::String, vec::Vec};

const VERBS: &[&str] = &[
    "help", "time", "info", "clear", "ps", "spawn", "kill", "top", "memtest", "mem", "alloc",
    "pgalloc", "pgfree", "mmu", "ls", "cd", "pwd", "mkdir", "rmdir", "touch", "cat", "write",
    "rm", "history",
];

const HISTORY_CAPACITY: usize = 16;

const BACKSPACE: u8 = 0x7f;
const CTRL_C: u8 = 0x03;
const CTRL_L: u8 = 0x0c;
const CTRL_U: u8 = 0x15;
const TAB: u8 = 0x09;
const ESC: u8 = 0x1b;
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Blocks, spinning on `wfi`, until a byte arrives from the console.
fn read_byte() -> u8 {
    loop {
        if let Some(b) = kernel::Serial::read_byte(crate::board::serial()) {
            return b;
        }
        aarch64_cpu::asm::wfi();
    }
}

fn redraw(prompt: &str, line: &str) {
    crate::print!("\r{}{}\x1b[K", prompt, line);
}

/// Reads one line, with backspace, Ctrl-C/U/L, Tab-complete over
/// [`VERBS`], and Up/Down history recall.
fn read_line(prompt: &str, history: &[String]) -> String {
    let mut line = String::new();
    let mut history_cursor = history.len();

    crate::print!("{}", prompt);

    loop {
        match read_byte() {
            CR | LF => {
                crate::println!();
                return line;
            }
            BACKSPACE | 0x08 => {
                line.pop();
                redraw(prompt, &line);
            }
            CTRL_C => {
                crate::println!("^C");
                line.clear();
                return line;
            }
            CTRL_U => {
                line.clear();
                redraw(prompt, &line);
            }
            CTRL_L => {
                crate::print!("\x1b[2J\x1b[H");
                redraw(prompt, &line);
            }
            TAB => {
                let matches: Vec<&&str> = VERBS.iter().filter(|v| v.starts_with(line.as_str())).collect();
                if matches.len() == 1 {
                    line = String::from(*matches[0]);
                    redraw(prompt, &line);
                } else if matches.len() > 1 {
                    crate::println!();
                    for m in &matches {
                        crate::print!("{} ", m);
                    }
                    crate::println!();
                    redraw(prompt, &line);
                }
            }
            ESC => {
                // Arrow keys arrive as ESC '[' ('A' up | 'B' down).
                if read_byte() != b'[' {
                    continue;
                }
                match read_byte() {
                    b'A' => {
                        if history_cursor > 0 {
                            history_cursor -= 1;
                            line = history[history_cursor].clone();
                            redraw(prompt, &line);
                        }
                    }
                    b'B' => {
                        if history_cursor + 1 < history.len() {
                            history_cursor += 1;
                            line = history[history_cursor].clone();
                        } else {
                            history_cursor = history.len();
                            line.clear();
                        }
                        redraw(prompt, &line);
                    }
                    _ => {}
                }
            }
            b => {
                if (0x20..0x7f).contains(&b) {
                    line.push(b as char);
                    crate::print!("{}", b as char);
                }
            }
        }
    }
}

fn push_history(history: &mut Vec<String>, line: &str) {
    if line.is_empty() {
        return;
    }
    if history.len() == HISTORY_CAPACITY {
        history.remove(0);
    }
    history.push(String::from(line));
}

extern "C" fn counter_task() -> ! {
    for i in 0..20 {
        crate::log!("counter: {}", i);
        kernel::scheduler::sleep_ticks(1);
    }
    kernel::scheduler::exit();
}

extern "C" fn spinner_task() -> ! {
    const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
    for i in 0..20 {
        crate::log!("spinner: {}", FRAMES[i % FRAMES.len()]);
        kernel::scheduler::sleep_ticks(1);
    }
    kernel::scheduler::exit();
}

fn print_help() {
    crate::println!("Commands:");
    crate::println!("  help                 this message");
    crate::println!("  time                 ticks since boot");
    crate::println!("  info                 per-core status");
    crate::println!("  clear                clear the screen");
    crate::println!("  ps                   list tasks");
    crate::println!("  spawn                spawn the demo counter/spinner tasks");
    crate::println!("  kill <id>            kill a task");
    crate::println!("  top                  live task/tick monitor, any key to exit");
    crate::println!("  memtest              allocator smoke test");
    crate::println!("  mem                  heap/page allocator stats");
    crate::println!("  alloc <n>            allocate n bytes from the heap");
    crate::println!("  pgalloc              allocate one page");
    crate::println!("  pgfree <hex addr>    free one page");
    crate::println!("  mmu                  dump MMU configuration");
    crate::println!("  ls [path]            list a directory");
    crate::println!("  cd [path]            change directory");
    crate::println!("  pwd                  print working directory");
    crate::println!("  mkdir <path>         create a directory");
    crate::println!("  rmdir <path>         remove an empty directory");
    crate::println!("  touch <path>         create an empty file");
    crate::println!("  cat <path>           print a file's content");
    crate::println!("  write <path> <text>  overwrite a file's content");
    crate::println!("  rm <path>            remove a file");
    crate::println!("  history              show command history");
}

fn run_top() {
    crate::println!("top: press any key to exit");
    loop {
        crate::print!("\x1b[2J\x1b[H");
        crate::println!("tick {}  tasks run {}", kernel::scheduler::tick_count(), kernel::scheduler::tasks_run());
        kernel::core_state::print_cores();
        kernel::scheduler::print_tasks();
        for _ in 0..5 {
            kernel::scheduler::sleep_ticks(2);
            if kernel::Serial::read_byte(crate::board::serial()).is_some() {
                return;
            }
        }
    }
}

fn run_memtest() {
    let a = kernel::heap::alloc(32);
    let b = kernel::heap::alloc(64);
    crate::println!("memtest: alloc(32) = {:?}, alloc(64) = {:?}", a, b);
    if !a.is_null() {
        unsafe { kernel::heap::free(a) };
    }
    if !b.is_null() {
        unsafe { kernel::heap::free(b) };
    }
    crate::println!("memtest: freed both blocks");
}

fn dispatch(line: &str) {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else { return };
    let rest: Vec<&str> = parts.collect();

    match verb {
        "help" => print_help(),
        "time" => crate::println!("{} ticks", kernel::scheduler::tick_count()),
        "info" => kernel::core_state::print_cores(),
        "clear" => crate::print!("\x1b[2J\x1b[H"),
        "ps" => kernel::scheduler::print_tasks(),
        "spawn" => {
            match (
                kernel::scheduler::spawn("counter", counter_task),
                kernel::scheduler::spawn("spinner", spinner_task),
            ) {
                (Some(a), Some(b)) => crate::println!("spawned counter (id {}) and spinner (id {})", a, b),
                _ => crate::println!("spawn: task pool exhausted"),
            }
        }
        "kill" => match rest.first().and_then(|s| s.parse::<u32>().ok()) {
            Some(id) => match kernel::scheduler::kill(id) {
                Ok(()) => crate::println!("killed task {}", id),
                Err(e) => crate::println!("kill: {}", e),
            },
            None => crate::println!("usage: kill <id>"),
        },
        "top" => run_top(),
        "memtest" => run_memtest(),
        "mem" => {
            let stats = kernel::heap::stats();
            crate::println!(
                "heap: {} pages reserved, {}/{} bytes bump-used",
                stats.window_pages, stats.bump_used, stats.bump_capacity
            );
            crate::println!(
                "pages: {}/{} used",
                kernel::page::used_pages(),
                kernel::page::total_pages()
            );
        }
        "alloc" => match rest.first().and_then(|s| s.parse::<usize>().ok()) {
            Some(n) => {
                let p = kernel::heap::alloc(n);
                crate::println!("alloc({}) = {:?}", n, p);
            }
            None => crate::println!("usage: alloc <n>"),
        },
        "pgalloc" => match kernel::page::alloc() {
            Some(addr) => crate::println!("pgalloc = 0x{:X}", addr),
            None => crate::println!("pgalloc: out of pages"),
        },
        "pgfree" => match rest.first().and_then(|s| usize::from_str_radix(s.trim_start_matches("0x"), 16).ok()) {
            Some(addr) => {
                kernel::page::free(addr);
                crate::println!("freed 0x{:X}", addr);
            }
            None => crate::println!("usage: pgfree <hex addr>"),
        },
        "mmu" => architecture::mmu::dump_config(),
        "ls" => kernel::fs::ls(rest.first().copied().unwrap_or("")),
        "cd" => match kernel::fs::cd(rest.first().copied().unwrap_or("/")) {
            Ok(()) => {}
            Err(e) => crate::println!("{}", e),
        },
        "pwd" => crate::println!("{}", kernel::fs::pwd()),
        "mkdir" => match rest.first() {
            Some(p) => {
                if let Err(e) = kernel::fs::mkdir(p) {
                    crate::println!("{}", e);
                }
            }
            None => crate::println!("usage: mkdir <path>"),
        },
        "rmdir" => match rest.first() {
            Some(p) => {
                if let Err(e) = kernel::fs::rmdir(p) {
                    crate::println!("{}", e);
                }
            }
            None => crate::println!("usage: rmdir <path>"),
        },
        "touch" => match rest.first() {
            Some(p) => {
                if let Err(e) = kernel::fs::touch(p) {
                    crate::println!("{}", e);
                }
            }
            None => crate::println!("usage: touch <path>"),
        },
        "cat" => match rest.first() {
            Some(p) => match kernel::fs::read(p) {
                Ok(bytes) => crate::println!("{}", String::from_utf8_lossy(&bytes)),
                Err(e) => crate::println!("{}", e),
            },
            None => crate::println!("usage: cat <path>"),
        },
        "write" => match rest.split_first() {
            Some((path, words)) => {
                let mut content = String::new();
                for (i, w) in words.iter().enumerate() {
                    if i > 0 {
                        content.push(' ');
                    }
                    content.push_str(w);
                }
                if let Err(e) = kernel::fs::write(path, content.as_bytes()) {
                    crate::println!("{}", e);
                }
            }
            None => crate::println!("usage: write <path> <text>"),
        },
        "rm" => match rest.first() {
            Some(p) => {
                if let Err(e) = kernel::fs::rm(p) {
                    crate::println!("{}", e);
                }
            }
            None => crate::println!("usage: rm <path>"),
        },
        "" => {}
        other => crate::println!("unknown command: {}", other),
    }
}

/// Runs the interactive prompt forever. Never returns; this is the last
/// step of boot on core 0.
pub fn run() -> ! {
    crate::println!();
    crate::println!("kernel shell. Type 'help' for the command list.");

    let mut history: Vec<String> = Vec::new();
    loop {
        let prompt_path = kernel::fs::pwd();
        let prompt = alloc::format!("{}> ", prompt_path);
        let line = read_line(&prompt, &history);

        if line == "history" {
            for (i, cmd) in history.iter().enumerate() {
                crate::println!("{:4} {}", i + 1, cmd);
            }
            continue;
        }

        push_history(&mut history, &line);
        dispatch(&line);
    }
}
