//! μSim CLI
//!
//! Interactive operator console for the μSim kernel simulator.
//!
//! # Usage
//!
//! ```bash
//! # Run with the built-in system parameters
//! musim run
//!
//! # Run from a saved configuration, overriding the printer count
//! musim run --config sysgen.json --printers 2
//!
//! # Write a default configuration file to edit
//! musim init sysgen.json
//! ```
//!
//! At the `musim>` prompt, commands are the classic one-letter forms:
//! `A` admits a process, `t` terminates the CPU occupant, `p1`/`d2`/`c1`
//! request I/O on printer 1 / disk 2 / optical drive 1, the uppercase
//! forms `P1`/`D2`/`C1` signal the matching device interrupt, `K3` kills
//! process 3, and `S` dumps a snapshot.

use musim::config::SystemConfig;
use musim::console::OperatorConsole;
use musim::mm::{FrameEntry, MemoryManager};
use musim::pcb::{AccessMode, Pid, ProcessView};
use musim::sched::{DeviceClass, Scheduler};

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::{self, Write as _};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// μSim - Single-CPU kernel simulator for μOS
#[derive(Parser)]
#[command(name = "musim")]
#[command(author = "μOS Project")]
#[command(version)]
#[command(about = "Preemptive SJF scheduler and paged memory simulator", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive simulation
    Run(RunArgs),

    /// Write a default configuration file
    Init(InitArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total memory in memory units
    #[arg(long)]
    total_memory: Option<u64>,

    /// Page size in memory units (power of two)
    #[arg(long)]
    page_size: Option<u64>,

    /// Largest admissible process size
    #[arg(long)]
    max_process_size: Option<u64>,

    /// Number of printers
    #[arg(long)]
    printers: Option<usize>,

    /// Cylinder count per disk (comma-separated, one entry per disk)
    #[arg(long)]
    disks: Option<String>,

    /// Number of optical drives
    #[arg(long)]
    optical_drives: Option<usize>,

    /// Burst-history parameter α in [0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// Initial burst estimate in ms
    #[arg(long)]
    initial_burst: Option<f64>,
}

#[derive(Args)]
struct InitArgs {
    /// Output file
    output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    match cli.command {
        Commands::Run(args) => run_simulation(args)?,
        Commands::Init(args) => run_init(args)?,
    }

    Ok(())
}

/// Build the configuration and drive the command loop
fn run_simulation(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SystemConfig::load(path)?,
        None => SystemConfig::default(),
    };

    if let Some(v) = args.total_memory {
        config.total_memory = v;
    }
    if let Some(v) = args.page_size {
        config.page_size = v;
    }
    if let Some(v) = args.max_process_size {
        config.max_process_size = v;
    }
    if let Some(v) = args.printers {
        config.printers = v;
    }
    if let Some(list) = &args.disks {
        config.disk_cylinders = list
            .split(',')
            .map(|s| s.trim().parse::<u32>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid --disks list: {}", e))?;
    }
    if let Some(v) = args.optical_drives {
        config.optical_drives = v;
    }
    if let Some(v) = args.alpha {
        config.history_parameter = v;
    }
    if let Some(v) = args.initial_burst {
        config.initial_burst_estimate = v;
    }

    let mut sched = Scheduler::new(config)?;
    let mut console = StdinConsole;

    println!("μSim ready. Enter a command (h for help, q to quit).");
    loop {
        let Some(line) = read_trimmed("musim> ") else {
            break;
        };
        if line.is_empty() {
            continue;
        }
        match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Help) => print_help(),
            Some(cmd) => {
                if let Err(e) = dispatch(cmd, &mut sched, &mut console) {
                    error!("{e}");
                }
            }
            None => println!("unrecognized command: {line} (h for help)"),
        }
    }

    let stats = sched.stats();
    println!(
        "{} processes created, {} terminated, average CPU usage {:.2} ms",
        stats.processes_created, stats.terminated, stats.avg_cpu_usage
    );
    Ok(())
}

/// Write a default configuration file
fn run_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err("output file already exists. Use --force to overwrite.".into());
    }
    let config = SystemConfig::default();
    config.save(&args.output)?;
    println!("wrote default configuration to {}", args.output.display());
    Ok(())
}

/// One operator command, already parsed. Device indices are zero-based
/// here; the one-letter syntax counts devices from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Arrival,
    Terminate,
    Request(DeviceClass, usize),
    Interrupt(DeviceClass, usize),
    Kill(u32),
    Snapshot,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut chars = line.chars();
    let head = chars.next()?;
    let rest = chars.as_str().trim();

    let class_of = |c: char| match c {
        'p' | 'P' => Some(DeviceClass::Printer),
        'd' | 'D' => Some(DeviceClass::Disk),
        'c' | 'C' => Some(DeviceClass::Optical),
        _ => None,
    };

    match head {
        'A' if rest.is_empty() => Some(Command::Arrival),
        't' if rest.is_empty() => Some(Command::Terminate),
        'S' if rest.is_empty() => Some(Command::Snapshot),
        'h' | '?' if rest.is_empty() => Some(Command::Help),
        'q' if rest.is_empty() => Some(Command::Quit),
        'K' => rest.parse().ok().map(Command::Kill),
        'p' | 'd' | 'c' => {
            let number: usize = rest.parse().ok().filter(|&n| n >= 1)?;
            Some(Command::Request(class_of(head)?, number - 1))
        }
        'P' | 'D' | 'C' => {
            let number: usize = rest.parse().ok().filter(|&n| n >= 1)?;
            Some(Command::Interrupt(class_of(head)?, number - 1))
        }
        _ => None,
    }
}

fn dispatch(
    cmd: Command,
    sched: &mut Scheduler,
    console: &mut StdinConsole,
) -> musim::SimResult<()> {
    match cmd {
        Command::Arrival => {
            let size = console.process_size();
            let pid = sched.submit_process(size, console)?;
            println!("{pid} admitted");
        }
        Command::Terminate => {
            let pid = sched.complete_cpu_burst(console)?;
            println!("{pid} terminated");
        }
        Command::Request(class, index) => {
            sched.request_device_io(class, index, console)?;
        }
        Command::Interrupt(class, index) => {
            let pid = sched.complete_device_io(class, index, console)?;
            println!("{pid} finished {class} I/O");
        }
        Command::Kill(n) => {
            sched.kill(Pid(n), console)?;
        }
        Command::Snapshot => snapshot(sched),
        Command::Help | Command::Quit => {}
    }
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  A    admit a new process (size prompted)");
    println!("  t    CPU occupant finishes and terminates");
    println!("  p#   CPU occupant requests printer # I/O (likewise d#, c#)");
    println!("  P#   printer # interrupt: its queue head returns (likewise D#, C#)");
    println!("  K#   kill process #, wherever it is");
    println!("  S    snapshot (r ready, i devices, m memory, j job pool)");
    println!("  q    quit");
}

/// The `S` command: prompt for which view to dump
fn snapshot(sched: &Scheduler) {
    let Some(which) = read_trimmed("snapshot (r/i/m/j)> ") else {
        return;
    };
    match which.as_str() {
        "r" => snapshot_ready(sched),
        "i" => snapshot_devices(sched),
        "m" => snapshot_memory(sched),
        "j" => snapshot_job_pool(sched),
        other => println!("unknown snapshot view: {other}"),
    }
}

fn snapshot_ready(sched: &Scheduler) {
    match sched.cpu() {
        Some(view) => {
            println!("CPU:");
            print_process_header();
            print_process_row(&view);
        }
        None => println!("CPU: idle"),
    }
    let ready = sched.ready_queue();
    if ready.is_empty() {
        println!("ready queue: empty");
        return;
    }
    println!("ready queue (SJF order):");
    print_process_header();
    for view in &ready {
        print_process_row(view);
    }
}

fn snapshot_devices(sched: &Scheduler) {
    for class in [DeviceClass::Printer, DeviceClass::Disk, DeviceClass::Optical] {
        for index in 0..sched.device_count(class) {
            let Some(queue) = sched.device_queue(class, index) else {
                continue;
            };
            println!("{class} {} ({} waiting):", index + 1, queue.len());
            if !queue.is_empty() {
                print_process_header();
                for view in &queue {
                    print_process_row(view);
                }
            }
        }
    }
}

fn snapshot_memory(sched: &Scheduler) {
    let memory = sched.memory();
    println!(
        "frame table ({} frames, {} free):",
        memory.total_frames(),
        memory.free_count()
    );
    for (frame, entry) in memory.frame_table().iter().enumerate() {
        match entry {
            FrameEntry::Free => println!("  frame {frame:3}  free"),
            FrameEntry::Owned { pid, page } => {
                println!("  frame {frame:3}  {pid} page {page}")
            }
        }
    }
    let free: Vec<String> = memory.free_frames().iter().map(|f| f.to_string()).collect();
    println!("free-frame list (next first): [{}]", free.join(", "));

    let tables = page_table_lines(memory);
    if !tables.is_empty() {
        println!("page tables:");
        for line in tables {
            println!("  {line}");
        }
    }
}

/// One line per process holding memory: its page-to-frame mapping in
/// page order.
fn page_table_lines(memory: &MemoryManager) -> Vec<String> {
    let mut tables: BTreeMap<Pid, Vec<(u32, usize)>> = BTreeMap::new();
    for (frame, entry) in memory.frame_table().iter().enumerate() {
        if let FrameEntry::Owned { pid, page } = entry {
            tables.entry(*pid).or_default().push((*page, frame));
        }
    }
    tables
        .into_iter()
        .map(|(pid, mut pairs)| {
            pairs.sort_unstable();
            let mapping: Vec<String> = pairs
                .iter()
                .map(|(page, frame)| format!("page {page} -> frame {frame}"))
                .collect();
            format!("{pid}: {}", mapping.join(", "))
        })
        .collect()
}

fn snapshot_job_pool(sched: &Scheduler) {
    let pool = sched.memory().job_pool();
    if pool.is_empty() {
        println!("job pool: empty");
        return;
    }
    println!("job pool (largest first):");
    for (pid, size) in pool {
        println!("  {pid}  size {size}");
    }
}

fn print_process_header() {
    println!(
        "  {:<5} {:>6} {:>9} {:<12} {:>6} {:>3} {:>4} {:>9} {:>9} {:>9}",
        "PID", "size", "start", "file", "len", "r/w", "cyl", "total", "avg", "remaining"
    );
}

fn print_process_row(view: &ProcessView) {
    let cylinder = view
        .cylinder
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "  {:<5} {:>6} {:>9} {:<12} {:>6} {:>3} {:>4} {:>9.2} {:>9.2} {:>9.2}",
        view.pid.to_string(),
        view.size,
        format!("{:#x}", view.logical_start_address),
        view.filename,
        view.file_length,
        view.access.to_string(),
        cylinder,
        view.total_cpu_usage,
        view.avg_burst,
        view.expected_burst_remaining,
    );
}

/// Operator console backed by stdin prompts. Unparseable input is
/// re-prompted; EOF ends the simulation.
struct StdinConsole;

impl StdinConsole {
    fn process_size(&mut self) -> u64 {
        prompt_parsed("process size (memory units)? ")
    }
}

impl OperatorConsole for StdinConsole {
    fn burst_elapsed(&mut self, pid: Pid) -> f64 {
        prompt_parsed(&format!("how long did {pid} use the CPU (ms)? "))
    }

    fn filename(&mut self, pid: Pid) -> String {
        loop {
            let Some(line) = read_trimmed(&format!("filename for {pid}? ")) else {
                exit_on_eof();
            };
            if !line.is_empty() {
                return line;
            }
        }
    }

    fn file_length(&mut self, pid: Pid) -> u32 {
        prompt_parsed(&format!("file length for {pid}? "))
    }

    fn access_mode(&mut self, pid: Pid) -> AccessMode {
        loop {
            let Some(line) = read_trimmed(&format!("read or write for {pid} (r/w)? ")) else {
                exit_on_eof();
            };
            match line.as_str() {
                "r" => return AccessMode::Read,
                "w" => return AccessMode::Write,
                _ => println!("enter r or w"),
            }
        }
    }

    fn start_address(&mut self, pid: Pid) -> u32 {
        loop {
            let Some(line) = read_trimmed(&format!("start address for {pid} (hex)? ")) else {
                exit_on_eof();
            };
            let digits = line.strip_prefix("0x").unwrap_or(&line);
            match u32::from_str_radix(digits, 16) {
                Ok(addr) => return addr,
                Err(_) => println!("enter a hexadecimal address"),
            }
        }
    }

    fn cylinder(&mut self, disk: usize, cylinders: u32) -> u32 {
        prompt_parsed(&format!(
            "cylinder for disk {} (1-{cylinders})? ",
            disk + 1
        ))
    }
}

/// Prompt until the reply parses
fn prompt_parsed<T: std::str::FromStr>(message: &str) -> T {
    loop {
        let Some(line) = read_trimmed(message) else {
            exit_on_eof();
        };
        match line.parse() {
            Ok(value) => return value,
            Err(_) => println!("could not read that; try again"),
        }
    }
}

/// Print a prompt and read one trimmed line. None on EOF or I/O error.
fn read_trimmed(message: &str) -> Option<String> {
    print!("{message}");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn exit_on_eof() -> ! {
    println!();
    std::process::exit(0)
}
