//! `struct-bridge`: runs the layout demos from the command line.
//!
//! Usage:
//!   struct-bridge demo-a [--callback naive|one-way|two-way|naive-two-way|all] [--no-check]
//!   struct-bridge demo-b [--mode typed|opaque|opaque-set-int|tagged|all]
//!   struct-bridge layout
//!   struct-bridge header > c_src/struct_bridge_layout.h

use std::os::raw::c_int;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use struct_bridge::config::{log_filter, Cli, Command, DemoACallback, DemoBMode, DemoBRun};
use struct_bridge::demo_a::{self, NaiveStructA, StructA};
use struct_bridge::demo_b::{self, NaiveStructB, StructB};
use struct_bridge::header::render_c_header;
use struct_bridge::layout::{verify_layout, FixedLayout};
use struct_bridge::native;

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(log_filter(cli.verbose))
        .parse_default_env()
        .init();

    match cli.command {
        Command::DemoA { callback, no_check } => run_demo_a(callback, !no_check),
        Command::DemoB { mode } => {
            run_demo_b(mode);
            Ok(())
        }
        Command::Layout => print_layouts(),
        Command::Header => {
            print!("{}", render_c_header(&[&StructA::LAYOUT, &StructB::LAYOUT]));
            Ok(())
        }
    }
}

fn banner(title: &str) {
    println!("{}", format!("=== {title} ===").bold());
}

fn run_demo_a(callback: DemoACallback, check_on_return: bool) -> Result<()> {
    for (name, cb) in callback.selected() {
        banner(&format!("Demo A: {name} callback"));
        let rc = demo_a::use_callback(Some(cb), c_int::from(check_on_return));
        if rc != 0 {
            bail!("use_callback returned {rc} for the {name} callback");
        }
        println!();
    }
    Ok(())
}

fn run_demo_b(mode: DemoBMode) {
    for (name, run) in mode.selected() {
        banner(&format!("Demo B: {name} callback"));
        match run {
            DemoBRun::Typed(cb) => demo_b::invoke_with_callback(Some(cb)),
            DemoBRun::Opaque(cb) => demo_b::invoke_with_callback_opaque(Some(cb)),
            DemoBRun::Tagged(cb) => demo_b::invoke_with_callback_tagged(Some(cb)),
        }
        println!();
    }
}

fn print_layout<T: FixedLayout>() -> Result<()> {
    let layout = T::LAYOUT;
    println!(
        "{} v{} ({}): {} bytes, align {}, {} bytes padding, tag {}",
        layout.name.bold(),
        layout.version,
        layout.packing,
        layout.size(),
        layout.align(),
        layout.padding(),
        layout.tag()
    );
    for slot in layout.slots() {
        println!(
            "  {:>3}..{:<3} {} {}[{}]",
            slot.offset,
            slot.end(),
            slot.name(),
            slot.spec.ty,
            slot.spec.count
        );
    }
    verify_layout::<T>().with_context(|| format!("checking {} against rustc", layout.name))?;
    println!("  {}", "matches rustc".green());
    Ok(())
}

fn print_layouts() -> Result<()> {
    banner("Layouts");
    print_layout::<StructA>()?;
    native::struct_a()
        .check_against(&StructA::LAYOUT)
        .context("checking StructA against the C compiler")?;
    println!("  {}", "matches the C compiler".green());
    print_layout::<NaiveStructA>()?;

    print_layout::<StructB>()?;
    native::struct_b()
        .check_against(&StructB::LAYOUT)
        .context("checking StructB against the C compiler")?;
    println!("  {}", "matches the C compiler".green());
    print_layout::<NaiveStructB>()?;
    Ok(())
}
