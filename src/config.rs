//! Command-line configuration for the `struct-bridge` binary.
//!
//! There is no config file; everything the demos can vary is a flag.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::demo_a::{self, VoidCallback};
use crate::demo_b::{self, OpaqueCallback, TaggedCallback, TypedCallback};

#[derive(Parser, Debug)]
#[command(name = "struct-bridge", version, about = "Struct layout and callback demos across the C ABI")]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hand a 1-byte-packed struct to callbacks as `void *`.
    DemoA {
        #[arg(long, value_enum, default_value = "all")]
        callback: DemoACallback,

        /// Skip the second dump after the callback returns.
        #[arg(long)]
        no_check: bool,
    },
    /// Hand a 2-byte-packed struct to callbacks as typed, untyped or tagged pointers.
    DemoB {
        #[arg(long, value_enum, default_value = "all")]
        mode: DemoBMode,
    },
    /// Print both descriptors and check them against the Rust and C compilers.
    Layout,
    /// Print the generated C header.
    Header,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoACallback {
    Naive,
    OneWay,
    TwoWay,
    NaiveTwoWay,
    All,
}

impl DemoACallback {
    /// The callbacks to run, in order, with their display names.
    pub fn selected(self) -> Vec<(&'static str, VoidCallback)> {
        use demo_a::callbacks::*;
        let all: [(&'static str, VoidCallback); 4] = [
            ("naive", naive_callback),
            ("one-way", one_way_callback),
            ("two-way", two_way_callback),
            ("naive-two-way", naive_two_way_callback),
        ];
        let wanted = match self {
            DemoACallback::Naive => "naive",
            DemoACallback::OneWay => "one-way",
            DemoACallback::TwoWay => "two-way",
            DemoACallback::NaiveTwoWay => "naive-two-way",
            DemoACallback::All => return all.to_vec(),
        };
        all.into_iter().filter(|(name, _)| *name == wanted).collect()
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoBMode {
    Typed,
    Opaque,
    OpaqueSetInt,
    Tagged,
    All,
}

/// One Demo B run: which entry point and which callback.
#[derive(Debug, Clone, Copy)]
pub enum DemoBRun {
    Typed(TypedCallback),
    Opaque(OpaqueCallback),
    Tagged(TaggedCallback),
}

impl DemoBMode {
    pub fn selected(self) -> Vec<(&'static str, DemoBRun)> {
        use demo_b::callbacks::*;
        let all: [(&'static str, DemoBRun); 5] = [
            ("typed", DemoBRun::Typed(typed_callback)),
            ("opaque", DemoBRun::Opaque(opaque_callback)),
            ("opaque-set-int", DemoBRun::Opaque(opaque_set_int_callback)),
            ("tagged", DemoBRun::Tagged(tagged_callback)),
            ("tagged", DemoBRun::Tagged(tagged_naive_callback)),
        ];
        let wanted = match self {
            DemoBMode::Typed => "typed",
            DemoBMode::Opaque => "opaque",
            DemoBMode::OpaqueSetInt => "opaque-set-int",
            DemoBMode::Tagged => "tagged",
            DemoBMode::All => return all.to_vec(),
        };
        all.into_iter().filter(|(name, _)| *name == wanted).collect()
    }
}

/// Log level for `-v` count.
pub fn log_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn demo_a_defaults_to_all_callbacks_with_check() {
        let cli = Cli::try_parse_from(["struct-bridge", "demo-a"]).unwrap();
        match cli.command {
            Command::DemoA { callback, no_check } => {
                assert_eq!(callback, DemoACallback::All);
                assert!(!no_check);
                assert_eq!(callback.selected().len(), 4);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn demo_b_mode_is_parsed() {
        let cli = Cli::try_parse_from(["struct-bridge", "-vv", "demo-b", "--mode", "opaque-set-int"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::DemoB { mode } => {
                let runs = mode.selected();
                assert_eq!(runs.len(), 1);
                assert!(matches!(runs[0].1, DemoBRun::Opaque(_)));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tagged_mode_runs_both_tagged_callbacks() {
        assert_eq!(DemoBMode::Tagged.selected().len(), 2);
        assert_eq!(DemoACallback::TwoWay.selected()[0].0, "two-way");
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(log_filter(0), LevelFilter::Warn);
        assert_eq!(log_filter(1), LevelFilter::Debug);
        assert_eq!(log_filter(7), LevelFilter::Trace);
    }
}
