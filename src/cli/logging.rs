//! Output verbosity control for the estimar binary
//!
//! Report lines carry a required level; the level derived from the
//! `--quiet`/`--verbose` flags acts as a threshold that lines must pass.

/// Verbosity threshold, ordered from silent to chatty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Drop every report line
    Quiet,
    /// Standard report output
    Normal,
    /// Standard output plus per-component breakdowns
    Verbose,
}

impl LogLevel {
    /// Derive the threshold from the global CLI flags. `--quiet` wins
    /// when both flags are given.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Whether a line requiring `required` passes this threshold.
    pub fn allows(self, required: LogLevel) -> bool {
        self != Self::Quiet && required <= self
    }
}

/// Print a report line if the active threshold permits it.
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level.allows(required) {
        println!("{msg}");
    }
}
