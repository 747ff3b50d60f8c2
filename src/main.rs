//! Sliding-Block Puzzle Solver
//!
//! Solves Klotski-style boards: the 2x2 piece has to reach the exit while the
//! other rectangles slide out of its way. Reports the fewest moves or the
//! fewest piece turns under single-cell or multi-cell slides, locates the
//! saddle of a solution, cross-checks the optimum against a brute-force
//! search and summarizes the structure of the solution path.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use klotski::config::{BoardFile, ConfigError};
use klotski::geometry::Direction;
use klotski::pieces::{self, FreeMode, PRESETS};
use klotski::{analysis, grid, saddle, solver};
use klotski::{CostModel, Goal, MoveModel, Path, Puzzle, PuzzleError, SolveOptions};

/// Solves sliding-block puzzles and analyzes their solutions.
#[derive(Parser)]
#[command(name = "klotski")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Built-in board to load (see `klotski presets`).
    #[arg(long, global = true, conflicts_with = "board")]
    preset: Option<String>,

    /// TOML board file to load instead of a preset.
    #[arg(long, global = true)]
    board: Option<PathBuf>,

    /// What counts as one move.
    #[arg(long, global = true, value_enum, default_value_t = ModelArg::Single)]
    model: ModelArg,

    /// What the solution minimizes.
    #[arg(long, global = true, value_enum, default_value_t = CostArg::Moves)]
    cost: CostArg,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModelArg {
    /// Slide one piece by one cell.
    Single,
    /// Slide one piece any distance in one direction.
    Multi,
}

impl From<ModelArg> for MoveModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Single => MoveModel::SingleCell,
            ModelArg::Multi => MoveModel::MultiCellSlide,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CostArg {
    /// Every move costs one.
    Moves,
    /// Consecutive moves of one piece cost one together.
    Turns,
}

impl From<CostArg> for CostModel {
    fn from(arg: CostArg) -> Self {
        match arg {
            CostArg::Moves => CostModel::UnitMoveCount,
            CostArg::Turns => CostModel::TurnCount,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Find the minimum cost to the goal.
    Solve {
        /// Print every move of the solution.
        #[arg(long)]
        path: bool,
    },
    /// Locate the saddle state of a fewest-moves solution.
    Saddle,
    /// Compare the optimum with the brute-force search.
    Verify,
    /// Free-cell modes, phases and state-space statistics of a solution.
    Analyze,
    /// List the built-in boards.
    Presets,
    /// Write the selected board as a TOML file.
    Export {
        /// Destination file.
        file: PathBuf,
    },
}

/// A board ready to solve.
struct Loaded {
    name: String,
    file: BoardFile,
    puzzle: Puzzle,
    goal: Goal,
}

impl Loaded {
    fn from_file(name: String, file: BoardFile) -> Result<Self, ConfigError> {
        let puzzle = file.puzzle()?;
        let goal = file.goal();
        Ok(Self {
            name,
            file,
            puzzle,
            goal,
        })
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let options = SolveOptions::new(cli.model.into(), cli.cost.into());

    if let Some(Command::Presets) = cli.command {
        print!("{}", presets_report());
        return ExitCode::SUCCESS;
    }

    let loaded = match load(cli.preset.as_deref(), cli.board) {
        Ok(loaded) => loaded,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let report = match cli.command {
        Some(Command::Solve { path }) => solve_report(&loaded, options, path),
        Some(Command::Saddle) => saddle_report(&loaded, options.move_model),
        Some(Command::Verify) => {
            let (report, agrees) = match verify_report(&loaded, options) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Verification failed: {e}");
                    return ExitCode::from(2);
                }
            };
            print!("{report}");
            return if agrees {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
        Some(Command::Analyze) => analyze_report(&loaded, options),
        Some(Command::Export { file }) => {
            if let Err(e) = export(&loaded, &file) {
                eprintln!("Failed to write {}: {e}", file.display());
                return ExitCode::from(2);
            }
            println!("Wrote {}", file.display());
            return ExitCode::SUCCESS;
        }
        Some(Command::Presets) => unreachable!("handled before loading a board"),
        // default: solve and show the path
        None => solve_report(&loaded, options, true),
    };

    match report {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", loaded.name);
            ExitCode::from(2)
        }
    }
}

/// Logs to stderr; `RUST_LOG` overrides the default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Loads a board file, a named preset, or the reference board.
fn load(preset: Option<&str>, board: Option<PathBuf>) -> Result<Loaded, String> {
    if let Some(path) = board {
        let file = BoardFile::load(&path).map_err(|e| format!("{}: {e}", path.display()))?;
        let name = file
            .name
            .clone()
            .unwrap_or_else(|| path.display().to_string());
        return Loaded::from_file(name, file).map_err(|e| format!("{}: {e}", path.display()));
    }

    let preset = match preset {
        Some(name) => pieces::preset(name).ok_or_else(|| {
            let known: Vec<_> = PRESETS.iter().map(|p| p.name).collect();
            format!("Unknown preset '{name}'. Known presets: {}", known.join(", "))
        })?,
        None => PRESETS[0],
    };
    let name = format!("{} ({})", preset.name, preset.title);
    Loaded::from_file(name, BoardFile::from_preset(preset)).map_err(|e| e.to_string())
}

fn mode_letter(mode: Option<FreeMode>) -> char {
    mode.map_or('?', FreeMode::letter)
}

/// Piece name, arrow and slide distance, e.g. `羽↓` or `③→2`.
fn move_label(puzzle: &Puzzle, path: &Path, index: usize) -> String {
    let mv = path.steps()[index].mv;
    let name = &puzzle.pieces()[mv.piece].name;
    if mv.distance > 1 {
        format!("{name}{}{}", mv.direction.arrow(), mv.distance)
    } else {
        format!("{name}{}", mv.direction.arrow())
    }
}

fn presets_report() -> String {
    let mut output = String::new();
    for preset in PRESETS {
        let _ = writeln!(
            output,
            "{:<20} {}x{} {:>2} pieces  {}",
            preset.name,
            preset.board.width,
            preset.board.height,
            preset.pieces.len(),
            preset.title
        );
    }
    output
}

fn solve_report(
    loaded: &Loaded,
    options: SolveOptions,
    show_path: bool,
) -> Result<String, PuzzleError> {
    let puzzle = &loaded.puzzle;
    let mut output = format!(
        "{}, {} {}\n",
        loaded.name, options.move_model, options.cost_model
    );
    output.push_str(&grid::format_state(puzzle, puzzle.initial()));

    let outcome = klotski::solve(puzzle, puzzle.initial(), &loaded.goal, options)?;
    let Some(solution) = outcome.solution() else {
        let _ = writeln!(
            output,
            "Unreachable: no sequence of moves reaches {:?}",
            loaded.goal.anchor
        );
        return Ok(output);
    };

    let path = &solution.path;
    let _ = writeln!(output, "Minimum: {} {}", solution.cost, options.cost_model);
    let _ = writeln!(
        output,
        "Path: {} moves in {} turns ({} states explored)",
        path.len(),
        path.turn_count(),
        solution.explored
    );

    if show_path {
        let modes = analysis::path_modes(puzzle, path);
        let mut turn_number = 0;
        for index in 0..path.len() {
            let piece = path.steps()[index].mv.piece;
            let opens_turn = index == 0 || path.steps()[index - 1].mv.piece != piece;
            let marker = if opens_turn {
                turn_number += 1;
                format!("T{turn_number}")
            } else {
                "|".to_string()
            };
            let _ = writeln!(
                output,
                "{:>4}. {:<6} [{}] {}",
                index + 1,
                move_label(puzzle, path, index),
                mode_letter(modes[index]),
                marker
            );
        }
        output.push_str(&grid::format_state(puzzle, path.final_state()));
    }

    Ok(output)
}

fn saddle_report(loaded: &Loaded, model: MoveModel) -> Result<String, PuzzleError> {
    let puzzle = &loaded.puzzle;
    let mut output = format!("{}, {}\n", loaded.name, model);

    let outcome =
        solver::shortest_path(puzzle, puzzle.initial(), model, |s| loaded.goal.is_met(s))?;
    let Some(solution) = outcome.into_solution() else {
        output.push_str("Unreachable: no path to analyze\n");
        return Ok(output);
    };
    let path = solution.path;

    match saddle::analyze_saddle(puzzle, &path, model)? {
        Some(found) => {
            let _ = writeln!(
                output,
                "Saddle after move {} of {}: d+ = {}, d- = {}{}",
                found.index + 1,
                path.len(),
                found.forward,
                found.backward,
                if found.exact { "" } else { " (no exact split, midpoint)" }
            );
            output.push_str(&grid::format_state(puzzle, &found.state));
        }
        None => output.push_str("Start already meets the goal\n"),
    }
    Ok(output)
}

fn verify_report(
    loaded: &Loaded,
    options: SolveOptions,
) -> Result<(String, bool), PuzzleError> {
    let puzzle = &loaded.puzzle;
    let verification = klotski::verify(puzzle, puzzle.initial(), &loaded.goal, options)?;

    let show = |cost: Option<usize>| cost.map_or("unreachable".to_string(), |c| c.to_string());
    let canonical_explored = verification.canonical.solution().map_or(0, |s| s.explored);
    let mut output = format!(
        "{}, {} {}\n",
        loaded.name, options.move_model, options.cost_model
    );
    let _ = writeln!(
        output,
        "Canonical:   {} ({} nodes)",
        show(verification.canonical.cost()),
        canonical_explored
    );
    let _ = writeln!(
        output,
        "Brute force: {} ({} nodes)",
        show(verification.brute_force.distance),
        verification.brute_force.explored
    );
    let agrees = verification.agrees();
    output.push_str(if agrees { "Agree\n" } else { "MISMATCH\n" });
    Ok((output, agrees))
}

fn analyze_report(loaded: &Loaded, options: SolveOptions) -> Result<String, PuzzleError> {
    let puzzle = &loaded.puzzle;
    let mut output = format!(
        "{}, {} {}\n",
        loaded.name, options.move_model, options.cost_model
    );

    let outcome = klotski::solve(puzzle, puzzle.initial(), &loaded.goal, options)?;
    let Some(solution) = outcome.into_solution() else {
        output.push_str("Unreachable: no path to analyze\n");
        return Ok(output);
    };
    let path = solution.path;

    let counts = analysis::mode_counts(puzzle, &path);
    let _ = writeln!(
        output,
        "Free-cell modes: H={} V={} S={} ?={}",
        counts.horizontal, counts.vertical, counts.separated, counts.other
    );
    output.push_str("Mode transitions:\n");
    for ((from, to), count) in analysis::mode_transitions(puzzle, &path) {
        let _ = writeln!(output, "  {} -> {}: {}", mode_letter(from), mode_letter(to), count);
    }

    output.push_str("Phases:\n");
    let target_name = &puzzle.pieces()[0].name;
    for (number, phase) in analysis::phases(&path).iter().enumerate() {
        let moves: String = phase.target_moves.iter().map(|d| d.arrow()).collect();
        match phase.target_turn {
            Some(turn) => {
                let _ = writeln!(
                    output,
                    "  {:>2}: {} filler turns, then {target_name}{moves} (turn {})",
                    number + 1,
                    phase.filler_turns,
                    turn + 1
                );
            }
            None => {
                let _ = writeln!(
                    output,
                    "  {:>2}: {} filler turns (trailing)",
                    number + 1,
                    phase.filler_turns
                );
            }
        }
    }

    // blocker in slot 1, corridor under the target's goal columns
    if puzzle.num_pieces() > 1 {
        let width = puzzle.shape(0).0 as i32;
        let corridor = loaded.goal.anchor.0..loaded.goal.anchor.0 + width;
        let descent = if loaded.goal.anchor.1 < puzzle.initial()[0].1 {
            Direction::Down
        } else {
            Direction::Up
        };
        let markers = analysis::phase_markers(puzzle, &path, 1, corridor, descent);
        let show = |step: Option<usize>| step.map_or("never".to_string(), |s| (s + 1).to_string());
        let _ = writeln!(
            output,
            "Markers: {} first moves at {}, corridor opens at {}, {} first moves {} at {}",
            puzzle.pieces()[1].name,
            show(markers.blocker_first_move),
            show(markers.corridor_open),
            target_name,
            descent.arrow(),
            show(markers.target_descends)
        );
    }
    let _ = writeln!(
        output,
        "Target stuck after {} of {} moves",
        analysis::stuck_steps(puzzle, &path),
        path.len()
    );

    let map = solver::distance_map(puzzle, puzzle.initial(), options.move_model)?;
    let _ = writeln!(
        output,
        "State space: {} states, eccentricity {}, {} free-cell sets",
        map.len(),
        map.eccentricity(),
        map.free_cell_sets()
    );
    Ok(output)
}

fn export(loaded: &Loaded, file: &std::path::Path) -> Result<(), ConfigError> {
    let text = loaded.file.to_toml_string()?;
    std::fs::write(file, text)?;
    Ok(())
}
