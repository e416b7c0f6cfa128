use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use indicatif::{ProgressBar, ProgressStyle};

use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use connect4_arena::bitboard::{BitBoard, Outcome};
use connect4_arena::config::PlayerKind;
use connect4_arena::evaluator::Value;
use connect4_arena::game::run_match;
use connect4_arena::player::Player;
use connect4_arena::solver::{NMoveSolver, SimpleNMoveSolver, TranspositionSolver};
use connect4_arena::tactical::{blocking_move, winning_move};
use connect4_arena::WIDTH;

mod display;

#[derive(Parser, Debug)]
#[command(name = "connect4", version, about = "Play, pit and inspect Connect 4 players")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a game in the terminal
    Play {
        /// Player 1: `human` or a player specification such as `tt:8`
        #[arg(long, default_value = "human")]
        first: Seat,

        /// Player 2: `human` or a player specification such as `mcts:2000`
        #[arg(long, default_value = "tt:8")]
        second: Seat,
    },
    /// Play many games between two players and report the score of the first
    Bench {
        #[arg(long)]
        first: PlayerKind,

        #[arg(long)]
        second: PlayerKind,

        /// Number of games, the first player starts every other one
        #[arg(short = 'g', long, default_value_t = 100)]
        games: usize,

        /// Seed for reproducible matches
        #[arg(short = 's', long)]
        seed: Option<u64>,
    },
    /// Ask a player for its move in a given position
    Analyze {
        /// Columns played so far, 1-indexed, e.g. `4453`
        #[arg(long, conflicts_with = "board", required_unless_present = "board")]
        moves: Option<String>,

        /// File holding a board in the textual layout
        #[arg(long)]
        board: Option<PathBuf>,

        #[arg(long, default_value = "tt:10")]
        player: PlayerKind,
    },
}

/// Who sits on one side of an interactive game
#[derive(Clone, Debug)]
enum Seat {
    Human,
    Computer(PlayerKind),
}

impl FromStr for Seat {
    type Err = connect4_arena::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("human") {
            Ok(Seat::Human)
        } else {
            s.parse::<PlayerKind>().map(Seat::Computer)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _logger = Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    match cli.command {
        Command::Play { first, second } => play(first, second),
        Command::Bench {
            first,
            second,
            games,
            seed,
        } => bench(first, second, games, seed),
        Command::Analyze {
            moves,
            board,
            player,
        } => {
            let board = match (moves, board) {
                (Some(moves), _) => BitBoard::from_moves(moves)?,
                (None, Some(path)) => std::fs::read_to_string(path)?.parse::<BitBoard>()?,
                (None, None) => return Err(anyhow!("either --moves or --board is required")),
            };
            analyze(&board, player)
        }
    }
}

fn read_human_move(board: &BitBoard) -> Result<usize> {
    let stdin = stdin();
    loop {
        print!("Move input > ");
        stdout().flush()?;
        let mut input_str = String::new();
        if stdin.read_line(&mut input_str)? == 0 {
            return Err(anyhow!("input closed"));
        }

        match input_str.trim().parse::<usize>() {
            Ok(column) if (1..=WIDTH).contains(&column) => {
                if board.playable(column - 1) {
                    return Ok(column - 1);
                }
                println!("Column {} is full", column);
            }
            _ => println!("Invalid column: {}", input_str.trim()),
        }
    }
}

fn play(first: Seat, second: Seat) -> Result<()> {
    println!("Welcome to Connect 4\n");

    let mut players = [first, second].map(|seat| match seat {
        Seat::Human => None,
        Seat::Computer(kind) => Some(kind.build(None)),
    });
    let both_computers = players.iter().all(Option::is_some);

    let mut board = BitBoard::new();
    loop {
        display::draw(&board)?;

        match board.outcome() {
            Outcome::InProgress => {}
            Outcome::Player1Win => {
                println!("Player 1 wins!");
                break;
            }
            Outcome::Player2Win => {
                println!("Player 2 wins!");
                break;
            }
            Outcome::Tie => {
                println!("Draw!");
                break;
            }
        }

        let seat = board.num_moves() % 2;
        let column = match &mut players[seat] {
            Some(player) => {
                println!("{} is thinking...", player.name());
                stdout().flush()?;

                // slow down play if both players are computers
                if both_computers {
                    std::thread::sleep(std::time::Duration::new(1, 0));
                }
                let column = player.choose_move(&board)?;
                println!("Player {} plays {}", seat + 1, column + 1);
                column
            }
            None => read_human_move(&board)?,
        };

        if let Err(err) = board.play(column) {
            println!("{}", err);
        }
    }
    Ok(())
}

fn bench(first: PlayerKind, second: PlayerKind, games: usize, seed: Option<u64>) -> Result<()> {
    let progress = ProgressBar::new(games as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Playing {pos}/{len} games: {bar:40.cyan/blue} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );

    let start = Instant::now();
    let result = run_match(&first, &second, games, seed, || progress.inc(1))?;
    progress.finish();

    println!(
        "{} vs {} over {} games in {:.1}s",
        first,
        second,
        result.games(),
        start.elapsed().as_secs_f64()
    );
    println!(
        "wins: {}, losses: {}, ties: {}, win rate: {:.1}%",
        result.wins,
        result.losses,
        result.ties,
        100.0 * result.win_rate()
    );
    Ok(())
}

fn describe(value: Value, board: &BitBoard) {
    let player = if board.num_moves() % 2 == 0 { 1 } else { 2 };
    match value {
        Value::Win(ply) => println!("Player {} can force a win by ply {}.", player, ply),
        Value::Loss(ply) => println!("Player {} can force a win by ply {}.", 3 - player, ply),
        Value::Score(score) => {
            println!("No forced result within the horizon, estimate {:.1}", score)
        }
    }
}

fn analyze(board: &BitBoard, player: PlayerKind) -> Result<()> {
    println!("{}", board);
    if board.outcome().is_terminal() {
        println!("The game is over: {:?}", board.outcome());
        return Ok(());
    }
    if let Some(column) = winning_move(board) {
        println!("Column {} wins on the spot", column + 1);
    }
    if let Some(column) = blocking_move(board) {
        println!("Column {} must be blocked", column + 1);
    }

    let start = Instant::now();
    let column = match player {
        PlayerKind::Simple(depth) => {
            let (value, column) = SimpleNMoveSolver::new(depth).solve(board)?;
            describe(value, board);
            column
        }
        PlayerKind::NMove(depth) => {
            let (value, column) = NMoveSolver::new(depth).solve(board)?;
            describe(value, board);
            column
        }
        PlayerKind::Transposition(depth) => {
            let (value, column) = TranspositionSolver::new(depth).solve(board)?;
            describe(value, board);
            column
        }
        other => other.build(None).choose_move(board)?,
    };
    println!(
        "Best move for {}: {} ({:.3}s)",
        player,
        column + 1,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
