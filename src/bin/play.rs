use clap::Parser;
use duck_quiz::client::{HttpQuizBackend, QuizBackend};
use duck_quiz::controller::{Action, GameController, Phase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Play the trivia quiz in a terminal against a running quiz server.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Base URL of the quiz server.
    #[arg(long, default_value = "http://localhost:3000")]
    server: String,
    /// Topic to play. Lists the available topics when omitted.
    #[arg(long)]
    topic: Option<String>,
}

const HELP: &str = "[1-9] answer  [n] next  [h] hint  [e] explain  [q] quit  anything else: ask the duck";

fn parse_action(line: &str) -> Action {
    match line.trim() {
        "n" | "next" => Action::Advance,
        "h" | "hint" => Action::Hint,
        "e" | "explain" => Action::Explain,
        "q" | "quit" | "exit" => Action::Exit,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Action::SelectChoice(n - 1),
            _ => Action::ChatSend(other.to_string()),
        },
    }
}

fn render_question(game: &GameController) {
    let (Some(session), Some(label)) = (game.session(), game.progress_label()) else {
        return;
    };
    let Some(question) = session.question() else {
        return;
    };
    println!("\n{}  (score: {})", label, session.score());
    println!("{}", question.question);
    for (i, choice) in question.choices.iter().enumerate() {
        let marker = if session.last_user_answer_index() == Some(i) { '>' } else { ' ' };
        println!(" {}{}. {}", marker, i + 1, choice);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let args = Args::parse();
    let backend = HttpQuizBackend::new(&args.server)?;

    let Some(topic) = args.topic else {
        let bank = backend.fetch_bank().await?;
        println!("Available topics:");
        for name in bank.topic_names() {
            println!("  {}", name);
        }
        return Ok(());
    };

    let mut game = GameController::new();
    game.run(&backend, Action::Start { topic }).await;
    if let Some(alert) = game.take_alert() {
        eprintln!("{}", alert);
        return Ok(());
    }

    println!("{}", HELP);
    render_question(&game);

    let mut printed = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let action = parse_action(&line);
        let moves_on = matches!(action, Action::Advance | Action::SelectChoice(_));
        let exiting = action == Action::Exit;
        game.run(&backend, action).await;

        if exiting {
            break;
        }
        if let Phase::Ended(_) = game.phase() {
            if let Some((score, total)) = game.final_score() {
                println!("\nYour score: {} / {}", score, total);
            }
            break;
        }

        let log = game.chat_log();
        if log.len() < printed {
            printed = 0;
        }
        for entry in &log[printed..] {
            println!("{}: {}", entry.sender, entry.text);
        }
        printed = log.len();

        if moves_on {
            render_question(&game);
        }
    }
    Ok(())
}
