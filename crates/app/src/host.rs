//! Text-mode host: renders campaign events to stdout and reads player input.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use campaign_core::model::AnswerIndex;
use services::{
    AppServices, CampaignEvent, CampaignObserver, Notifier, ProgressSummary, QuizState,
    QuizView, Scene, SceneLoader,
};

/// Renders events and scene changes as terminal text.
#[derive(Debug, Default)]
pub struct TerminalHost;

impl TerminalHost {
    /// Attach a host to `app`; listeners stay attached while the `Arc` lives.
    pub fn attach(app: &AppServices) -> Arc<Self> {
        let host = Arc::new(Self);
        let observer: Arc<dyn CampaignObserver> = host.clone();
        let notifier: Arc<dyn Notifier> = host.clone();
        let scenes: Arc<dyn SceneLoader> = host.clone();
        app.events().subscribe(&observer);
        app.events().attach_notifier(&notifier);
        app.events().attach_scene_loader(&scenes);
        host
    }
}

impl CampaignObserver for TerminalHost {
    fn on_event(&self, event: &CampaignEvent) {
        match event {
            CampaignEvent::QuizStateChanged { view, .. } => print_view(view),
            CampaignEvent::ScoreChanged { score } => println!("  score: {score}"),
            CampaignEvent::Unlocked { unit } => println!("** unit {} unlocked! **", unit + 1),
            CampaignEvent::UnitCompleted { unit } => println!("** unit {} completed **", unit + 1),
            CampaignEvent::ProgressReset => println!("progress reset"),
            CampaignEvent::PersistenceFailed { message } => {
                eprintln!("warning: progress not saved ({message})");
            }
        }
    }
}

impl Notifier for TerminalHost {
    fn on_unlock(&self) {
        // terminal bell
        print!("\x07");
        std::io::stdout().flush().ok();
    }
}

impl SceneLoader for TerminalHost {
    fn load(&self, scene: &Scene) {
        tracing::debug!(scene = %scene, "scene change");
        if let Scene::Overview = scene {
            println!("-- back to the map --");
        }
    }
}

fn print_view(view: &QuizView) {
    match view {
        QuizView::Question {
            prompt,
            answers,
            number,
            total,
        } => {
            println!();
            println!("Question {number}/{total}: {prompt}");
            for (i, answer) in answers.iter().enumerate() {
                println!("  {}) {answer}", i + 1);
            }
            println!("[1-{}] answer  [b] back  [q] quit", answers.len());
        }
        QuizView::Feedback {
            message,
            continue_label,
            ..
        } => {
            println!("{message}");
            println!("[enter] {continue_label}");
        }
        QuizView::Completed { unit_name } => println!("{unit_name}: all questions answered"),
    }
}

pub fn print_summary(summary: &ProgressSummary) {
    println!(
        "Score: {}   Progress: {}/{}",
        summary.score, summary.completed, summary.total
    );
    for unit in &summary.units {
        let status = if unit.completed {
            "completed"
        } else if unit.unlocked {
            "open"
        } else {
            "locked"
        };
        println!(
            "  {}. {:<28} {:<9} {}/{}",
            unit.index + 1,
            unit.name,
            status,
            unit.next_question_index,
            unit.question_count
        );
    }
}

/// One line of player input during a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Answer(AnswerIndex),
    Continue,
    Back,
    Quit,
    Unknown,
}

impl Input {
    /// Answers are typed 1-based.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" | "c" | "n" => Input::Continue,
            "b" => Input::Back,
            "q" => Input::Quit,
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => Input::Answer(n - 1),
                _ => Input::Unknown,
            },
        }
    }
}

pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next line, `None` on end of input.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        print!("> ");
        std::io::stdout().flush()?;
        self.lines.next_line().await
    }
}

/// Interactive play until the player quits or input ends.
pub async fn play(
    app: &AppServices,
    mut unit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let _host = TerminalHost::attach(app);
    let quiz = app.quiz();
    let mut prompt = Prompt::stdin();

    loop {
        let chosen = match unit.take() {
            Some(chosen) => chosen,
            None => {
                print_summary(&app.campaign().progress_summary().await);
                println!("Pick a unit number, or [q] to quit");
                let Some(line) = prompt.next_line().await? else {
                    return Ok(());
                };
                match Input::parse(&line) {
                    Input::Answer(index) => index,
                    Input::Quit => return Ok(()),
                    _ => continue,
                }
            }
        };

        if let Err(err) = quiz.open(chosen).await {
            println!("{err}");
            continue;
        }

        loop {
            match quiz.active_session().await {
                Some(active) if active.state != QuizState::Completed => {}
                _ => break,
            }
            let Some(line) = prompt.next_line().await? else {
                quiz.close().await;
                return Ok(());
            };
            let result = match Input::parse(&line) {
                Input::Answer(answer) => quiz.submit(answer).await.map(|_| ()),
                Input::Continue => quiz.continue_session().await.map(|_| ()),
                Input::Back => match quiz.back().await {
                    Ok(()) => break,
                    Err(err) => Err(err),
                },
                Input::Quit => {
                    quiz.close().await;
                    return Ok(());
                }
                Input::Unknown => {
                    println!("type an answer number, enter, b or q");
                    Ok(())
                }
            };
            if let Err(err) = result {
                println!("{err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_parsing() {
        assert_eq!(Input::parse("2\n"), Input::Answer(1));
        assert_eq!(Input::parse(""), Input::Continue);
        assert_eq!(Input::parse(" b "), Input::Back);
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse("0"), Input::Unknown);
        assert_eq!(Input::parse("x"), Input::Unknown);
    }
}
