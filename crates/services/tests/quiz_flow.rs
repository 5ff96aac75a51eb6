use std::sync::{Arc, Mutex};
use std::time::Duration;

use campaign_core::model::{CampaignRules, Catalog, Question, UnitDef};
use campaign_core::time::fixed_clock;
use services::{
    AppServices, CampaignError, CampaignEvent, CampaignObserver, CampaignSetup, ContinueOutcome,
    QuizConfig, QuizError, QuizState, QuizView, Scene, SceneLoader, SubmitOutcome,
};
use storage::repository::{InMemoryProgressStore, ProgressStore, Storage};

fn unit(name: &str, questions: usize) -> UnitDef {
    let questions = (0..questions)
        .map(|i| {
            Question::new(
                format!("{name} question {i}"),
                vec!["right".into(), "wrong".into()],
                0,
            )
            .unwrap()
        })
        .collect();
    UnitDef::new(name, "", format!("{name}Scene"), questions)
}

fn setup(questions_per_unit: usize) -> CampaignSetup {
    CampaignSetup {
        catalog: Catalog::new(vec![
            unit("Harbour", questions_per_unit),
            unit("Market", questions_per_unit),
            unit("Castle", questions_per_unit),
        ])
        .unwrap(),
        rules: CampaignRules::default(),
        quiz: QuizConfig::default(),
        clock: fixed_clock(),
    }
}

async fn app(store: &InMemoryProgressStore, setup: CampaignSetup) -> AppServices {
    let storage = Storage {
        progress: Arc::new(store.clone()),
    };
    AppServices::from_storage(storage, setup).await.unwrap()
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<CampaignEvent>>,
    scenes: Mutex<Vec<String>>,
}

impl CampaignObserver for Recorder {
    fn on_event(&self, event: &CampaignEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl SceneLoader for Recorder {
    fn load(&self, scene: &Scene) {
        self.scenes.lock().unwrap().push(scene.name().to_owned());
    }
}

fn attach(app: &AppServices) -> Arc<Recorder> {
    let recorder = Arc::new(Recorder::default());
    let observer: Arc<dyn CampaignObserver> = recorder.clone();
    let scenes: Arc<dyn SceneLoader> = recorder.clone();
    app.events().subscribe(&observer);
    app.events().attach_scene_loader(&scenes);
    recorder
}

fn question_number(view: Option<QuizView>) -> usize {
    match view {
        Some(QuizView::Question { number, .. }) => number,
        other => panic!("expected a question, got {other:?}"),
    }
}

#[tokio::test]
async fn four_correct_answers_unlock_exactly_the_next_unit() {
    let store = InMemoryProgressStore::new();
    let app = app(&store, setup(6)).await;
    let recorder = attach(&app);
    let quiz = app.quiz();
    let campaign = app.campaign();

    quiz.open(0).await.unwrap();
    for _ in 0..4 {
        assert!(quiz.submit(0).await.unwrap().is_accepted());
        quiz.continue_session().await.unwrap();
    }

    let state = campaign.snapshot().await;
    assert_eq!(state.score(), 40);
    assert_eq!(state.correct_answers_count(), 4);
    assert!(state.is_unlocked(1));

    // a fifth correct answer never reaches two units ahead
    assert_eq!(
        quiz.submit(0).await.unwrap(),
        SubmitOutcome::Correct {
            score: 50,
            unlocked: None
        }
    );
    assert!(!campaign.is_unlocked(2).await);

    let unlocks: Vec<_> = recorder
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, CampaignEvent::Unlocked { .. }))
        .cloned()
        .collect();
    assert_eq!(unlocks, vec![CampaignEvent::Unlocked { unit: 1 }]);

    let durable = store.reopen().unwrap();
    assert_eq!(durable.get_int_or("Unit_1_Unlocked", 0).await.unwrap(), 1);
    assert_eq!(durable.get_int_or("CurrentScore", 0).await.unwrap(), 50);
}

#[tokio::test]
async fn retry_leaves_the_persisted_cursor_alone() {
    let store = InMemoryProgressStore::new();
    let app = app(&store, setup(3)).await;
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    quiz.submit(0).await.unwrap();
    assert_eq!(
        quiz.continue_session().await.unwrap(),
        ContinueOutcome::Question { cursor: 1 }
    );
    let cursor_before = store
        .reopen()
        .unwrap()
        .get_int_or("Unit_0_QuestionIndex", -1)
        .await
        .unwrap();
    assert_eq!(cursor_before, 1);

    assert_eq!(quiz.submit(1).await.unwrap(), SubmitOutcome::Wrong { score: 5 });
    assert_eq!(
        quiz.continue_session().await.unwrap(),
        ContinueOutcome::Retry { cursor: 1 }
    );

    let cursor_after = store
        .reopen()
        .unwrap()
        .get_int_or("Unit_0_QuestionIndex", -1)
        .await
        .unwrap();
    assert_eq!(cursor_after, cursor_before);
    assert_eq!(question_number(quiz.view().await), 2);
}

#[tokio::test]
async fn last_question_completes_the_unit() {
    let store = InMemoryProgressStore::new();
    let app = app(&store, setup(2)).await;
    let recorder = attach(&app);
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    quiz.submit(0).await.unwrap();
    quiz.continue_session().await.unwrap();
    quiz.submit(0).await.unwrap();
    assert_eq!(
        quiz.continue_session().await.unwrap(),
        ContinueOutcome::Completed
    );

    let active = quiz.active_session().await.unwrap();
    assert_eq!(active.state, QuizState::Completed);
    assert!(app.campaign().is_completed(0).await);
    assert_eq!(
        recorder.scenes.lock().unwrap().as_slice(),
        ["HarbourScene", "MapScene"]
    );
    assert_eq!(
        store
            .reopen()
            .unwrap()
            .get_int_or("Unit_0_Completed", 0)
            .await
            .unwrap(),
        1
    );

    // a completed unit cannot be entered again
    assert!(matches!(
        quiz.open(0).await,
        Err(QuizError::Campaign(CampaignError::UnitCompleted { index: 0 }))
    ));
}

#[tokio::test]
async fn answers_during_feedback_are_ignored() {
    let store = InMemoryProgressStore::new();
    let app = app(&store, setup(3)).await;
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    assert!(quiz.submit(0).await.unwrap().is_accepted());
    assert_eq!(quiz.submit(0).await.unwrap(), SubmitOutcome::Ignored);
    assert_eq!(quiz.submit(1).await.unwrap(), SubmitOutcome::Ignored);
    assert_eq!(app.campaign().score().await, 10);
    assert!(matches!(quiz.back().await, Err(QuizError::AwaitingContinue)));
}

#[tokio::test]
async fn progress_resumes_after_restart() {
    let store = InMemoryProgressStore::new();
    {
        let app = app(&store, setup(3)).await;
        let quiz = app.quiz();
        quiz.open(0).await.unwrap();
        quiz.submit(0).await.unwrap();
        quiz.continue_session().await.unwrap();
        quiz.back().await.unwrap();
        assert!(quiz.active_session().await.is_none());
    }

    let restarted = app(&store.reopen().unwrap(), setup(3)).await;
    let view = restarted.quiz().open(0).await.unwrap();
    assert_eq!(question_number(Some(view)), 2);
    assert_eq!(restarted.campaign().score().await, 10);
}

#[tokio::test]
async fn reset_restores_campaign_start() {
    let store = InMemoryProgressStore::new();
    let app = app(&store, setup(2)).await;
    let quiz = app.quiz();
    let campaign = app.campaign();

    quiz.open(0).await.unwrap();
    for _ in 0..2 {
        quiz.submit(0).await.unwrap();
        quiz.continue_session().await.unwrap();
    }
    assert!(campaign.is_completed(0).await);

    campaign.reset().await;

    let state = campaign.snapshot().await;
    assert_eq!(state.score(), 0);
    assert_eq!(state.correct_answers_count(), 0);
    assert!(state.is_unlocked(0));
    assert!(state.units().iter().skip(1).all(|u| !u.unlocked));
    assert!(state.units().iter().all(|u| !u.completed && u.next_question_index == 0));

    let reloaded = app_over(&store.reopen().unwrap()).await;
    assert_eq!(reloaded.campaign().snapshot().await, state);
}

async fn app_over(store: &InMemoryProgressStore) -> AppServices {
    app(store, setup(2)).await
}

#[tokio::test(start_paused = true)]
async fn feedback_continues_automatically() {
    let store = InMemoryProgressStore::new();
    let setup = setup(3).with_quiz_config(
        QuizConfig::default().with_auto_continue(Some(Duration::from_millis(1500))),
    );
    let app = app(&store, setup).await;
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    quiz.submit(0).await.unwrap();
    assert!(quiz.has_pending_continue().await);

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(question_number(quiz.view().await), 2);
    assert!(!quiz.has_pending_continue().await);
}

#[tokio::test(start_paused = true)]
async fn manual_continue_cancels_the_scheduled_one() {
    let store = InMemoryProgressStore::new();
    let setup = setup(4).with_quiz_config(
        QuizConfig::default().with_auto_continue(Some(Duration::from_millis(1500))),
    );
    let app = app(&store, setup).await;
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    quiz.submit(0).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    quiz.continue_session().await.unwrap();
    quiz.submit(0).await.unwrap();

    // the first schedule would have fired here
    tokio::time::sleep(Duration::from_millis(600)).await;
    let active = quiz.active_session().await.unwrap();
    assert_eq!(active.state, QuizState::CorrectFeedback);
    assert_eq!(active.cursor, 1);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    let active = quiz.active_session().await.unwrap();
    assert_eq!(active.state, QuizState::Question);
    assert_eq!(active.cursor, 2);
}

#[tokio::test(start_paused = true)]
async fn reopening_a_unit_drops_the_old_schedule() {
    let store = InMemoryProgressStore::new();
    let setup = setup(3).with_quiz_config(
        QuizConfig::default().with_auto_continue(Some(Duration::from_millis(500))),
    );
    let app = app(&store, setup).await;
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    quiz.submit(1).await.unwrap();
    let first = quiz.active_session().await.unwrap().id;

    let view = quiz.open(0).await.unwrap();
    assert_eq!(question_number(Some(view)), 1);
    assert!(!quiz.has_pending_continue().await);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let active = quiz.active_session().await.unwrap();
    assert_ne!(active.id, first);
    assert_eq!(active.state, QuizState::Question);
    assert_eq!(app.campaign().score().await, 0);
}

#[tokio::test(start_paused = true)]
async fn reset_tears_down_the_open_session() {
    let store = InMemoryProgressStore::new();
    let setup = setup(3).with_quiz_config(
        QuizConfig::default().with_auto_continue(Some(Duration::from_millis(500))),
    );
    let app = app(&store, setup).await;
    let quiz = app.quiz();

    quiz.open(0).await.unwrap();
    assert!(quiz.submit(0).await.unwrap().is_accepted());
    assert!(quiz.has_pending_continue().await);

    app.reset().await;
    assert!(quiz.active_session().await.is_none());
    assert!(!quiz.has_pending_continue().await);

    // well past the cancelled continue
    tokio::time::sleep(Duration::from_secs(1)).await;
    let campaign = app.campaign();
    assert_eq!(campaign.next_question_index(0).await, Some(0));
    assert_eq!(campaign.score().await, 0);
    assert!(matches!(quiz.submit(0).await, Err(QuizError::NoActiveSession)));

    let durable = store.reopen().unwrap();
    assert_eq!(durable.get_int_or("Unit_0_QuestionIndex", -1).await.unwrap(), 0);
    assert_eq!(durable.get_int_or("CurrentScore", -1).await.unwrap(), 0);
}
