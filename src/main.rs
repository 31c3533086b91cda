use std::sync::Arc;

use chatgpt::{client::ChatGPT, config::ChatGPTEngine};
use chrono::Utc;
use dotenv::dotenv;
use lab_tutor::{
    config::Settings,
    lab::{
        self,
        scenario::{self, Scenario},
        session::{LabSession, Progress, Verdict},
        Lab, Step,
    },
    quiz::{
        ai_helper::QuizHelper, Difficulty, DifficultyFilter, Question, QuestionBank, QuestionKind,
        Quiz,
    },
    study::StudyGuide,
};
use log::{debug, info, warn};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup},
    utils::command::BotCommands,
};

type TutorDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    MainMenu,
    QuizReceiveDifficulty,
    QuizReceiveAmountOfQuestions {
        filter: DifficultyFilter,
    },
    Quiz {
        quiz: Quiz,
    },
    LabChoice,
    Lab {
        lab: usize,
        progress: Progress,
    },
    ScenarioChoice,
    StudySearch,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "start over.")]
    Start,
    #[command(description = "go back to the main menu.")]
    Menu,
    #[command(description = "show suggested commands for the current lab step.")]
    Hint,
    #[command(description = "restart the current lab from the first step.")]
    Restart,
    #[command(description = "show this text.")]
    Help,
}

/// Read-only content shared by every chat.
struct Content {
    settings: Settings,
    bank: QuestionBank,
    labs: Vec<Lab>,
    scenarios: Vec<Scenario>,
    study: StudyGuide,
    helper: Option<QuizHelper>,
}

type UserInfoStorage = std::sync::Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> HandlerResult {
    dotenv().ok();

    pretty_env_logger::init();
    log::info!("Starting lab tutor bot...");

    let settings = Settings::from_env()?;

    let storage: UserInfoStorage = SqliteStorage::open(&settings.dialogue_db.to_string_lossy(), Json)
        .await?
        .erase();
    info!("Dialogue storage opened at {}", settings.dialogue_db.display());

    let (bank, errors) = QuestionBank::load_all(&settings.question_files);
    if bank.is_empty() {
        warn!("No questions loaded, quizzes will be unavailable");
    }
    for err in &errors {
        warn!("Question source not loaded: {}", err);
    }
    info!("Question bank ready: {} questions", bank.len());

    let labs = lab::load_labs_or_empty(&settings.labs_file);
    let scenarios = scenario::load_scenarios_or_empty(&settings.scenarios_file);
    let study = StudyGuide::load(&settings.study_file);

    let helper = match &settings.chatgpt_api_key {
        Some(key) => {
            let mut gpt = ChatGPT::new(key)?;
            gpt.config.engine = ChatGPTEngine::Gpt35Turbo;
            gpt.config.timeout = std::time::Duration::from_secs(15);
            Some(QuizHelper::new(gpt, settings.personality))
        }
        None => {
            info!("CHATGPT_API_KEY is not set, explanations come from the question files only");
            None
        }
    };

    let content = Arc::new(Content {
        settings,
        bank,
        labs,
        scenarios,
        study,
        helper,
    });

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_command),
            )
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::MainMenu].endpoint(receive_menu_choice))
            .branch(dptree::case![State::QuizReceiveDifficulty].endpoint(receive_difficulty))
            .branch(
                dptree::case![State::QuizReceiveAmountOfQuestions { filter }]
                    .endpoint(receive_amount_of_questions),
            )
            .branch(dptree::case![State::Quiz { quiz }].endpoint(quiz_answer))
            .branch(dptree::case![State::LabChoice].endpoint(receive_lab_choice))
            .branch(dptree::case![State::Lab { lab, progress }].endpoint(lab_command))
            .branch(dptree::case![State::ScenarioChoice].endpoint(receive_scenario_choice))
            .branch(dptree::case![State::StudySearch].endpoint(receive_study_query)),
    )
    .dependencies(dptree::deps![storage, content])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const QUIZ: &str = "📝 Quiz";
const REVIEW: &str = "🔁 Review mistakes";
const LABS: &str = "🧪 Labs";
const SCENARIOS: &str = "📘 Scenarios";
const STUDY: &str = "🔎 Study";
const HISTORY: &str = "📊 History";
const CLEAR_REVIEW: &str = "🧹 Clear review list";
const CLEAR_HISTORY: &str = "🧹 Clear history";
const ALL_DIFFICULTIES: &str = "all";

// Telegram rejects messages longer than 4096 characters.
const MESSAGE_LIMIT: usize = 4000;
const MAX_STUDY_HITS: usize = 20;

fn main_menu() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(QUIZ), KeyboardButton::new(REVIEW)],
        vec![KeyboardButton::new(LABS), KeyboardButton::new(SCENARIOS)],
        vec![KeyboardButton::new(STUDY), KeyboardButton::new(HISTORY)],
        vec![
            KeyboardButton::new(CLEAR_REVIEW),
            KeyboardButton::new(CLEAR_HISTORY),
        ],
    ])
}

/// One button per title, prefixed with its 1-based position.
fn numbered_keyboard<'a>(titles: impl Iterator<Item = &'a str>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        titles
            .enumerate()
            .map(|(i, title)| vec![KeyboardButton::new(format!("{}. {}", i + 1, title))])
            .collect::<Vec<_>>(),
    )
}

/// Accepts either the full button text or just its leading number.
fn pick_numbered(text: &str, count: usize) -> Option<usize> {
    let number = text.trim().split('.').next()?.trim().parse::<usize>().ok()?;
    (number >= 1 && number <= count).then(|| number - 1)
}

/// Splits `text` into messages of at most `limit` bytes. Breaks between
/// lines where it can and inside over-long lines at char boundaries.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for line in text.lines() {
        let mut rest = line;
        loop {
            let room = if chunk.is_empty() {
                limit
            } else {
                limit.saturating_sub(chunk.len() + 1)
            };
            if rest.len() <= room {
                if !chunk.is_empty() {
                    chunk.push('\n');
                }
                chunk.push_str(rest);
                break;
            }
            if !chunk.is_empty() {
                chunks.push(std::mem::take(&mut chunk));
                continue;
            }
            let mut cut = limit;
            while !rest.is_char_boundary(cut) {
                cut -= 1;
            }
            if cut == 0 {
                cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
            }
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
        }
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

async fn send_long(bot: &Bot, chat_id: ChatId, text: &str) -> HandlerResult {
    for chunk in split_message(text, MESSAGE_LIMIT) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

async fn show_main_menu(bot: &Bot, dialogue: &TutorDialogue, chat_id: ChatId, text: &str) -> HandlerResult {
    bot.send_message(chat_id, text)
        .reply_markup(main_menu())
        .await?;
    dialogue.update(State::MainMenu).await?;
    Ok(())
}

const GREETING_TEXT: &str = "Hi! I'm your lab tutor. I can quiz you on networking, routing, hardware and web security, and walk you through hands-on CLI labs. What would you like to do?";
async fn start(bot: Bot, dialogue: TutorDialogue, msg: Message) -> HandlerResult {
    show_main_menu(&bot, &dialogue, msg.chat.id, GREETING_TEXT).await
}

async fn handle_command(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    cmd: Command,
    content: Arc<Content>,
) -> HandlerResult {
    match cmd {
        Command::Start => start(bot, dialogue, msg).await,
        Command::Menu => show_main_menu(&bot, &dialogue, msg.chat.id, "Main menu").await,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            Ok(())
        }
        Command::Hint | Command::Restart => {
            let Some(State::Lab { lab, progress }) = dialogue.get().await? else {
                bot.send_message(msg.chat.id, "Start a lab first.").await?;
                return Ok(());
            };
            let Some(current_lab) = content.labs.get(lab) else {
                return show_main_menu(&bot, &dialogue, msg.chat.id, "That lab is no longer available.").await;
            };
            let mut session = LabSession::resume(current_lab, progress);
            if let Command::Restart = cmd {
                session.restart();
                dialogue
                    .update(State::Lab {
                        lab,
                        progress: session.progress(),
                    })
                    .await?;
                bot.send_message(msg.chat.id, "Lab restarted.").await?;
            } else if let Some(step) = session.current_step() {
                let hint = if step.commands.is_empty() {
                    "No suggested commands for this step.".to_string()
                } else {
                    format!("Suggested commands:\n{}", step.commands.join("\n"))
                };
                bot.send_message(msg.chat.id, hint).await?;
                return Ok(());
            }
            show_lab_step(&bot, msg.chat.id, &session).await
        }
    }
}

async fn receive_menu_choice(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let learner_dir = content.settings.learner_dir(msg.chat.id.0);
    match msg.text() {
        Some(QUIZ) => {
            if content.bank.is_empty() {
                bot.send_message(msg.chat.id, "No questions are loaded right now.")
                    .await?;
                return Ok(());
            }
            let mut row: Vec<KeyboardButton> = Difficulty::ALL
                .iter()
                .map(|d| KeyboardButton::new(d.as_str()))
                .collect();
            row.push(KeyboardButton::new(ALL_DIFFICULTIES));
            bot.send_message(msg.chat.id, "Choose a difficulty")
                .reply_markup(KeyboardMarkup::new(vec![row]))
                .await?;
            dialogue.update(State::QuizReceiveDifficulty).await?;
        }
        Some(REVIEW) => {
            let review = content.settings.review_list(&learner_dir);
            if review.is_empty() {
                bot.send_message(
                    msg.chat.id,
                    "Your review list is empty. Questions you miss are added here.",
                )
                .await?;
                return Ok(());
            }
            let questions = review.resolve(&content.bank);
            if questions.is_empty() {
                bot.send_message(msg.chat.id, "Saved review questions could not be found in the current question files.")
                    .await?;
                return Ok(());
            }
            let quiz = Quiz::new(questions, content.settings.scoring, "review")
                .with_time_limit(content.settings.time_limit);
            bot.send_message(msg.chat.id, "Let's go over your mistakes!")
                .await?;
            ask_question(&bot, &dialogue, msg.chat.id, quiz).await?;
        }
        Some(LABS) => {
            if content.labs.is_empty() {
                bot.send_message(msg.chat.id, "No labs are available.").await?;
                return Ok(());
            }
            bot.send_message(msg.chat.id, "Choose a lab")
                .reply_markup(numbered_keyboard(content.labs.iter().map(|l| l.title.as_str())))
                .await?;
            dialogue.update(State::LabChoice).await?;
        }
        Some(SCENARIOS) => {
            if content.scenarios.is_empty() {
                bot.send_message(msg.chat.id, "No scenarios are available.")
                    .await?;
                return Ok(());
            }
            bot.send_message(msg.chat.id, "Choose a scenario")
                .reply_markup(numbered_keyboard(
                    content.scenarios.iter().map(|s| s.title.as_str()),
                ))
                .await?;
            dialogue.update(State::ScenarioChoice).await?;
        }
        Some(STUDY) => {
            bot.send_message(msg.chat.id, "Send a term or command to look up in the study guide.")
                .reply_markup(KeyboardRemove::new())
                .await?;
            dialogue.update(State::StudySearch).await?;
        }
        Some(HISTORY) => {
            let scores = content.settings.score_history(&learner_dir).load();
            let text = if scores.is_empty() {
                "No scores saved yet.".to_string()
            } else {
                scores
                    .iter()
                    .map(|s| {
                        format!(
                            "{} - {}: {}/{}",
                            s.time.format("%Y-%m-%d %H:%M"),
                            s.mode,
                            s.score,
                            s.total
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            send_long(&bot, msg.chat.id, &text).await?;
        }
        Some(CLEAR_REVIEW) => {
            content.settings.review_list(&learner_dir).clear();
            bot.send_message(msg.chat.id, "Review list cleared.").await?;
        }
        Some(CLEAR_HISTORY) => {
            content.settings.score_history(&learner_dir).clear();
            bot.send_message(msg.chat.id, "Score history cleared.").await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .reply_markup(main_menu())
                .await?;
        }
    }
    Ok(())
}

async fn receive_difficulty(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let filter = match msg.text().map(str::trim) {
        Some(ALL_DIFFICULTIES) => DifficultyFilter::All,
        Some(text) => match text.parse::<Difficulty>() {
            Ok(difficulty) => DifficultyFilter::Only(difficulty),
            Err(_) => {
                bot.send_message(msg.chat.id, "Please choose one of the difficulties")
                    .await?;
                return Ok(());
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please choose one of the difficulties")
                .await?;
            return Ok(());
        }
    };

    let available = content.bank.pool(filter).len();
    if available == 0 {
        bot.send_message(
            msg.chat.id,
            format!("No questions available for difficulty: {}", filter.label()),
        )
        .await?;
        return Ok(());
    }

    let mut amounts = vec![5, 10, content.settings.quiz_length];
    amounts.retain(|n| *n <= available);
    amounts.push(available);
    amounts.sort_unstable();
    amounts.dedup();
    let keyboard = KeyboardMarkup::new(
        amounts
            .iter()
            .map(|n| vec![KeyboardButton::new(n.to_string())])
            .collect::<Vec<_>>(),
    );
    bot.send_message(
        msg.chat.id,
        format!("How many questions? ({} available)", available),
    )
    .reply_markup(keyboard)
    .await?;
    dialogue
        .update(State::QuizReceiveAmountOfQuestions { filter })
        .await?;
    Ok(())
}

async fn receive_amount_of_questions(
    bot: Bot,
    dialogue: TutorDialogue,
    filter: DifficultyFilter,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let amount = match msg.text().map(|t| t.trim().parse::<usize>()) {
        Some(Ok(amount)) => amount,
        _ => {
            bot.send_message(msg.chat.id, "Please enter a number").await?;
            return Ok(());
        }
    };
    if amount == 0 {
        bot.send_message(msg.chat.id, "The number of questions can't be 0")
            .await?;
        return Ok(());
    }

    let questions = {
        let mut rng = rand::thread_rng();
        content.bank.sample(filter, amount, &mut rng)
    };
    if questions.is_empty() {
        return show_main_menu(&bot, &dialogue, msg.chat.id, "No questions available.").await;
    }
    let quiz = Quiz::new(questions, content.settings.scoring, filter.label())
        .with_time_limit(content.settings.time_limit);

    bot.send_message(msg.chat.id, "Great! Let's start the quiz!")
        .await?;
    ask_question(&bot, &dialogue, msg.chat.id, quiz).await
}

fn question_text(quiz: &Quiz, question: &Question, choices: &[String]) -> String {
    let mut text = format!(
        "Question {}/{} [{}]\n{}",
        quiz.current_question + 1,
        quiz.questions.len(),
        question.difficulty,
        question.text
    );
    match &question.kind {
        QuestionKind::Mcq { .. } => {}
        QuestionKind::Multiple { .. } => {
            for (i, choice) in choices.iter().enumerate() {
                text.push_str(&format!("\n{}. {}", i + 1, choice));
            }
            text.push_str("\n\nSelect every correct choice: reply with their numbers separated by commas.");
        }
        QuestionKind::Text { .. } => text.push_str("\n\nType your answer."),
        QuestionKind::Cli { .. } => text.push_str("\n\nType the command."),
    }
    if let Some(limit) = quiz.time_limit {
        text.push_str(&format!("\n⏱ {} seconds to answer.", limit));
    }
    text
}

/// Shows the current question and stores the quiz in the dialogue.
async fn ask_question(bot: &Bot, dialogue: &TutorDialogue, chat_id: ChatId, mut quiz: Quiz) -> HandlerResult {
    let choices = {
        let mut rng = rand::thread_rng();
        quiz.ask(Utc::now(), &mut rng)
    };
    let Some(choices) = choices else {
        return Ok(());
    };
    let Some(question) = quiz.current() else {
        return Ok(());
    };
    let text = question_text(&quiz, question, &choices);
    let markup: ReplyMarkup = match question.kind {
        QuestionKind::Mcq { .. } => KeyboardMarkup::new(
            choices
                .iter()
                .map(|c| vec![KeyboardButton::new(c.clone())])
                .collect::<Vec<_>>(),
        )
        .into(),
        _ => KeyboardRemove::new().into(),
    };

    bot.send_message(chat_id, text).reply_markup(markup).await?;
    dialogue.update(State::Quiz { quiz }).await?;
    Ok(())
}

async fn quiz_answer(
    bot: Bot,
    dialogue: TutorDialogue,
    mut quiz: Quiz,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let Some(reply) = msg.text() else {
        bot.send_message(msg.chat.id, "Please answer with text").await?;
        return Ok(());
    };
    let learner_dir = content.settings.learner_dir(msg.chat.id.0);
    let review = content.settings.review_list(&learner_dir);
    let Some(graded) = quiz.answer_and_record(reply, Utc::now(), &review) else {
        return finish_quiz(&bot, &dialogue, msg.chat.id, &quiz, &content).await;
    };
    // The answer is graded once even if sending the feedback below fails.
    dialogue.update(State::Quiz { quiz: quiz.clone() }).await?;

    if graded.correct {
        bot.send_message(msg.chat.id, format!("✅ Correct! Score: {}", quiz.score))
            .await?;
    } else {
        let verdict = if graded.timed_out {
            format!("⏱ Time is up! Correct answer: {}", graded.question.correct_answer())
        } else {
            format!("❌ Incorrect! Correct answer: {}", graded.question.correct_answer())
        };
        let explanation = explain(&bot, msg.chat.id, &content, &graded.question, reply).await;
        let text = match explanation {
            Some(explanation) => format!("{}\n\n{}", verdict, explanation),
            None => verdict,
        };
        send_long(&bot, msg.chat.id, &format!("{}\nScore: {}", text, quiz.score)).await?;
    }
    if graded.correct && !graded.question.explanation.is_empty() {
        bot.send_message(msg.chat.id, graded.question.explanation.as_str())
            .await?;
    }

    if quiz.is_finished() {
        return finish_quiz(&bot, &dialogue, msg.chat.id, &quiz, &content).await;
    }
    ask_question(&bot, &dialogue, msg.chat.id, quiz).await
}

/// The tutor's take on a wrong answer when one is configured, otherwise the
/// question's own explanation.
async fn explain(bot: &Bot, chat_id: ChatId, content: &Content, question: &Question, reply: &str) -> Option<String> {
    if let Some(helper) = &content.helper {
        // Only cosmetic, a failed chat action must not stop the reply.
        let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;
        match helper.explain_wrong_answer(question, reply).await {
            Ok(text) => return Some(text),
            Err(err) => warn!("Tutor explanation failed: {}", err),
        }
    }
    (!question.explanation.is_empty()).then(|| question.explanation.clone())
}

async fn finish_quiz(bot: &Bot, dialogue: &TutorDialogue, chat_id: ChatId, quiz: &Quiz, content: &Content) -> HandlerResult {
    let learner_dir = content.settings.learner_dir(chat_id.0);
    content
        .settings
        .score_history(&learner_dir)
        .record(quiz.score_record(Utc::now()));
    debug!("Quiz finished for chat {}: {}", chat_id.0, quiz.score);

    let summary = format!(
        "Quiz complete! Final score: {} ({} of {} correct, {:.1}%)\n{}",
        quiz.score,
        quiz.correct_answers,
        quiz.questions.len(),
        quiz.percentage(),
        quiz.performance().message()
    );
    send_long(bot, chat_id, &quiz.review_text()).await?;
    show_main_menu(bot, dialogue, chat_id, &summary).await
}

async fn receive_lab_choice(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let Some(index) = msg.text().and_then(|t| pick_numbered(t, content.labs.len())) else {
        bot.send_message(msg.chat.id, "Please choose one of the labs").await?;
        return Ok(());
    };
    let lab = &content.labs[index];
    let mut session = LabSession::new(lab);
    session.start();

    let mut intro = lab.title.clone();
    if !lab.description.is_empty() {
        intro.push_str(&format!("\n\n{}", lab.description));
    }
    if let Some(diagram) = &lab.diagram {
        let topology = diagram.describe();
        if !topology.is_empty() {
            intro.push_str(&format!("\n\nTopology:\n{}", topology));
        }
    }
    intro.push_str("\n\nSend one command per message. /hint shows suggested commands, /restart starts over, /menu leaves the lab.");
    bot.send_message(msg.chat.id, intro)
        .reply_markup(KeyboardRemove::new())
        .await?;

    if session.progress() == Progress::Complete {
        return show_main_menu(&bot, &dialogue, msg.chat.id, "This lab has no steps.").await;
    }
    dialogue
        .update(State::Lab {
            lab: index,
            progress: session.progress(),
        })
        .await?;
    show_lab_step(&bot, msg.chat.id, &session).await
}

fn step_text(index: usize, total: usize, step: &Step) -> String {
    let mut text = format!("Step {}/{}: {}", index + 1, total, step.title);
    if !step.description.is_empty() {
        text.push_str(&format!("\n{}", step.description));
    }
    text
}

async fn show_lab_step(bot: &Bot, chat_id: ChatId, session: &LabSession<'_>) -> HandlerResult {
    if let (Progress::InProgress(i), Some(step)) = (session.progress(), session.current_step()) {
        bot.send_message(chat_id, step_text(i, session.lab().steps.len(), step))
            .await?;
    }
    Ok(())
}

async fn lab_command(
    bot: Bot,
    dialogue: TutorDialogue,
    (lab, progress): (usize, Progress),
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let Some(current_lab) = content.labs.get(lab) else {
        return show_main_menu(&bot, &dialogue, msg.chat.id, "That lab is no longer available.").await;
    };
    let Some(entered) = msg.text() else {
        bot.send_message(msg.chat.id, "Please send the command as text")
            .await?;
        return Ok(());
    };

    let mut session = LabSession::resume(current_lab, progress);
    let step = session.current_step();
    let submission = session.submit(entered);
    debug!("Lab {} step {:?}: {:?}", lab, progress, submission.verdict);

    let mut output = submission.output.join("\n");
    if submission.verdict == Verdict::Rejected {
        if let (Some(helper), Some(step)) = (&content.helper, step) {
            match helper.hint_for_step(step, entered).await {
                Ok(hint) => output.push_str(&format!("\n\n💡 {}", hint)),
                Err(err) => warn!("Tutor hint failed: {}", err),
            }
        }
    }
    if !output.is_empty() {
        send_long(&bot, msg.chat.id, &output).await?;
    }

    match submission.verdict {
        Verdict::Accepted { completed: true } | Verdict::NotRunning => {
            show_main_menu(&bot, &dialogue, msg.chat.id, "🎉 You completed the lab!").await
        }
        Verdict::Accepted { completed: false } => {
            dialogue
                .update(State::Lab {
                    lab,
                    progress: session.progress(),
                })
                .await?;
            show_lab_step(&bot, msg.chat.id, &session).await
        }
        Verdict::Rejected => Ok(()),
    }
}

async fn receive_scenario_choice(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let Some(index) = msg
        .text()
        .and_then(|t| pick_numbered(t, content.scenarios.len()))
    else {
        bot.send_message(msg.chat.id, "Please choose one of the scenarios")
            .await?;
        return Ok(());
    };
    send_long(&bot, msg.chat.id, &content.scenarios[index].render()).await?;
    show_main_menu(&bot, &dialogue, msg.chat.id, "What next?").await
}

async fn receive_study_query(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    content: Arc<Content>,
) -> HandlerResult {
    let query = msg.text().unwrap_or_default();
    let Some(hits) = content.study.search(query) else {
        bot.send_message(msg.chat.id, "Enter a search term or command to find in the study guide.")
            .await?;
        return Ok(());
    };
    let text = if hits.count == 0 {
        format!("No matches for \"{}\"", query.trim())
    } else {
        let mut text = format!("Found {} matches for \"{}\":", hits.count, query.trim());
        for (line_no, line) in hits.lines.iter().take(MAX_STUDY_HITS) {
            text.push_str(&format!("\n{}: {}", line_no, line));
        }
        if hits.lines.len() > MAX_STUDY_HITS {
            text.push_str(&format!("\n… and {} more lines", hits.lines.len() - MAX_STUDY_HITS));
        }
        text
    };
    send_long(&bot, msg.chat.id, &text).await?;
    show_main_menu(&bot, &dialogue, msg.chat.id, "What next?").await
}
