use chatgpt::prelude::*;
use chatgpt::types::CompletionResponse;
use log::debug;

use crate::lab::Step;
use crate::quiz::Question;

pub struct QuizHelper {
    personality: Personality,
    chat_gpt: ChatGPT,
}

impl QuizHelper {
    pub fn new(chat_gpt: ChatGPT, personality: Personality) -> Self {
        Self {
            personality,
            chat_gpt,
        }
    }

    pub async fn explain_wrong_answer(&self, question: &Question, given: &str) -> Result<String> {
        debug!("Generating explanation for question: {:?}", question.text);
        let explanation = if question.explanation.is_empty() {
            String::new()
        } else {
            format!("\nThe reference explanation is: {}", question.explanation)
        };
        let prompt = format!(
            "You are a tutor helping a student prepare for networking and security exams.
        The student was asked: \"{}\".
        The student answered \"{}\", but the correct answer is \"{}\".{}
        Explain briefly why the correct answer is right and what the student likely confused. Answer as {}. Limit: 3 sentences.",
            question.text,
            given,
            question.correct_answer(),
            explanation,
            self.personality.describe()
        );

        self.complete(&prompt).await
    }

    pub async fn hint_for_step(&self, step: &Step, given: &str) -> Result<String> {
        debug!("Generating hint for lab step: {:?}", step.title);
        let prompt = format!(
            "You are a tutor guiding a student through a hands-on CLI lab.
        The current step is \"{}\": {}
        The student typed \"{}\", which was not accepted.
        Give a hint that points toward the right command without spelling it out. Answer as {}. Limit: 2 sentences.",
            step.title,
            step.description,
            given,
            self.personality.describe()
        );

        self.complete(&prompt).await
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let response: CompletionResponse = self.chat_gpt.send_message(prompt).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        Ok(content)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Personality {
    /// A senior network engineer who has seen every outage.
    Engineer,
    #[default]
    Instructor,
    /// A friendly penetration tester.
    Hacker,
}

impl Personality {
    pub fn describe(&self) -> &'static str {
        match self {
            Personality::Engineer => "a seasoned network engineer who explains with war stories",
            Personality::Instructor => "a patient certification instructor",
            Personality::Hacker => "a friendly ethical hacker",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "engineer" => Some(Personality::Engineer),
            "instructor" => Some(Personality::Instructor),
            "hacker" => Some(Personality::Hacker),
            _ => None,
        }
    }
}
