use rand::seq::SliceRandom;
use rand::Rng;

use super::{Input, Outcome};

pub const CHOICES: usize = 4;

struct Question {
    prompt: &'static str,
    choices: [&'static str; CHOICES],
    answer: usize,
}

static QUESTIONS: &[Question] = &[
    Question {
        prompt: "Which planet is closest to the sun?",
        choices: ["Venus", "Mercury", "Mars", "Earth"],
        answer: 1,
    },
    Question {
        prompt: "How many legs does a spider have?",
        choices: ["6", "8", "10", "12"],
        answer: 1,
    },
    Question {
        prompt: "What is the largest ocean on Earth?",
        choices: ["Atlantic", "Indian", "Arctic", "Pacific"],
        answer: 3,
    },
    Question {
        prompt: "Which of these is a primary color of light?",
        choices: ["Green", "Orange", "Purple", "Pink"],
        answer: 0,
    },
    Question {
        prompt: "What do bees collect from flowers?",
        choices: ["Pollen and nectar", "Dew", "Seeds", "Leaves"],
        answer: 0,
    },
    Question {
        prompt: "Which instrument has 88 keys?",
        choices: ["Organ", "Accordion", "Piano", "Harpsichord"],
        answer: 2,
    },
    Question {
        prompt: "What is the capital of Japan?",
        choices: ["Osaka", "Kyoto", "Tokyo", "Nagoya"],
        answer: 2,
    },
    Question {
        prompt: "How many continents are there?",
        choices: ["5", "6", "7", "8"],
        answer: 2,
    },
];

/// One multiple-choice question sampled from the static catalog.
#[derive(Debug)]
pub struct Trivia {
    question: &'static Question,
}

impl std::fmt::Debug for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Question")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

impl Trivia {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            question: QUESTIONS.choose(rng).expect("question catalog is never empty"),
        }
    }

    pub fn prompt(&self) -> &'static str {
        self.question.prompt
    }

    pub fn choices(&self) -> &[&'static str; CHOICES] {
        &self.question.choices
    }

    pub(crate) fn answer(&self) -> usize {
        self.question.answer
    }

    pub(super) fn submit(&mut self, input: &Input) -> Option<Outcome> {
        let Input::Answer(index) = input else {
            return None;
        };
        Some(Outcome {
            success: *index == self.question.answer,
            score: None,
        })
    }
}
