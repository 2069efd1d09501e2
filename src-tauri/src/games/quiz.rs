//! Multiple-choice quiz: one pick per question, 10 XP per correct pick

use super::{SessionError, QUIZ_CORRECT_XP};
use crate::content::QuizQuestion;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<QuizQuestion>,
    current_index: usize,
    selected: Option<String>,
    score: u32,
}

/// Result of picking an option
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
    pub xp_awarded: u32,
}

/// What the quiz screen renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub question: Option<QuizQuestion>,
    pub question_number: usize,
    pub total: usize,
    pub selected: Option<String>,
    pub score: u32,
    pub complete: bool,
    pub score_display: String,
}

impl QuizSession {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            current_index: 0,
            selected: None,
            score: 0,
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn score_display(&self) -> String {
        format!("{} / {}", self.score, self.questions.len())
    }

    pub fn select(&mut self, option: &str) -> Result<QuizAnswer, SessionError> {
        if self.selected.is_some() {
            return Err(SessionError::AlreadyAnswered);
        }
        let question = self.current().ok_or(SessionError::Finished)?;

        let correct = question.is_correct(option);
        let answer = QuizAnswer {
            correct,
            correct_answer: question.correct_answer.clone(),
            explanation: question.explanation.clone(),
            xp_awarded: if correct { QUIZ_CORRECT_XP } else { 0 },
        };

        self.selected = Some(option.to_string());
        if correct {
            self.score += 1;
        }
        Ok(answer)
    }

    /// Move past an answered question
    pub fn next_question(&mut self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Finished);
        }
        if self.selected.is_none() {
            return Err(SessionError::NotAnswered);
        }
        self.current_index += 1;
        self.selected = None;
        Ok(())
    }

    pub fn restart(&mut self) {
        self.current_index = 0;
        self.selected = None;
        self.score = 0;
    }

    pub fn view(&self) -> QuizView {
        QuizView {
            question: self.current().cloned(),
            question_number: (self.current_index + 1).min(self.questions.len()),
            total: self.questions.len(),
            selected: self.selected.clone(),
            score: self.score,
            complete: self.is_complete(),
            score_display: self.score_display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(n: usize) -> QuizQuestion {
        QuizQuestion {
            question: format!("Question {n}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".to_string(),
            explanation: "Because a".to_string(),
        }
    }

    fn five_questions() -> QuizSession {
        QuizSession::new((1..=5).map(question).collect())
    }

    #[test]
    fn three_of_five_scores_thirty_xp() {
        let mut quiz = five_questions();
        let mut xp = 0;

        for pick in ["a", "b", "a", "c", "a"] {
            xp += quiz.select(pick).unwrap().xp_awarded;
            quiz.next_question().unwrap();
        }

        assert!(quiz.is_complete());
        assert_eq!(quiz.score_display(), "3 / 5");
        assert_eq!(xp, 30);
        assert!(quiz.view().question.is_none());
    }

    #[test]
    fn one_pick_per_question() {
        let mut quiz = five_questions();
        let answer = quiz.select("b").unwrap();
        assert!(!answer.correct);
        assert_eq!(answer.correct_answer, "a");
        assert_eq!(answer.explanation, "Because a");

        assert!(matches!(quiz.select("a"), Err(SessionError::AlreadyAnswered)));
        assert_eq!(quiz.score(), 0);
    }

    #[test]
    fn next_requires_an_answer() {
        let mut quiz = five_questions();
        assert!(matches!(quiz.next_question(), Err(SessionError::NotAnswered)));
    }

    #[test]
    fn restart_clears_counters() {
        let mut quiz = five_questions();
        quiz.select("a").unwrap();
        quiz.next_question().unwrap();
        quiz.restart();

        let view = quiz.view();
        assert_eq!(view.score, 0);
        assert_eq!(view.question_number, 1);
        assert_eq!(view.selected, None);
    }

    #[test]
    fn empty_quiz_is_immediately_complete() {
        let mut quiz = QuizSession::new(Vec::new());
        assert!(quiz.is_complete());
        assert_eq!(quiz.score_display(), "0 / 0");
        assert!(matches!(quiz.select("a"), Err(SessionError::Finished)));
    }
}
