//! Terminal tree rendering of question sets

use colored::Colorize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{Answer, Question, QuestionSet};

pub trait ToTermTree {
    fn to_term_tree(&self) -> Tree<String>;
}

impl ToTermTree for Question<'_> {
    fn to_term_tree(&self) -> Tree<String> {
        let root = format!(
            "{} [{}] ({}) {}",
            self.title().bold(),
            self.qid(),
            self.question_type(),
            self.label()
        );
        let subquestions = self.subquestions().map(|q| q.to_term_tree());
        let answers = self.answers().map(|a| a.to_term_tree());
        Tree::new(root).with_leaves(subquestions.chain(answers))
    }
}

impl ToTermTree for Answer<'_> {
    fn to_term_tree(&self) -> Tree<String> {
        Tree::new(format!("= {}: {}", self.code().cyan(), self.label()))
    }
}

impl ToTermTree for QuestionSet {
    #[instrument(level = "debug", skip(self))]
    fn to_term_tree(&self) -> Tree<String> {
        let root = format!("{} questions", self.len());
        Tree::new(root).with_leaves(self.iter().map(|q| q.to_term_tree()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnswerDef, QuestionDef, TreeBuilder};

    #[test]
    fn given_question_set_when_rendering_then_lists_children_in_order() {
        colored::control::set_override(false);
        let set = TreeBuilder::new()
            .build(vec![
                QuestionDef::new("2", "Q10", "L").with_answer(AnswerDef::new("5", "A1")),
                QuestionDef::new("1", "Q2", "M").with_subquestion(QuestionDef::new("3", "SQ1", "T")),
            ])
            .unwrap();

        let rendered = set.to_term_tree().to_string();

        let q2 = rendered.find("Q2 [1]").unwrap();
        let q10 = rendered.find("Q10 [2]").unwrap();
        assert!(q2 < q10);
        assert!(rendered.contains("SQ1 [3] (T) SQ1"));
        assert!(rendered.contains("= A1: A1"));
    }
}
