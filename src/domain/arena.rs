use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

use crate::domain::data::DefinitionData;
use crate::domain::error::{DomainError, DomainResult};

/// Where a question hangs in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// Top-level question owned by the `QuestionSet`.
    Root,
    /// Sub-question of another question.
    Question(Index),
}

/// Question node stored in the arena.
#[derive(Debug)]
pub struct QuestionNode {
    qid: String,
    title: String,
    qtype: String,
    /// Definition fields without nested children
    raw: Map<String, Value>,
    parent: ParentRef,
    is_subquestion: bool,
    subquestions: Vec<Index>,
    subs_by_qid: HashMap<String, Index>,
    subs_by_title: HashMap<String, Index>,
    answers: Vec<Index>,
    answers_by_aid: HashMap<String, Index>,
    answers_by_code: HashMap<String, Index>,
}

/// Answer node stored in the arena.
#[derive(Debug)]
pub struct AnswerNode {
    aid: Option<String>,
    code: String,
    raw: Map<String, Value>,
    question: Index,
}

/// Root of a survey definition tree.
///
/// Holds top-level questions in presentation order, indexed by `qid` and
/// `title`. All nodes live in generational arenas; handles returned by
/// lookups borrow the set.
#[derive(Debug, Default)]
pub struct QuestionSet {
    questions: Arena<QuestionNode>,
    answers: Arena<AnswerNode>,
    roots: Vec<Index>,
    by_qid: HashMap<String, Index>,
    by_title: HashMap<String, Index>,
    /// Every question of the tree by qid
    all_by_qid: HashMap<String, Index>,
}

impl QuestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, raw))]
    pub(crate) fn insert_question(
        &mut self,
        qid: String,
        title: String,
        qtype: String,
        raw: Map<String, Value>,
        parent: ParentRef,
    ) -> DomainResult<Index> {
        if self.all_by_qid.contains_key(&qid) {
            return Err(DomainError::DuplicateQid(qid));
        }
        let node = QuestionNode {
            qid: qid.clone(),
            title: title.clone(),
            qtype,
            raw,
            parent,
            is_subquestion: matches!(parent, ParentRef::Question(_)),
            subquestions: Vec::new(),
            subs_by_qid: HashMap::new(),
            subs_by_title: HashMap::new(),
            answers: Vec::new(),
            answers_by_aid: HashMap::new(),
            answers_by_code: HashMap::new(),
        };
        let idx = self.questions.insert(node);
        self.all_by_qid.insert(qid.clone(), idx);

        let (list, by_qid, by_title) = match parent {
            ParentRef::Root => (&mut self.roots, &mut self.by_qid, &mut self.by_title),
            ParentRef::Question(parent_idx) => match self.questions.get_mut(parent_idx) {
                Some(p) => (&mut p.subquestions, &mut p.subs_by_qid, &mut p.subs_by_title),
                None => return Err(DomainError::CycleDetected(qid)),
            },
        };
        list.push(idx);
        by_qid.insert(qid, idx);
        if by_title.contains_key(&title) {
            warn!(title = %title, "duplicate sibling title, keeping first in index");
        } else {
            by_title.insert(title, idx);
        }
        Ok(idx)
    }

    #[instrument(level = "trace", skip(self, raw))]
    pub(crate) fn insert_answer(
        &mut self,
        question: Index,
        aid: Option<String>,
        code: String,
        raw: Map<String, Value>,
    ) -> Index {
        let idx = self.answers.insert(AnswerNode {
            aid: aid.clone(),
            code: code.clone(),
            raw,
            question,
        });
        if let Some(q) = self.questions.get_mut(question) {
            q.answers.push(idx);
            if let Some(aid) = aid {
                q.answers_by_aid.entry(aid).or_insert(idx);
            }
            if q.answers_by_code.contains_key(&code) {
                warn!(qid = %q.qid, code = %code, "duplicate answer code, keeping first in index");
            } else {
                q.answers_by_code.insert(code, idx);
            }
        }
        idx
    }

    fn question(&self, idx: Index) -> Option<Question<'_>> {
        self.questions.get(idx).map(|node| Question {
            set: self,
            idx,
            node,
        })
    }

    fn answer(&self, idx: Index) -> Option<Answer<'_>> {
        self.answers.get(idx).map(|node| Answer {
            set: self,
            idx,
            node,
        })
    }

    /// Number of top-level questions.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of questions and sub-questions in the whole tree.
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Top-level questions in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = Question<'_>> + '_ {
        self.roots.iter().filter_map(move |&idx| self.question(idx))
    }

    /// Every question, depth first, parents before their sub-questions.
    pub fn iter_depth_first(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Top-level question by qid, falling back to title.
    pub fn get(&self, key: &str) -> Option<Question<'_>> {
        self.by_qid
            .get(key)
            .or_else(|| self.by_title.get(key))
            .and_then(|&idx| self.question(idx))
    }

    /// Any question of the tree by qid.
    pub fn find(&self, qid: &str) -> Option<Question<'_>> {
        self.all_by_qid.get(qid).and_then(|&idx| self.question(idx))
    }

    /// Dig through nested questions: the first key selects a top-level
    /// question, each following key a sub-question of the previous one.
    pub fn path(&self, keys: &[&str]) -> Option<Question<'_>> {
        let (first, rest) = keys.split_first()?;
        let mut current = self.get(first)?;
        for key in rest {
            current = current.subquestion(key)?;
        }
        Some(current)
    }

    /// Question addressed by an export column name such as `Q1` or `Q1[SQ001]`.
    pub fn resolve_column(&self, column: &str) -> Option<Question<'_>> {
        let (base, rest) = match column.find('[') {
            Some(pos) => (&column[..pos], &column[pos..]),
            None => (column, ""),
        };
        let mut keys = vec![base];
        for segment in rest.split('[').skip(1) {
            keys.push(segment.strip_suffix(']')?);
        }
        self.path(&keys)
    }

    /// Length of the longest question chain.
    pub fn depth(&self) -> usize {
        self.iter().map(|q| q.depth()).max().unwrap_or(0)
    }
}

impl Serialize for QuestionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for question in self.iter() {
            seq.serialize_element(&question)?;
        }
        seq.end()
    }
}

impl DefinitionData for QuestionSet {
    type Item<'v> = Question<'v> where Self: 'v;

    fn lookup<'v>(&'v self, key: &str) -> Option<Question<'v>> {
        self.get(key)
    }
}

/// The parent of a question.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'a> {
    Root(&'a QuestionSet),
    Question(Question<'a>),
}

/// A direct child of a question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Child<'a> {
    Question(Question<'a>),
    Answer(Answer<'a>),
}

/// Borrowed handle to a question of a `QuestionSet`.
#[derive(Clone, Copy)]
pub struct Question<'a> {
    set: &'a QuestionSet,
    idx: Index,
    node: &'a QuestionNode,
}

impl<'a> Question<'a> {
    pub fn qid(&self) -> &'a str {
        &self.node.qid
    }

    pub fn title(&self) -> &'a str {
        &self.node.title
    }

    pub fn question_type(&self) -> &'a str {
        &self.node.qtype
    }

    pub fn is_subquestion(&self) -> bool {
        self.node.is_subquestion
    }

    pub fn raw(&self) -> &'a Map<String, Value> {
        &self.node.raw
    }

    /// Display text: `strings[0].question`, then `question`, then the title.
    pub fn label(&self) -> &'a str {
        label_from(&self.node.raw, "question").unwrap_or(&self.node.title)
    }

    pub fn root(&self) -> &'a QuestionSet {
        self.set
    }

    pub fn parent(&self) -> Parent<'a> {
        match self.node.parent {
            ParentRef::Root => Parent::Root(self.set),
            ParentRef::Question(idx) => match self.set.question(idx) {
                Some(q) => Parent::Question(q),
                None => Parent::Root(self.set),
            },
        }
    }

    pub fn subquestions(&self) -> impl Iterator<Item = Question<'a>> + 'a {
        let set = self.set;
        self.node
            .subquestions
            .iter()
            .filter_map(move |&idx| set.question(idx))
    }

    pub fn subquestion_count(&self) -> usize {
        self.node.subquestions.len()
    }

    pub fn answers(&self) -> impl Iterator<Item = Answer<'a>> + 'a {
        let set = self.set;
        self.node
            .answers
            .iter()
            .filter_map(move |&idx| set.answer(idx))
    }

    pub fn answer_count(&self) -> usize {
        self.node.answers.len()
    }

    /// Sub-question by qid, falling back to title.
    pub fn subquestion(&self, key: &str) -> Option<Question<'a>> {
        self.node
            .subs_by_qid
            .get(key)
            .or_else(|| self.node.subs_by_title.get(key))
            .and_then(|&idx| self.set.question(idx))
    }

    /// Answer by aid, falling back to code.
    pub fn answer(&self, key: &str) -> Option<Answer<'a>> {
        self.node
            .answers_by_aid
            .get(key)
            .or_else(|| self.node.answers_by_code.get(key))
            .and_then(|&idx| self.set.answer(idx))
    }

    /// Child by identifier (sub-question qid, answer aid), then by human code
    /// (sub-question title, answer code).
    pub fn get(&self, key: &str) -> Option<Child<'a>> {
        let node = self.node;
        if let Some(&idx) = node.subs_by_qid.get(key) {
            return self.set.question(idx).map(Child::Question);
        }
        if let Some(&idx) = node.answers_by_aid.get(key) {
            return self.set.answer(idx).map(Child::Answer);
        }
        if let Some(&idx) = node.subs_by_title.get(key) {
            return self.set.question(idx).map(Child::Question);
        }
        node.answers_by_code
            .get(key)
            .and_then(|&idx| self.set.answer(idx))
            .map(Child::Answer)
    }

    fn depth(&self) -> usize {
        1 + self.subquestions().map(|q| q.depth()).max().unwrap_or(0)
    }
}

impl PartialEq for Question<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.set, other.set) && self.idx == other.idx
    }
}

impl fmt::Debug for Question<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Question")
            .field("qid", &self.node.qid)
            .field("title", &self.node.title)
            .field("type", &self.node.qtype)
            .finish()
    }
}

impl fmt::Display for Question<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl Serialize for Question<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.node;
        let extra = usize::from(!node.subquestions.is_empty()) + usize::from(!node.answers.is_empty());
        let mut map = serializer.serialize_map(Some(node.raw.len() + extra))?;
        for (k, v) in &node.raw {
            map.serialize_entry(k, v)?;
        }
        if !node.subquestions.is_empty() {
            let subs: Vec<Question<'_>> = self.subquestions().collect();
            map.serialize_entry("subquestions", &subs)?;
        }
        if !node.answers.is_empty() {
            let answers: Vec<Answer<'_>> = self.answers().collect();
            map.serialize_entry("answers", &answers)?;
        }
        map.end()
    }
}

impl<'a> DefinitionData for Question<'a> {
    type Item<'v> = &'v Value where Self: 'v;

    fn lookup<'v>(&'v self, key: &str) -> Option<&'v Value> {
        self.node.raw.get(key)
    }
}

/// Borrowed handle to an answer option.
#[derive(Clone, Copy)]
pub struct Answer<'a> {
    set: &'a QuestionSet,
    idx: Index,
    node: &'a AnswerNode,
}

impl<'a> Answer<'a> {
    pub fn aid(&self) -> Option<&'a str> {
        self.node.aid.as_deref()
    }

    pub fn code(&self) -> &'a str {
        &self.node.code
    }

    pub fn raw(&self) -> &'a Map<String, Value> {
        &self.node.raw
    }

    /// Display text: `strings[0].answer`, then `answer`, then the code.
    pub fn label(&self) -> &'a str {
        label_from(&self.node.raw, "answer").unwrap_or(&self.node.code)
    }

    /// The question owning this answer.
    pub fn question(&self) -> Option<Question<'a>> {
        self.set.question(self.node.question)
    }
}

impl PartialEq for Answer<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.set, other.set) && self.idx == other.idx
    }
}

impl fmt::Debug for Answer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Answer")
            .field("aid", &self.node.aid)
            .field("code", &self.node.code)
            .finish()
    }
}

impl Serialize for Answer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node.raw.serialize(serializer)
    }
}

impl<'a> DefinitionData for Answer<'a> {
    type Item<'v> = &'v Value where Self: 'v;

    fn lookup<'v>(&'v self, key: &str) -> Option<&'v Value> {
        self.node.raw.get(key)
    }
}

fn label_from<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    raw.get("strings")
        .and_then(|strings| strings.get(0))
        .and_then(|first| first.get(key))
        .and_then(Value::as_str)
        .or_else(|| raw.get(key).and_then(Value::as_str))
}

/// Pre-order walk over every question of a set.
pub struct TreeIterator<'a> {
    set: &'a QuestionSet,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(set: &'a QuestionSet) -> Self {
        // Reverse so the first root is popped first
        let stack = set.roots.iter().rev().copied().collect();
        Self { set, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = Question<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(question) = self.set.question(current) {
                for &child in question.node.subquestions.iter().rev() {
                    self.stack.push(child);
                }
                return Some(question);
            }
        }
        None
    }
}
