//! Domain layer: the survey core
//!
//! Pure, synchronous transformations over already-fetched data
//! (no I/O, no CLI, no config loading).

pub mod access;
pub mod arena;
pub mod builder;
pub mod crosstab;
pub mod data;
pub mod definition;
pub mod error;
pub mod natural;
pub mod normalize;
pub mod ordered;
pub mod record;
pub mod tabulation;

pub use access::{AccessConfig, AccessFilter, OneOrMany, RuleSet};
pub use arena::{Answer, Child, Parent, ParentRef, Question, QuestionSet, TreeIterator};
pub use builder::{TreeBuilder, TreeResult};
pub use crosstab::{ChoiceFormat, ChoiceOptions, Choices, LabeledChoice, OnIneligible};
pub use data::DefinitionData;
pub use definition::{
    AnswerDef, DefinitionPayload, QuestionDef, DUAL_SCALE_TYPE, MULTIPLE_CHOICE_TYPE, SELECTED,
};
pub use error::{DomainError, DomainResult};
pub use natural::{natural_cmp, natural_sort_by_key};
pub use normalize::{decode_envelope, detect_delimiter, normalize, normalize_bytes};
pub use ordered::OrderedMap;
pub use record::{base_column, FlatRecord, ID_COLUMN};
pub use tabulation::{tabulate, TabulateOptions, Tabulation, TabulationEntry, ValueCount};
