pub mod form;
pub mod question;
pub mod rules;

pub use form::{DEFAULT_FORM_NAME, FormSpec};
pub use question::{QuestionSpec, QuestionType};
pub use rules::{Condition, ConditionValue, Logic, Operator, RuleSet};
