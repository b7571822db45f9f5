pub mod text;

pub use self::text::{count_non_whitespace, fold_case, fold_case_all, TextIndex};
